//! In-memory tables with an ordered column list
//!
//! Every stage of the pipeline passes `Table` values around: the loaded
//! sources, the freshly built summary/award tables and the live mirror read
//! back from the document.

pub mod io;
pub mod key;
pub mod value;

use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::{Result, bail};
use serde::Deserialize;

pub use key::{AwardKey, KeyPart, StatusRow};
pub use value::Value;

static NULL: Value = Value::Null;

/// One sort criterion, in the order configured for a table
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_ascending() -> bool {
    true
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), ascending: true }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), ascending: false }
    }
}

/// Records sharing an ordered column list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Borrowed view of one row
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    /// Value of a column, `Null` when the column does not exist
    pub fn get(&self, column: &str) -> &'a Value {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
            .unwrap_or(&NULL)
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    pub fn columns(&self) -> &'a [String] {
        self.columns
    }
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from a header and rows, padding or truncating each row
    /// to the header width
    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: impl IntoIterator<Item = Vec<Value>>,
    ) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Split a raw grid read from a document tab into a table.
    ///
    /// `header_row` is 1-based as shown in the spreadsheet: the header is
    /// grid row `header_row - 1` and data starts right after it.
    pub fn from_grid(grid: &[Vec<Value>], header_row: usize) -> Result<Self> {
        if header_row == 0 {
            bail!("Header row numbers start at 1");
        }
        let Some(header) = grid.get(header_row - 1) else {
            bail!(
                "Tab has {} rows but the header is expected on row {}",
                grid.len(),
                header_row
            );
        };

        let columns: Vec<String> = header.iter().map(|v| v.to_string()).collect();
        let rows = grid[header_row..].iter().cloned();
        Ok(Self::from_rows(columns, rows))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        self.rows.get(index).map(|values| Record {
            columns: &self.columns,
            values,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|values| Record {
            columns: &self.columns,
            values,
        })
    }

    /// All values in a column, `Null` for every row when it is absent
    pub fn column(&self, column: &str) -> Vec<Value> {
        match self.column_index(column) {
            Some(i) => self.rows.iter().map(|r| r[i].clone()).collect(),
            None => vec![Value::Null; self.rows.len()],
        }
    }

    /// Add a column, or replace it when it already exists
    pub fn set_column(&mut self, column: &str, values: Vec<Value>) {
        let idx = match self.column_index(column) {
            Some(i) => i,
            None => {
                self.columns.push(column.to_string());
                for row in &mut self.rows {
                    row.push(Value::Null);
                }
                self.columns.len() - 1
            }
        };
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
    }

    /// Project to the given columns, in order. Missing columns come out null.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Table {
        let indices: Vec<Option<usize>> =
            columns.iter().map(|c| self.column_index(c.as_ref())).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|i| i.map(|i| row[i].clone()).unwrap_or_default())
                    .collect()
            })
            .collect();
        Table {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows,
        }
    }

    /// Rename columns present in the mapping; others stay untouched
    pub fn rename(&mut self, mapping: &HashMap<&str, &str>) {
        for column in &mut self.columns {
            if let Some(new_name) = mapping.get(column.as_str()) {
                *column = new_name.to_string();
            }
        }
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(Record<'_>) -> bool,
    {
        let columns = &self.columns;
        self.rows.retain(|values| keep(Record { columns, values }));
    }

    /// Stable multi-key sort. Blank values go last in either direction.
    pub fn sort_by_specs(&mut self, specs: &[SortSpec]) {
        let keys: Vec<(Option<usize>, bool)> = specs
            .iter()
            .map(|s| (self.column_index(&s.field), s.ascending))
            .collect();

        self.rows.sort_by(|a, b| {
            for (idx, ascending) in &keys {
                let Some(i) = idx else { continue };
                let ordering = match (a[*i].is_blank(), b[*i].is_blank()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => {
                        let ord = a[*i].sort_cmp(&b[*i]);
                        if *ascending { ord } else { ord.reverse() }
                    }
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    /// Append another table's rows, aligning on column names. Columns only
    /// the other table has are added at the end.
    pub fn concat(&mut self, other: &Table) {
        for column in &other.columns {
            if !self.has_column(column) {
                self.set_column(column, Vec::new());
            }
        }
        let positions: Vec<Option<usize>> =
            self.columns.iter().map(|c| other.column_index(c)).collect();
        for row in &other.rows {
            let aligned = positions
                .iter()
                .map(|p| p.map(|i| row[i].clone()).unwrap_or_default())
                .collect();
            self.rows.push(aligned);
        }
    }

    /// Map from a column's normalized key to the first row carrying it
    pub fn index_by(&self, column: &str) -> HashMap<KeyPart, usize> {
        let mut index = HashMap::new();
        if let Some(i) = self.column_index(column) {
            for (row_idx, row) in self.rows.iter().enumerate() {
                if let Some(key) = KeyPart::from_value(&row[i]) {
                    index.entry(key).or_insert(row_idx);
                }
            }
        }
        index
    }

    /// Header followed by every row
    pub fn to_grid(&self) -> Vec<Vec<Value>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(self.columns.iter().map(|c| Value::from(c.as_str())).collect());
        grid.extend(self.rows.iter().cloned());
        grid
    }
}

/// Keyed access into a loaded source table (roster by student id, colleges by
/// institution id)
#[derive(Debug, Clone, Default)]
pub struct IndexedTable {
    table: Table,
    index: HashMap<KeyPart, usize>,
}

impl IndexedTable {
    pub fn new(table: Table, key_column: &str) -> Self {
        let index = table.index_by(key_column);
        Self { table, index }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn contains(&self, key: &KeyPart) -> bool {
        self.index.contains_key(key)
    }

    pub fn row(&self, key: &KeyPart) -> Option<Record<'_>> {
        self.index.get(key).and_then(|i| self.table.record(*i))
    }

    /// Lookup a column for a key; `None` when the key or the value is missing
    pub fn lookup(&self, key: &KeyPart, column: &str) -> Option<&Value> {
        self.row(key).map(|r| r.get(column)).filter(|v| !v.is_blank())
    }

    /// Lookup by a raw cell, normalizing it into a key first
    pub fn lookup_value(&self, key: &Value, column: &str) -> Option<&Value> {
        KeyPart::from_value(key).and_then(|k| self.lookup(&k, column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            ["SID", "College", "Result"],
            vec![
                vec![Value::Int(2), Value::from("Beta"), Value::from("Pending")],
                vec![Value::Int(1), Value::from("Gamma"), Value::Null],
                vec![Value::Int(1), Value::from("Alpha"), Value::from("Denied")],
            ],
        )
    }

    #[test]
    fn test_from_grid_uses_one_based_header() {
        let grid = vec![
            vec![Value::from("Title banner")],
            vec![Value::from("SID"), Value::from("Name")],
            vec![Value::Int(1001), Value::from("Doe, Jane")],
        ];
        let table = Table::from_grid(&grid, 2).unwrap();
        assert_eq!(table.columns(), &["SID".to_string(), "Name".to_string()]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.record(0).unwrap().get("Name"), &Value::from("Doe, Jane"));
    }

    #[test]
    fn test_from_grid_rejects_missing_header() {
        assert!(Table::from_grid(&[], 1).is_err());
        assert!(Table::from_grid(&[vec![Value::from("a")]], 0).is_err());
    }

    #[test]
    fn test_select_fills_missing_columns() {
        let projected = sample().select(&["College", "Notes"]);
        assert_eq!(projected.columns().len(), 2);
        assert!(projected.record(0).unwrap().get("Notes").is_null());
    }

    #[test]
    fn test_sort_specs_with_blank_last() {
        let mut table = sample();
        table.sort_by_specs(&[SortSpec::asc("SID"), SortSpec::asc("College")]);
        let colleges: Vec<String> = table.column("College").iter().map(|v| v.to_string()).collect();
        assert_eq!(colleges, vec!["Alpha", "Gamma", "Beta"]);

        table.sort_by_specs(&[SortSpec::desc("Result")]);
        assert!(table.record(2).unwrap().get("Result").is_null());
        assert_eq!(table.record(0).unwrap().get("Result"), &Value::from("Pending"));
    }

    #[test]
    fn test_concat_aligns_columns() {
        let mut left = Table::from_rows(["A", "B"], vec![vec![Value::Int(1), Value::Int(2)]]);
        let right = Table::from_rows(["B", "C"], vec![vec![Value::Int(3), Value::Int(4)]]);
        left.concat(&right);
        assert_eq!(left.columns(), &["A".to_string(), "B".to_string(), "C".to_string()]);
        assert_eq!(left.rows()[1], vec![Value::Null, Value::Int(3), Value::Int(4)]);
        assert_eq!(left.rows()[0], vec![Value::Int(1), Value::Int(2), Value::Null]);
    }

    #[test]
    fn test_rename_and_retain() {
        let mut table = sample();
        table.rename(&HashMap::from([("Result", "Result (from Naviance)")]));
        table.retain(|r| !r.get("Result (from Naviance)").is_text("Denied"));
        assert_eq!(table.len(), 2);
        assert!(table.has_column("Result (from Naviance)"));
    }

    #[test]
    fn test_indexed_lookup_skips_blank_values() {
        let indexed = IndexedTable::new(sample(), "SID");
        assert_eq!(
            indexed.lookup(&KeyPart::Int(2), "Result"),
            Some(&Value::from("Pending"))
        );
        // first row for SID 1 has a null result
        assert_eq!(indexed.lookup(&KeyPart::Int(1), "Result"), None);
        assert_eq!(indexed.lookup_value(&Value::from("2"), "College"), Some(&Value::from("Beta")));
    }
}
