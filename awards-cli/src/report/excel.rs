//! Workbook rendering for the campus report

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};

use crate::table::{Table, Value};

use super::ReportTables;

pub const STUDENT_SHEET: &str = "Students";
pub const AWARD_SHEET: &str = "Award data";
pub const SUMMARY_SHEET: &str = "Summary";

/// Number formats keyed by column name
#[derive(Debug, Clone, Default)]
pub struct ColumnFormats {
    formats: HashMap<String, Format>,
}

impl ColumnFormats {
    pub fn new(formats: &BTreeMap<String, String>) -> Self {
        Self {
            formats: formats
                .iter()
                .map(|(column, num_format)| (column.clone(), Format::new().set_num_format(num_format)))
                .collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Format> {
        self.formats.get(column)
    }
}

pub(crate) fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_text_wrap()
        .set_background_color(Color::RGB(0x4472C4))
        .set_font_color(Color::White)
}

/// Write one cell. Nulls leave the cell empty.
pub(crate) fn write_value(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    format: Option<&Format>,
) -> Result<()> {
    match (value, format) {
        (Value::Null, _) => {}
        (Value::String(s), _) => {
            sheet.write_string(row, col, s)?;
        }
        (Value::Int(i), Some(format)) => {
            sheet.write_number_with_format(row, col, *i as f64, format)?;
        }
        (Value::Int(i), None) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        (Value::Float(f), _) if !f.is_finite() => {}
        (Value::Float(f), Some(format)) => {
            sheet.write_number_with_format(row, col, *f, format)?;
        }
        (Value::Float(f), None) => {
            sheet.write_number(row, col, *f)?;
        }
    }
    Ok(())
}

/// Write a header row and the table's rows starting at `first_row`.
/// Returns the row after the last one written.
pub(crate) fn write_table(sheet: &mut Worksheet, first_row: u32, table: &Table, formats: &ColumnFormats) -> Result<u32> {
    let header = header_format();
    for (col, name) in table.columns().iter().enumerate() {
        sheet.write_string_with_format(first_row, col as u16, name, &header)?;
    }

    let column_formats: Vec<Option<&Format>> = table.columns().iter().map(|c| formats.get(c)).collect();
    let mut row = first_row + 1;
    for values in table.rows() {
        for (col, value) in values.iter().enumerate() {
            write_value(sheet, row, col as u16, value, column_formats.get(col).copied().flatten())?;
        }
        row += 1;
    }
    Ok(row)
}

fn add_table_sheet(workbook: &mut Workbook, name: &str, table: &Table, formats: &ColumnFormats) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;

    let end = write_table(sheet, 0, table, formats)?;
    sheet.set_freeze_panes(1, 0)?;
    if !table.columns().is_empty() {
        sheet.autofilter(0, 0, end.saturating_sub(1), (table.columns().len() - 1) as u16)?;
    }
    sheet.autofit();
    Ok(())
}

/// Save the three report sheets to `path`
pub fn write_report_workbook(path: &Path, tables: &ReportTables, formats: &ColumnFormats) -> Result<()> {
    let mut workbook = Workbook::new();

    add_table_sheet(&mut workbook, STUDENT_SHEET, &tables.students, formats)?;
    add_table_sheet(&mut workbook, AWARD_SHEET, &tables.awards, formats)?;
    add_table_sheet(&mut workbook, SUMMARY_SHEET, &tables.summary, formats)?;

    workbook
        .save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;

    log::info!("Report written to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> ReportTables {
        ReportTables {
            students: Table::from_rows(
                ["SID", "Student", "Target Grad Rate"],
                vec![vec![Value::Int(1001), Value::from("Roe, Ann"), Value::Float(0.7)]],
            ),
            awards: Table::from_rows(
                ["SID", "College", "Grad rate"],
                vec![
                    vec![Value::Int(1001), Value::from("State U"), Value::Float(0.6)],
                    vec![Value::Int(1001), Value::from("Tech"), Value::from("N/A")],
                    vec![Value::Int(1001), Value::Null, Value::Float(f64::NAN)],
                ],
            ),
            summary: Table::new(["SID", "Student"]),
        }
    }

    #[test]
    fn test_workbook_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let formats = ColumnFormats::new(&BTreeMap::from([("Grad rate".to_string(), "0%".to_string())]));

        write_report_workbook(&path, &tables(), &formats).unwrap();

        let size = std::fs::metadata(&path).unwrap().len();
        assert!(size > 0);
    }

    #[test]
    fn test_formats_by_column() {
        let formats = ColumnFormats::new(&BTreeMap::from([("Grad rate".to_string(), "0%".to_string())]));
        assert!(formats.get("Grad rate").is_some());
        assert!(formats.get("College").is_none());
    }

    #[test]
    fn test_missing_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("report.xlsx");
        let err = write_report_workbook(&path, &tables(), &ColumnFormats::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to save Excel file"));
    }
}
