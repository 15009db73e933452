//! CSV reading and writing for tables

use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Writer};

use super::{Table, Value};

/// How raw CSV cells turn into values
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Cell texts read as null (in addition to the empty string)
    pub na_values: Vec<String>,
    /// Restrict the table to these columns (in file order); all when empty
    pub columns: Vec<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            na_values: vec!["N/A".to_string()],
            columns: Vec::new(),
        }
    }
}

impl CsvOptions {
    /// Only empty cells are null
    pub fn blank_only() -> Self {
        Self {
            na_values: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn with_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    fn parse(&self, raw: &str) -> Value {
        if self.na_values.iter().any(|na| na == raw.trim()) {
            Value::Null
        } else {
            Value::parse_cell(raw)
        }
    }
}

/// Export files from the student-information system are not always UTF-8;
/// fall back to Latin-1 per field.
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Read a CSV file with a header row
pub fn read_csv(path: &Path, options: &CsvOptions) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let header: Vec<String> = reader
        .byte_headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .iter()
        .map(|h| decode_field(h).trim_start_matches('\u{feff}').to_string())
        .collect();

    let keep: Vec<usize> = if options.columns.is_empty() {
        (0..header.len()).collect()
    } else {
        header
            .iter()
            .enumerate()
            .filter(|(_, h)| options.columns.contains(h))
            .map(|(i, _)| i)
            .collect()
    };

    let mut table = Table::new(keep.iter().map(|&i| header[i].clone()));
    for (line, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| {
            format!("Failed to read row {} of {}", line + 2, path.display())
        })?;
        let row = keep
            .iter()
            .map(|&i| {
                record
                    .get(i)
                    .map(|b| options.parse(&decode_field(b)))
                    .unwrap_or_default()
            })
            .collect();
        table.push_row(row);
    }

    log::debug!("Read {} rows from {}", table.len(), path.display());
    Ok(table)
}

/// Write a table with its header; nulls become empty cells
pub fn write_csv(path: &Path, table: &Table) -> Result<()> {
    let mut wtr = Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    wtr.write_record(table.columns())
        .context("Failed to write CSV header")?;

    for row in table.rows() {
        wtr.write_record(row.iter().map(|v| v.to_string()))
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;

    log::debug!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}
