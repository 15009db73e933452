//! Printable per-student letters, one single-sheet workbook each

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};

use crate::config::ReportSettings;
use crate::table::{KeyPart, Record, Table, Value};

use super::excel::{ColumnFormats, write_table, write_value};

const SHEET_NAME: &str = "Letter";

/// File name for a student's letter: name and id, with characters that are
/// awkward in paths replaced
pub fn letter_file_name(name: &Value, student: &KeyPart) -> String {
    let name: String = name
        .to_string()
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_') { c } else { '_' })
        .collect();
    let name = name.trim();
    if name.is_empty() {
        format!("{}.xlsx", student)
    } else {
        format!("{} {}.xlsx", name, student)
    }
}

fn write_letter(
    path: &Path,
    campus: &str,
    generated: &str,
    student: &Record<'_>,
    name: &Value,
    awards: &Table,
    formats: &ColumnFormats,
) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    sheet.set_landscape();
    sheet.set_print_fit_to_pages(1, 1);

    let title_format = Format::new().set_bold().set_font_size(16);
    let bold_format = Format::new().set_bold();

    sheet.write_string_with_format(0, 0, name.to_string(), &title_format)?;
    sheet.write_string(1, 0, format!("{} | Generated: {}", campus, generated))?;

    let mut row = 3u32;
    for (column, value) in student.columns().iter().zip(student.values()) {
        sheet.write_string_with_format(row, 0, column, &bold_format)?;
        write_value(sheet, row, 1, value, formats.get(column))?;
        row += 1;
    }

    row += 1;
    write_table(sheet, row, awards, formats)?;
    sheet.autofit();

    workbook
        .save(path)
        .with_context(|| format!("Failed to save letter: {}", path.display()))?;
    Ok(())
}

/// Write a letter for every row of the student report into `folder`.
///
/// Each letter lists the student's report fields followed by their award
/// rows, restricted to `letter_fields` when any are configured.
pub fn write_letters(
    folder: &Path,
    campus: &str,
    students: &Table,
    awards: &Table,
    settings: &ReportSettings,
    formats: &ColumnFormats,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(folder)
        .with_context(|| format!("Failed to create letter folder: {}", folder.display()))?;

    let summary = &settings.summary;
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
    let mut written = Vec::new();

    for student in students.records() {
        let Some(id) = KeyPart::from_value(student.get(&summary.student_field)) else {
            log::warn!("Skipping letter for a student row with no {}", summary.student_field);
            continue;
        };
        let name = student.get(&summary.name_field);

        let mut rows = awards.clone();
        rows.retain(|r| KeyPart::from_value(r.get(&summary.student_field)).as_ref() == Some(&id));
        let rows = if settings.letter_fields.is_empty() {
            rows
        } else {
            rows.select(&settings.letter_fields)
        };

        let path = folder.join(letter_file_name(name, &id));
        write_letter(&path, campus, &generated, &student, name, &rows, formats)?;
        log::debug!("Letter for {} written to {}", id, path.display());
        written.push(path);
    }

    log::info!("Wrote {} letters to {}", written.len(), folder.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReportSettings, SummarySettings};

    fn settings(letter_fields: &[&str]) -> ReportSettings {
        ReportSettings {
            filename: "award_report.xlsx".to_string(),
            folder: PathBuf::from("reports"),
            award_fields: Vec::new(),
            student_fields: Vec::new(),
            award_sorts: Default::default(),
            student_sorts: Default::default(),
            formats: Default::default(),
            summary: SummarySettings::default(),
            letter_fields: letter_fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            letter_file_name(&Value::from("Roe, Ann"), &KeyPart::from(1001)),
            "Roe_ Ann 1001.xlsx"
        );
        assert_eq!(letter_file_name(&Value::Null, &KeyPart::from(1002)), "1002.xlsx");
        assert_eq!(
            letter_file_name(&Value::from("../etc"), &KeyPart::from(7)),
            "___etc 7.xlsx"
        );
    }

    #[test]
    fn test_one_letter_per_student() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("letters").join("North");

        let students = Table::from_rows(
            ["SID", "Student", "GPA"],
            vec![
                vec![Value::Int(1001), Value::from("Roe, Ann"), Value::Float(3.4)],
                vec![Value::Int(1002), Value::from("Doe, John"), Value::Float(2.9)],
                vec![Value::Null, Value::from("No Id"), Value::Null],
            ],
        );
        let awards = Table::from_rows(
            ["SID", "College", "Result"],
            vec![
                vec![Value::Int(1001), Value::from("State U"), Value::from("CHOICE!")],
                vec![Value::Int(1002), Value::from("Tech"), Value::from("Accepted!")],
            ],
        );

        let written = write_letters(
            &folder,
            "North",
            &students,
            &awards,
            &settings(&["College", "Result"]),
            &ColumnFormats::default(),
        )
        .unwrap();

        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|p| p.exists()));
        assert_eq!(written[0].file_name().unwrap(), "Roe_ Ann 1001.xlsx");
    }
}
