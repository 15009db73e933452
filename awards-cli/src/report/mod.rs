//! Workbook report and per-student letters built from the live mirror

pub mod columns;
pub mod excel;
pub mod letters;
pub mod tables;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{CampusConfig, ReportSettings, Settings};
use crate::enrich::AppStatus;
use crate::live::LiveTables;
use crate::table::Table;

pub use columns::parse_columns;
pub use excel::{ColumnFormats, write_report_workbook};
pub use letters::write_letters;
pub use tables::{ReportSources, build_award_report, build_student_report, build_summary_sheet};

/// The three report sheets
#[derive(Debug, Clone)]
pub struct ReportTables {
    pub students: Table,
    pub awards: Table,
    pub summary: Table,
}

/// Build every report sheet for one campus (or `All`)
pub fn build_report_tables(
    live: &LiveTables,
    sources: &ReportSources<'_>,
    report: &ReportSettings,
    config: &CampusConfig,
) -> Result<ReportTables> {
    let award_columns = parse_columns(&report.award_fields).context("Invalid report.award_fields")?;
    let student_columns = parse_columns(&report.student_fields).context("Invalid report.student_fields")?;

    let awards = build_award_report(&live.award, &award_columns, sources, &config.report_award_sorts);
    let students = build_student_report(
        &live.summary,
        &student_columns,
        sources,
        &config.campus,
        &config.report_student_sorts,
    );
    let summary = build_summary_sheet(&awards, &report.summary, AppStatus::Choice.label());

    Ok(ReportTables {
        students,
        awards,
        summary,
    })
}

/// Folder every report output for a run lands in
pub fn report_folder(settings: &Settings) -> PathBuf {
    settings.folders.output.join(&settings.report.folder)
}

/// `<campus>_<filename>` inside the report folder
pub fn workbook_path(settings: &Settings, campus: &str) -> PathBuf {
    report_folder(settings).join(format!("{}_{}", campus, settings.report.filename))
}

pub fn letter_folder(settings: &Settings, campus: &str) -> PathBuf {
    report_folder(settings).join("letters").join(campus)
}

/// Write the campus workbook, creating its folder first
pub fn create_workbook(path: &Path, tables: &ReportTables, report: &ReportSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report folder: {}", parent.display()))?;
    }
    write_report_workbook(path, tables, &ColumnFormats::new(&report.formats))
}
