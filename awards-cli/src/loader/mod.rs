//! Source file ingestion
//!
//! Reads the student-information-system extracts and the reference sheets,
//! applying the per-column coercions each file needs.

pub mod coerce;

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::enrich::rates::{MINORITY_RATE, OVERALL_RATE};
use crate::enrich::roster_cols;
use crate::enrich::{BumpList, RosterLookups, SatToAct, StrategyTable, TargetTable};
use crate::table::io::{CsvOptions, read_csv};
use crate::table::{IndexedTable, Table, Value};

use coerce::{coerce_column, percent, safe_float, safe_int};

/// Application file columns
pub mod app_cols {
    pub const STUDENT_ID: &str = "hs_student_id";
    pub const NCES: &str = "NCES";
    pub const COLLEGE_NAME: &str = "collegename";
    pub const COMMENTS: &str = "comments";
}

/// College reference columns
pub mod college_cols {
    pub const NAME: &str = "INSTNM";
    pub const BARRONS: &str = "SimpleBarrons";
    pub const LIVING: &str = "Living";
    pub const UNIT_ID: &str = "UNITID";
}

/// Every source table a campus run may need
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub applications: Table,
    /// Full roster, before campus filtering and enrichment
    pub roster: Table,
    pub colleges: IndexedTable,
    pub strategies: StrategyTable,
    pub targets: TargetTable,
    pub sat_to_act: SatToAct,
    pub bump_list: BumpList,
}

impl SourceTables {
    pub fn roster_lookups(&self) -> RosterLookups<'_> {
        RosterLookups {
            strategies: &self.strategies,
            targets: &self.targets,
            sat_to_act: &self.sat_to_act,
        }
    }
}

pub fn read_applications(path: &Path, columns: &[String]) -> Result<Table> {
    let mut table = read_csv(path, &CsvOptions::blank_only().with_columns(columns))
        .context("Failed to read applications")?;
    coerce_column(&mut table, app_cols::STUDENT_ID, safe_int);
    coerce_column(&mut table, app_cols::NCES, safe_int);
    Ok(table)
}

pub fn read_roster(path: &Path, columns: &[String]) -> Result<Table> {
    let mut table = read_csv(path, &CsvOptions::default().with_columns(columns))
        .context("Failed to read roster")?;
    for column in [
        roster_cols::STUDENT_ID,
        roster_cols::EFC,
        roster_cols::ACT,
        roster_cols::SAT,
    ] {
        coerce_column(&mut table, column, safe_int);
    }
    coerce_column(&mut table, roster_cols::GPA, safe_float);
    Ok(table)
}

/// Colleges are keyed by their first column (the NCES unit id)
pub fn read_colleges(path: &Path) -> Result<IndexedTable> {
    // Percent columns handle their own N/A
    let options = CsvOptions::blank_only();
    let mut table = read_csv(path, &options).context("Failed to read colleges")?;
    let key_column = table
        .columns()
        .first()
        .context("College table has no columns")?
        .clone();

    coerce_column(&mut table, &key_column, safe_int);
    coerce_column(&mut table, college_cols::UNIT_ID, safe_int);
    coerce_column(&mut table, OVERALL_RATE, percent);
    coerce_column(&mut table, MINORITY_RATE, percent);
    for column in [college_cols::NAME, college_cols::BARRONS, college_cols::LIVING] {
        let cleaned = table
            .column(column)
            .into_iter()
            .map(|v| if v.is_text("N/A") { Value::Null } else { v })
            .collect();
        if table.has_column(column) {
            table.set_column(column, cleaned);
        }
    }
    Ok(IndexedTable::new(table, &key_column))
}

pub fn read_bump_list(path: &Path) -> Result<BumpList> {
    let mut table = read_csv(path, &CsvOptions::blank_only()).context("Failed to read bump list")?;
    coerce_column(&mut table, "SID", safe_int);
    coerce_column(&mut table, "NCESid", safe_int);
    Ok(BumpList::from_table(&table))
}

/// Read every source file named in the settings
pub fn read_sources(settings: &Settings) -> Result<SourceTables> {
    let inputs = &settings.inputs;
    log::info!("Reading configuration inputs");

    let strategies = read_csv(&inputs.strategies, &CsvOptions::default())
        .and_then(|t| StrategyTable::from_table(&t))
        .with_context(|| format!("Failed to load strategies from {}", inputs.strategies.display()))?;
    let targets = read_csv(&inputs.targets, &CsvOptions::default())
        .and_then(|t| TargetTable::from_table(&t))
        .with_context(|| format!("Failed to load targets from {}", inputs.targets.display()))?;
    let sat_to_act = read_csv(&inputs.sat_to_act, &CsvOptions::default())
        .and_then(|t| SatToAct::from_table(&t))
        .with_context(|| format!("Failed to load SAT table from {}", inputs.sat_to_act.display()))?;

    let sources = SourceTables {
        applications: read_applications(&inputs.current_applications, &settings.fields.app_fields)?,
        roster: read_roster(&inputs.current_roster, &settings.fields.roster_fields)?,
        colleges: read_colleges(&inputs.colleges)?,
        strategies,
        targets,
        sat_to_act,
        bump_list: read_bump_list(&inputs.bump_list)?,
    };

    log::info!(
        "Loaded {} roster rows, {} applications, {} colleges",
        sources.roster.len(),
        sources.applications.len(),
        sources.colleges.table().len()
    );
    Ok(sources)
}
