//! Local tables rebuilt from the sources on every run

pub mod award;
pub mod summary;

use crate::config::{CampusConfig, Settings};
use crate::enrich::roster_cols;
use crate::loader::SourceTables;
use crate::table::{IndexedTable, Table};

pub use award::{build_award, doc_cols};
pub use summary::build_summary;

/// The freshly computed summary and award tables for one campus
#[derive(Debug, Clone)]
pub struct LocalTables {
    pub summary: Table,
    pub award: Table,
}

/// Build both local tables from the enriched roster
pub fn build_local_tables(
    sources: &SourceTables,
    roster: &IndexedTable,
    settings: &Settings,
    config: &CampusConfig,
) -> LocalTables {
    log::info!("Creating blank document tables from source files");

    let summary = build_summary(roster.table(), &settings.fields.efc_tab_fields);
    let award = build_award(
        &summary,
        settings.student_index_field(),
        roster,
        &sources.applications,
        &sources.colleges,
        config,
        &settings.enrichment,
    );

    LocalTables { summary, award }
}

/// Index the enriched roster by student id
pub fn index_roster(roster: Table) -> IndexedTable {
    IndexedTable::new(roster, roster_cols::STUDENT_ID)
}
