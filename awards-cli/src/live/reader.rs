//! Reading the live tabs of a campus document

use anyhow::{Context, Result};

use super::LiveTables;
use crate::api::DocumentHandle;
use crate::config::TabSettings;
use crate::table::Table;

async fn read_tab(doc: &DocumentHandle<'_>, tab: &str, header_row: usize) -> Result<Option<Table>> {
    let grid = doc
        .read_tab(tab)
        .await
        .with_context(|| format!("Failed to read tab '{}'", tab))?;

    match grid {
        Some(grid) => {
            let table = Table::from_grid(&grid, header_row)
                .with_context(|| format!("Tab '{}' has no header on row {}", tab, header_row))?;
            log::debug!("Tab '{}': {} rows", tab, table.len());
            Ok(Some(table))
        }
        None => Ok(None),
    }
}

/// Read the summary, award and decision tabs. A summary or award tab with no
/// data reads as an empty table; a missing decision tab stays `None`.
pub async fn read_current_doc(doc: &DocumentHandle<'_>, tabs: &TabSettings) -> Result<LiveTables> {
    log::info!("Reading live document {}", doc.key());

    let summary = read_tab(doc, &tabs.efc_name, tabs.efc_header_row).await?;
    let award = read_tab(doc, &tabs.award_name, tabs.award_header_row).await?;
    let decision = read_tab(doc, &tabs.decision_name, tabs.decision_header_row).await?;

    if summary.is_none() {
        log::warn!("Tab '{}' has no data", tabs.efc_name);
    }
    if award.is_none() {
        log::warn!("Tab '{}' has no data", tabs.award_name);
    }
    if decision.is_none() {
        log::info!("Tab '{}' has no data yet", tabs.decision_name);
    }

    Ok(LiveTables {
        summary: summary.unwrap_or_default(),
        award: award.unwrap_or_default(),
        decision,
    })
}
