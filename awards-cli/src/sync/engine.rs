//! One sync cycle: push local row changes into the live document

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use colored::*;

use super::batch::{chunk_count, chunk_rows};
use super::diff::{diff_award_rows, diff_keys, status_rows};
use super::payload::RowPayload;
use crate::api::{DocumentHandle, RemoteCall};
use crate::build::LocalTables;
use crate::config::CampusConfig;
use crate::enrich::roster_cols;
use crate::live::LiveTables;
use crate::table::{AwardKey, KeyPart, StatusRow, Table};

/// What a sync cycle changed
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub summary_inserted: usize,
    pub summary_deleted: usize,
    pub award_inserted: usize,
    /// Missing award rows left out because inserts are disabled for the campus
    pub award_inserts_skipped: usize,
    pub award_deleted: usize,
    pub status_changed: usize,
    /// Insert calls made across both tables
    pub chunks: usize,
    /// Live award rows ignored because of a blank key part
    pub missing_index: usize,
    pub calls: Vec<RemoteCall>,
}

impl SyncReport {
    /// True when the document already matched the local tables
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.award_inserts_skipped == 0
    }

    pub fn print(&self, campus: &str) {
        println!("Sync results for {}", campus.bright_green().bold());
        println!(
            "  Students: {} inserted, {} deleted",
            self.summary_inserted.to_string().cyan(),
            self.summary_deleted.to_string().cyan()
        );
        println!(
            "  Awards:   {} inserted, {} status changes, {} deleted",
            self.award_inserted.to_string().cyan(),
            self.status_changed.to_string().cyan(),
            self.award_deleted.to_string().cyan()
        );
        if self.award_inserts_skipped > 0 {
            println!(
                "  {}",
                format!("{} award rows not inserted (inserts disabled)", self.award_inserts_skipped).yellow()
            );
        }
        if self.missing_index > 0 {
            println!(
                "  {}",
                format!("{} live award rows skipped for a blank key", self.missing_index).yellow()
            );
        }
        for call in &self.calls {
            println!(
                "  {} {:.2}s",
                call.function.dimmed(),
                call.elapsed.as_secs_f64()
            );
        }
    }
}

/// Bring the live summary and award tabs in line with the local tables.
///
/// Order: summary inserts, summary deletes, award inserts, status updates,
/// award deletes. Inserts go out in chunks of `max_insert_rows`; a failed
/// call stops the cycle and leaves earlier calls applied.
pub async fn sync_document(
    doc: &DocumentHandle<'_>,
    local: &LocalTables,
    live: &LiveTables,
    index_field: &str,
    config: &CampusConfig,
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    sync_summary(doc, &local.summary, &live.summary, index_field, config, &mut report).await?;
    sync_awards(doc, &local.award, &live.award, config, &mut report).await?;

    log::info!(
        "Sync for {} made {} remote calls",
        config.campus,
        report.calls.len()
    );
    Ok(report)
}

fn student_ids(table: &Table, index_field: &str) -> Vec<KeyPart> {
    table
        .column(index_field)
        .iter()
        .filter_map(KeyPart::from_value)
        .collect()
}

async fn sync_summary(
    doc: &DocumentHandle<'_>,
    local: &Table,
    live: &Table,
    index_field: &str,
    config: &CampusConfig,
    report: &mut SyncReport,
) -> Result<()> {
    let tab = &config.tabs.efc_name;
    let diff = diff_keys(student_ids(live, index_field), student_ids(local, index_field));

    if !diff.to_insert.is_empty() {
        let ids: BTreeSet<KeyPart> = diff.to_insert.iter().cloned().collect();
        let payload = RowPayload::summary_rows(local, index_field, &ids);
        let total = chunk_count(payload.len(), config.sync.max_insert_rows);

        for (i, chunk) in chunk_rows(&payload.rows, config.sync.max_insert_rows).enumerate() {
            let call = doc
                .insert_summary_rows(tab, roster_cols::NAME, &payload.header, chunk, config.tabs.efc_header_row)
                .await
                .with_context(|| {
                    format!("Inserting students into '{}' failed on chunk {} of {}", tab, i + 1, total)
                })?;
            report.summary_inserted += chunk.len();
            report.chunks += 1;
            report.calls.push(call);
        }
        log::info!("Inserted {} students into '{}'", report.summary_inserted, tab);
    }

    if !diff.to_delete.is_empty() {
        let call = doc
            .delete_summary_rows(tab, index_field, &diff.to_delete)
            .await
            .with_context(|| format!("Deleting {} students from '{}' failed", diff.to_delete.len(), tab))?;
        report.summary_deleted = diff.to_delete.len();
        report.calls.push(call);
        log::info!("Deleted {} students from '{}'", report.summary_deleted, tab);
    }

    Ok(())
}

async fn sync_awards(
    doc: &DocumentHandle<'_>,
    local: &Table,
    live: &Table,
    config: &CampusConfig,
    report: &mut SyncReport,
) -> Result<()> {
    let tab = &config.tabs.award_name;
    let header_row = config.tabs.award_header_row;

    let local_rows = status_rows(local);
    let incomplete = local_rows.iter().filter(|r| r.is_none()).count();
    if incomplete > 0 {
        log::warn!("{} local award rows have a blank key and will not be synced", incomplete);
    }
    let new: Vec<StatusRow> = local_rows.into_iter().flatten().collect();

    let diff = diff_award_rows(status_rows(live), new);
    report.missing_index = diff.missing_index;

    if !diff.to_insert.is_empty() {
        if config.sync.allow_award_inserts {
            let keys: BTreeSet<AwardKey> = diff.to_insert.iter().cloned().collect();
            let payload = RowPayload::award_rows(local, &keys);
            let total = chunk_count(payload.len(), config.sync.max_insert_rows);

            for (i, chunk) in chunk_rows(&payload.rows, config.sync.max_insert_rows).enumerate() {
                let call = doc
                    .insert_award_rows(tab, &payload.header, chunk, header_row)
                    .await
                    .with_context(|| {
                        format!("Inserting award rows into '{}' failed on chunk {} of {}", tab, i + 1, total)
                    })?;
                report.award_inserted += chunk.len();
                report.chunks += 1;
                report.calls.push(call);
            }
            log::info!("Inserted {} award rows into '{}'", report.award_inserted, tab);
        } else {
            report.award_inserts_skipped = diff.to_insert.len();
            log::warn!(
                "{} award rows are missing from '{}' but inserts are disabled for {}",
                diff.to_insert.len(),
                tab,
                config.campus
            );
        }
    }

    if !diff.result_changes.is_empty() {
        for change in &diff.result_changes {
            log::debug!("Status of {} is now '{}'", change.key, change.status);
        }
        let call = doc
            .update_award_statuses(tab, &diff.result_changes, header_row)
            .await
            .with_context(|| format!("Updating {} statuses in '{}' failed", diff.result_changes.len(), tab))?;
        report.status_changed = diff.result_changes.len();
        report.calls.push(call);
        log::info!("Updated {} statuses in '{}'", report.status_changed, tab);
    }

    if !diff.to_delete.is_empty() {
        let call = doc
            .delete_award_rows(tab, header_row, &diff.to_delete)
            .await
            .with_context(|| format!("Deleting {} award rows from '{}' failed", diff.to_delete.len(), tab))?;
        report.award_deleted = diff.to_delete.len();
        report.calls.push(call);
        log::info!("Deleted {} award rows from '{}'", report.award_deleted, tab);
    }

    Ok(())
}
