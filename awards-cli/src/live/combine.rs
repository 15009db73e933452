//! Merging every campus's live backup into the "All" files

use std::path::PathBuf;

use anyhow::Result;

use super::{BackupStore, LiveTab};
use crate::config::{ALL_CAMPUSES, FieldLists};
use crate::enrich::roster_cols;
use crate::table::{Table, Value};

fn fields_for(fields: &FieldLists, tab: LiveTab) -> &[String] {
    match tab {
        LiveTab::Summary => &fields.live_efc_fields,
        LiveTab::Award => &fields.live_award_fields,
        LiveTab::Decision => &fields.live_decision_fields,
    }
}

/// Concatenate the saved tabs of every campus (tagging each row with its
/// campus), keep the configured columns and save them under the `All` campus.
/// Returns the files written.
pub fn combine_campuses(store: &BackupStore, campuses: &[String], fields: &FieldLists) -> Result<Vec<PathBuf>> {
    log::info!("Combining live files for {} campuses", campuses.len());
    let mut written = Vec::new();

    for tab in LiveTab::ALL {
        let mut combined: Option<Table> = None;

        for campus in campuses {
            let Some(mut table) = store.load_table(campus, tab)? else {
                continue;
            };
            table.set_column(roster_cols::CAMPUS, vec![Value::from(campus.as_str()); table.len()]);

            match combined.as_mut() {
                Some(all) => all.concat(&table),
                None => combined = Some(table),
            }
        }

        let Some(all) = combined else {
            log::debug!("No {} files to combine", tab);
            continue;
        };

        let projected = all.select(fields_for(fields, tab));
        written.push(store.save_table(ALL_CAMPUSES, tab, &projected)?);
    }

    Ok(written)
}
