//! Composite-key diffing between the live document and the local tables

use std::collections::BTreeSet;

use crate::build::doc_cols;
use crate::table::{AwardKey, StatusRow, Table};

/// Keys to add and remove so that `current` matches `new`
#[derive(Debug, Clone, PartialEq)]
pub struct KeyDiff<K> {
    pub to_insert: Vec<K>,
    pub to_delete: Vec<K>,
}

impl<K> KeyDiff<K> {
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_delete.is_empty()
    }
}

/// Set difference in both directions. Outputs are in ascending key order.
pub fn diff_keys<K: Ord>(current: impl IntoIterator<Item = K>, new: impl IntoIterator<Item = K>) -> KeyDiff<K> {
    let current: BTreeSet<K> = current.into_iter().collect();
    let mut new: BTreeSet<K> = new.into_iter().collect();

    let mut to_delete = Vec::new();
    for key in current {
        if !new.remove(&key) {
            to_delete.push(key);
        }
    }

    KeyDiff {
        to_insert: new.into_iter().collect(),
        to_delete,
    }
}

/// Award table changes for one sync cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AwardDiff {
    pub to_insert: Vec<AwardKey>,
    pub to_delete: Vec<AwardKey>,
    /// Rows present on both sides whose status label differs; carries the new label
    pub result_changes: Vec<StatusRow>,
    /// Live rows skipped because part of their key was blank
    pub missing_index: usize,
}

impl AwardDiff {
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_delete.is_empty() && self.result_changes.is_empty()
    }
}

/// Diff award rows by `(student, institution, location)`, then report the
/// joint rows whose status changed.
///
/// `current` rows that are `None` had a blank key part; they are counted and
/// left out of every output. Only the status is compared on joint rows, so
/// hand-entered columns never produce a change.
pub fn diff_award_rows(
    current: impl IntoIterator<Item = Option<StatusRow>>,
    new: impl IntoIterator<Item = StatusRow>,
) -> AwardDiff {
    let mut missing_index = 0;
    let current: BTreeSet<StatusRow> = current
        .into_iter()
        .filter_map(|row| {
            if row.is_none() {
                missing_index += 1;
            }
            row
        })
        .collect();
    let new: BTreeSet<StatusRow> = new.into_iter().collect();

    if missing_index > 0 {
        log::warn!(
            "{} award rows in the document have a blank SID, NCESid or Home/Away and were skipped",
            missing_index
        );
    }

    let current_keys: BTreeSet<&AwardKey> = current.iter().map(|r| &r.key).collect();
    let new_keys: BTreeSet<&AwardKey> = new.iter().map(|r| &r.key).collect();

    let keys = diff_keys(current_keys.iter().copied(), new_keys.iter().copied());
    let joint: BTreeSet<&AwardKey> = current_keys.intersection(&new_keys).copied().collect();

    let current_joint: BTreeSet<&StatusRow> = current.iter().filter(|r| joint.contains(&r.key)).collect();
    let result_changes = new
        .iter()
        .filter(|r| joint.contains(&r.key) && !current_joint.contains(r))
        .cloned()
        .collect();

    AwardDiff {
        to_insert: keys.to_insert.into_iter().cloned().collect(),
        to_delete: keys.to_delete.into_iter().cloned().collect(),
        result_changes,
        missing_index,
    }
}

/// `(SID, NCESid, Home/Away, Result)` of every award row; `None` where a key
/// part is blank
pub fn status_rows(table: &Table) -> Vec<Option<StatusRow>> {
    let [sid, nces, home, result] = doc_cols::STATUS_KEY;
    table
        .records()
        .map(|r| {
            AwardKey::from_values(r.get(sid), r.get(nces), r.get(home))
                .map(|key| StatusRow::new(key, r.get(result)))
        })
        .collect()
}
