//! Local rows selected for insertion, ready to send

use std::collections::BTreeSet;

use crate::build::doc_cols;
use crate::table::{AwardKey, KeyPart, Record, Table, Value};

/// Header plus full local rows, in local table order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPayload {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowPayload {
    fn from_matching<F>(table: &Table, mut keep: F) -> Self
    where
        F: FnMut(&Record<'_>) -> bool,
    {
        Self {
            header: table.columns().to_vec(),
            rows: table
                .records()
                .filter(|r| keep(r))
                .map(|r| r.values().to_vec())
                .collect(),
        }
    }

    /// Summary rows whose student id is in `ids`
    pub fn summary_rows(table: &Table, index: &str, ids: &BTreeSet<KeyPart>) -> Self {
        Self::from_matching(table, |r| {
            KeyPart::from_value(r.get(index)).is_some_and(|id| ids.contains(&id))
        })
    }

    /// Award rows whose `(SID, NCESid, Home/Away)` is in `keys`
    pub fn award_rows(table: &Table, keys: &BTreeSet<AwardKey>) -> Self {
        let [sid, nces, home, _] = doc_cols::STATUS_KEY;
        Self::from_matching(table, |r| {
            AwardKey::from_values(r.get(sid), r.get(nces), r.get(home)).is_some_and(|k| keys.contains(&k))
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_kept_in_table_order() {
        let table = Table::from_rows(
            ["StudentID", "LastFirst"],
            vec![
                vec![Value::Int(1003), Value::from("Cole, Ann")],
                vec![Value::Int(1001), Value::from("Abel, Tom")],
                vec![Value::Int(1002), Value::from("Baker, Sue")],
            ],
        );
        let ids = BTreeSet::from([KeyPart::Int(1001), KeyPart::Int(1003)]);

        let payload = RowPayload::summary_rows(&table, "StudentID", &ids);
        assert_eq!(payload.header, vec!["StudentID".to_string(), "LastFirst".to_string()]);
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.rows[0][0], Value::Int(1003));
        assert_eq!(payload.rows[1][0], Value::Int(1001));
    }

    #[test]
    fn test_award_rows_by_full_key() {
        let table = Table::from_rows(
            ["SID", "NCESid", "Home/Away", "Result (from Naviance)"],
            vec![
                vec![Value::Int(1001), Value::Int(5001), Value::from("Home"), Value::from("Pending")],
                vec![Value::Int(1001), Value::Int(5001), Value::from("Campus"), Value::from("Pending")],
            ],
        );
        let keys = BTreeSet::from([AwardKey::new(1001, 5001, "Campus")]);

        let payload = RowPayload::award_rows(&table, &keys);
        assert_eq!(payload.len(), 1);
        assert_eq!(payload.rows[0][2], Value::from("Campus"));
    }
}
