//! Test score equivalence

use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::table::{Table, Value};

/// SAT total → equivalent ACT composite
#[derive(Debug, Clone, Default)]
pub struct SatToAct {
    table: HashMap<i64, f64>,
}

impl SatToAct {
    /// Build from a sheet whose first column is the SAT score and which has
    /// an `ACT` column
    pub fn from_table(table: &Table) -> Result<Self> {
        let sat_column = table
            .columns()
            .first()
            .context("SAT to ACT table has no columns")?
            .clone();

        let table = table
            .records()
            .filter_map(|r| {
                let sat = r.get(&sat_column).as_int()?;
                let act = r.get("ACT").as_number()?;
                Some((sat, act))
            })
            .collect::<HashMap<_, _>>();
        log::debug!("Loaded {} SAT equivalences", table.len());
        Ok(Self { table })
    }

    /// ACT equivalent of an SAT score; not available for non-numeric or
    /// unlisted scores
    pub fn convert(&self, sat: &Value) -> Option<f64> {
        let sat = match sat {
            Value::Int(i) => *i,
            Value::Float(f) if f.fract() == 0.0 => *f as i64,
            _ => return None,
        };
        self.table.get(&sat).copied()
    }
}

/// The better of the ACT and the SAT-in-ACT score, whichever are present
pub fn best_score(act: Option<f64>, sat_in_act: Option<f64>) -> Option<f64> {
    match (act, sat_in_act) {
        (Some(a), Some(s)) => Some(a.max(s)),
        (Some(a), None) => Some(a),
        (None, Some(s)) => Some(s),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup() -> SatToAct {
        let table = Table::from_rows(
            ["SAT", "ACT"],
            vec![
                vec![Value::Int(1200), Value::Int(25)],
                vec![Value::Int(1010), Value::Int(19)],
            ],
        );
        SatToAct::from_table(&table).unwrap()
    }

    #[test]
    fn test_convert() {
        let lookup = lookup();
        assert_eq!(lookup.convert(&Value::Int(1200)), Some(25.0));
        assert_eq!(lookup.convert(&Value::Int(1210)), None);
        assert_eq!(lookup.convert(&Value::from("1200")), None);
        assert_eq!(lookup.convert(&Value::Null), None);
    }

    #[test]
    fn test_best_score() {
        assert_eq!(best_score(Some(22.0), Some(25.0)), Some(25.0));
        assert_eq!(best_score(Some(22.0), None), Some(22.0));
        assert_eq!(best_score(None, Some(19.0)), Some(19.0));
        assert_eq!(best_score(None, None), None);
    }
}
