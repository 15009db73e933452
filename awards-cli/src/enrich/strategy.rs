//! Strategy classification from GPA and best test score

use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::config::EnrichmentRules;
use crate::table::{Table, Value};

/// Strategy table key: GPA in tenths and a whole-number score.
///
/// The lookup sheet labels its rows `"3.6:24"`; both the labels and the
/// student metrics are reduced to this pair so they meet on equal terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrategyKey {
    pub gpa_tenths: i64,
    pub score: i64,
}

impl StrategyKey {
    /// Floor the GPA to one decimal, clamp both metrics to their floors and
    /// round the score half-to-even
    pub fn from_metrics(gpa: f64, score: f64, rules: &EnrichmentRules) -> Option<Self> {
        if !gpa.is_finite() || !score.is_finite() {
            return None;
        }
        let floored = (gpa * 10.0).floor() / 10.0;
        let gpa = floored.max(rules.gpa_floor);
        let score = score.max(rules.score_floor).round_ties_even();
        Some(Self {
            gpa_tenths: (gpa * 10.0).round() as i64,
            score: score as i64,
        })
    }

    /// Parse a `"{gpa:.1}:{score}"` row label
    pub fn parse(label: &str) -> Option<Self> {
        let (gpa, score) = label.trim().split_once(':')?;
        let gpa: f64 = gpa.trim().parse().ok()?;
        let score: f64 = score.trim().parse().ok()?;
        if !gpa.is_finite() || !score.is_finite() {
            return None;
        }
        Some(Self {
            gpa_tenths: (gpa * 10.0).round() as i64,
            score: score.round_ties_even() as i64,
        })
    }
}

impl std::fmt::Display for StrategyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}:{}", self.gpa_tenths as f64 / 10.0, self.score)
    }
}

/// Strategy number per (GPA, score) cell of the lookup sheet
#[derive(Debug, Clone, Default)]
pub struct StrategyTable {
    strategies: HashMap<StrategyKey, i64>,
}

impl StrategyTable {
    /// Build from a sheet whose first column holds the row labels and which
    /// has a `Strategy` column
    pub fn from_table(table: &Table) -> Result<Self> {
        let label_column = table
            .columns()
            .first()
            .context("Strategy table has no columns")?
            .clone();
        if !table.has_column("Strategy") {
            anyhow::bail!("Strategy table has no 'Strategy' column");
        }

        let mut strategies = HashMap::new();
        let mut skipped = 0;
        for record in table.records() {
            let label = record.get(&label_column).to_string();
            let key = StrategyKey::parse(&label);
            let strategy = record.get("Strategy").as_number();
            match (key, strategy) {
                (Some(key), Some(strategy)) => {
                    strategies.insert(key, strategy.round_ties_even() as i64);
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            log::warn!("Skipped {} unreadable strategy table rows", skipped);
        }
        log::debug!("Loaded {} strategy cells", strategies.len());
        Ok(Self { strategies })
    }

    pub fn get(&self, key: &StrategyKey) -> Option<i64> {
        self.strategies.get(key).copied()
    }

    /// Strategy for a student's metrics; non-numeric input gives `None`
    pub fn classify(&self, gpa: &Value, score: Option<f64>, rules: &EnrichmentRules) -> Option<i64> {
        let key = StrategyKey::from_metrics(gpa.as_number()?, score?, rules)?;
        self.get(&key)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> EnrichmentRules {
        EnrichmentRules::default()
    }

    #[test]
    fn test_key_from_metrics() {
        let key = StrategyKey::from_metrics(3.65, 24.0, &rules()).unwrap();
        assert_eq!(key.to_string(), "3.6:24");
    }

    #[test]
    fn test_gpa_below_floor_is_clamped() {
        let key = StrategyKey::from_metrics(1.2, 20.0, &rules()).unwrap();
        assert_eq!(key.to_string(), "1.5:20");
    }

    #[test]
    fn test_score_clamped_and_rounded_half_even() {
        assert_eq!(StrategyKey::from_metrics(3.0, 9.0, &rules()).unwrap().score, 12);
        assert_eq!(StrategyKey::from_metrics(3.0, 22.5, &rules()).unwrap().score, 22);
        assert_eq!(StrategyKey::from_metrics(3.0, 23.5, &rules()).unwrap().score, 24);
    }

    #[test]
    fn test_parse_matches_metrics() {
        assert_eq!(
            StrategyKey::parse("3.6:24"),
            StrategyKey::from_metrics(3.69, 24.0, &rules())
        );
        assert_eq!(StrategyKey::parse("bogus"), None);
        assert_eq!(StrategyKey::parse("3.6:x"), None);
    }

    #[test]
    fn test_classify_non_numeric_is_not_available() {
        let table = Table::from_rows(
            ["Key", "Strategy"],
            vec![vec![Value::from("3.6:24"), Value::Int(2)]],
        );
        let strategies = StrategyTable::from_table(&table).unwrap();
        assert_eq!(strategies.classify(&Value::Float(3.65), Some(24.0), &rules()), Some(2));
        assert_eq!(strategies.classify(&Value::from("abc"), Some(24.0), &rules()), None);
        assert_eq!(strategies.classify(&Value::Float(3.65), None, &rules()), None);
        assert_eq!(strategies.classify(&Value::Float(3.95), Some(24.0), &rules()), None);
    }
}
