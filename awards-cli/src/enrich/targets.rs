//! Target and ideal graduation rate lookups
//!
//! The target sheet has one row per strategy and one column per
//! (need group, goal) pair, e.g. `W/A_target` or `minus1_ideal`. A few
//! strategies are split on GPA and have two rows, `"2+"` and `"2<"`.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};

use crate::config::EnrichmentRules;
use crate::table::{Table, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpaBand {
    /// GPA at or above the split line (`+` rows)
    AtOrAbove,
    /// GPA below the split line (`<` rows)
    Below,
}

/// Row of the target sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRow {
    Plain(i64),
    Split(i64, GpaBand),
}

impl TargetRow {
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        let (number, band) = if let Some(n) = label.strip_suffix('+') {
            (n, Some(GpaBand::AtOrAbove))
        } else if let Some(n) = label.strip_suffix('<') {
            (n, Some(GpaBand::Below))
        } else {
            (label, None)
        };
        let number: f64 = number.trim().parse().ok()?;
        if !number.is_finite() {
            return None;
        }
        let number = number.round_ties_even() as i64;
        Some(match band {
            Some(band) => TargetRow::Split(number, band),
            None => TargetRow::Plain(number),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeedGroup {
    /// EFC is the "no data" sentinel
    NoNeedData,
    /// Race code in the majority list
    WhiteAsian,
    /// Every other race code
    BlackHispanic,
}

impl NeedGroup {
    fn prefix(&self) -> &'static str {
        match self {
            NeedGroup::NoNeedData => "minus1",
            NeedGroup::WhiteAsian => "W/A",
            NeedGroup::BlackHispanic => "AA/H",
        }
    }

    /// Pick the column group from the student's EFC and race code
    pub fn classify(efc: &Value, race: &Value, rules: &EnrichmentRules) -> Self {
        if efc.as_number() == Some(rules.no_need_efc as f64) {
            NeedGroup::NoNeedData
        } else if race
            .as_str()
            .is_some_and(|r| rules.majority_races.iter().any(|m| m == r))
        {
            NeedGroup::WhiteAsian
        } else {
            NeedGroup::BlackHispanic
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Goal {
    Target,
    Ideal,
}

impl Goal {
    fn suffix(&self) -> &'static str {
        match self {
            Goal::Target => "target",
            Goal::Ideal => "ideal",
        }
    }
}

/// Column of the target sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateColumn {
    pub group: NeedGroup,
    pub goal: Goal,
}

impl RateColumn {
    pub fn parse(name: &str) -> Option<Self> {
        let (prefix, suffix) = name.trim().rsplit_once('_')?;
        let group = [NeedGroup::NoNeedData, NeedGroup::WhiteAsian, NeedGroup::BlackHispanic]
            .into_iter()
            .find(|g| g.prefix() == prefix)?;
        let goal = [Goal::Target, Goal::Ideal]
            .into_iter()
            .find(|g| g.suffix() == suffix)?;
        Some(Self { group, goal })
    }
}

impl std::fmt::Display for RateColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.group.prefix(), self.goal.suffix())
    }
}

/// Typed view of the target sheet
#[derive(Debug, Clone, Default)]
pub struct TargetTable {
    rates: HashMap<(TargetRow, RateColumn), f64>,
    split_strategies: HashSet<i64>,
}

impl TargetTable {
    pub fn from_table(table: &Table) -> Result<Self> {
        let label_column = table
            .columns()
            .first()
            .context("Target table has no columns")?
            .clone();
        let rate_columns: Vec<(String, RateColumn)> = table
            .columns()
            .iter()
            .filter_map(|c| RateColumn::parse(c).map(|rc| (c.clone(), rc)))
            .collect();
        if rate_columns.is_empty() {
            anyhow::bail!("Target table has no '<group>_<goal>' rate columns");
        }

        let mut rates = HashMap::new();
        let mut split_strategies = HashSet::new();
        for record in table.records() {
            let Some(row) = TargetRow::parse(&record.get(&label_column).to_string()) else {
                continue;
            };
            if let TargetRow::Split(n, GpaBand::AtOrAbove) = row {
                split_strategies.insert(n);
            }
            for (name, column) in &rate_columns {
                if let Some(rate) = record.get(name).as_number() {
                    rates.insert((row, *column), rate);
                }
            }
        }

        log::debug!(
            "Loaded {} target rates ({} split strategies)",
            rates.len(),
            split_strategies.len()
        );
        Ok(Self {
            rates,
            split_strategies,
        })
    }

    pub fn is_split(&self, strategy: i64) -> bool {
        self.split_strategies.contains(&strategy)
    }

    /// Row for a strategy, choosing the GPA band for split strategies
    pub fn row_for(&self, strategy: i64, gpa: f64, rules: &EnrichmentRules) -> TargetRow {
        if self.is_split(strategy) {
            let band = if gpa >= rules.split_gpa {
                GpaBand::AtOrAbove
            } else {
                GpaBand::Below
            };
            TargetRow::Split(strategy, band)
        } else {
            TargetRow::Plain(strategy)
        }
    }

    /// Target or ideal rate for a student; `None` when any input is missing
    pub fn lookup(
        &self,
        strategy: Option<i64>,
        gpa: &Value,
        group: NeedGroup,
        goal: Goal,
        rules: &EnrichmentRules,
    ) -> Option<f64> {
        let strategy = strategy?;
        let gpa = gpa.as_number()?;
        let row = self.row_for(strategy, gpa, rules);
        self.rates.get(&(row, RateColumn { group, goal })).copied()
    }
}
