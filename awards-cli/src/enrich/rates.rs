//! College-level rates: selectivity, final grad rate and predicted grad rate

use std::collections::HashSet;

use crate::config::EnrichmentRules;
use crate::table::{IndexedTable, KeyPart, Table, Value};

/// College table columns
pub const OVERALL_RATE: &str = "Adj6yrGrad_All";
pub const MINORITY_RATE: &str = "Adj6yrGrad_AA_Hisp";

/// Translate the Barron's selectivity text to the 1..8 scale used in the
/// document. `N/A` for "Not Available", `?` for anything unrecognized.
pub fn selectivity(barrons: &Value) -> Value {
    let rank = match barrons.as_str().map(str::trim) {
        Some("Most Competitive+") => 1,
        Some("Most Competitive") => 2,
        Some("Highly Competitive") => 3,
        Some("Very Competitive") => 4,
        Some("Competitive") => 5,
        Some("Less Competitive") => 6,
        Some("Noncompetitive") => 7,
        Some("2 year (Noncompetitive)") | Some("2 year (Competitive)") => 8,
        Some("Not Available") => return Value::from("N/A"),
        _ => return Value::from("?"),
    };
    Value::Int(rank)
}

/// Posse scholars get a boost: +15 points below 70%, otherwise half the gap
/// to 100%
pub fn posse_bump(rate: f64) -> f64 {
    if rate < 0.7 {
        rate + 0.15
    } else {
        1.0 - (1.0 - rate) / 2.0
    }
}

/// Bump-list boost for predicted grad rates (inclusive at 70%)
pub fn bump_list_boost(rate: f64) -> f64 {
    if rate <= 0.7 {
        rate + 0.15
    } else {
        (rate + 1.0) / 2.0
    }
}

/// Grad rate shown on the award row: minority rate for the configured races,
/// overall otherwise, with the Posse bump applied
pub fn final_grad_rate(
    race: &Value,
    overall: Option<f64>,
    minority: Option<f64>,
    comments: &Value,
    rules: &EnrichmentRules,
) -> Option<f64> {
    let uses_minority = race
        .as_str()
        .is_some_and(|r| rules.minority_rate_races.iter().any(|m| m == r));
    let rate = if uses_minority { minority } else { overall }?;
    if comments.is_text("Posse") {
        Some(posse_bump(rate))
    } else {
        Some(rate)
    }
}

/// (student, institution) pairs that get the predicted-rate boost
#[derive(Debug, Clone, Default)]
pub struct BumpList {
    pairs: HashSet<(KeyPart, KeyPart)>,
}

impl BumpList {
    /// Build from a sheet with `SID` and `NCESid` columns
    pub fn from_table(table: &Table) -> Self {
        let pairs = table
            .records()
            .filter_map(|r| {
                Some((
                    KeyPart::from_value(r.get("SID"))?,
                    KeyPart::from_value(r.get("NCESid"))?,
                ))
            })
            .collect::<HashSet<_>>();
        log::debug!("Loaded {} bump list pairs", pairs.len());
        Self { pairs }
    }

    pub fn contains(&self, student: &KeyPart, institution: &KeyPart) -> bool {
        self.pairs.contains(&(student.clone(), institution.clone()))
    }
}

/// Predicted grad rate of one decision option.
///
/// A blank institution id gives 0.0; an institution missing from the college
/// table gives `TBD`; a known institution with no rate gives `N/A`.
pub fn predicted_grad_rate(
    student: &Value,
    institution: &Value,
    race: Option<&Value>,
    colleges: &IndexedTable,
    bumps: &BumpList,
    rules: &EnrichmentRules,
) -> Value {
    let majority = race
        .and_then(Value::as_str)
        .is_some_and(|r| rules.majority_races.iter().any(|m| m == r));
    let column = if majority { OVERALL_RATE } else { MINORITY_RATE };

    let Some(nces) = KeyPart::from_value(institution) else {
        return Value::Float(0.0);
    };
    if !colleges.contains(&nces) {
        return Value::from("TBD");
    }
    let Some(rate) = colleges.lookup(&nces, column).and_then(Value::as_number) else {
        return Value::from("N/A");
    };

    let bumped = KeyPart::from_value(student).is_some_and(|sid| bumps.contains(&sid, &nces));
    Value::Float(if bumped { bump_list_boost(rate) } else { rate })
}
