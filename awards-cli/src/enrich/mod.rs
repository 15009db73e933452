//! Derived per-student and per-application fields
//!
//! Every rule here is total: malformed or missing input produces a "not
//! available" result instead of an error.

pub mod rates;
pub mod scores;
pub mod status;
pub mod strategy;
pub mod targets;

use crate::config::{ALL_CAMPUSES, EnrichmentRules};
use crate::table::{Table, Value};

pub use rates::{BumpList, final_grad_rate, predicted_grad_rate, selectivity};
pub use scores::{SatToAct, best_score};
pub use status::{AppStatus, ApplicationFacts, classify};
pub use strategy::{StrategyKey, StrategyTable};
pub use targets::{Goal, NeedGroup, TargetTable};

/// Roster columns read by the enrichment rules
pub mod roster_cols {
    pub const STUDENT_ID: &str = "StudentID";
    pub const NAME: &str = "LastFirst";
    pub const CAMPUS: &str = "Campus";
    pub const EFC: &str = "EFC";
    pub const ACT: &str = "ACT";
    pub const SAT: &str = "SAT";
    pub const GPA: &str = "GPA";
    pub const RACE: &str = "Race/ Eth";

    /// Added by `enrich_roster`
    pub const SAT_IN_ACT: &str = "local_sat_in_act";
    pub const BEST_SCORE: &str = "local_act_max";
    pub const STRATEGY: &str = "Stra-tegy";
    pub const TARGET_RATE: &str = "Target Grad Rate";
    pub const IDEAL_RATE: &str = "Ideal Grad Rate";
}

/// Lookup sheets the roster rules consult
#[derive(Debug, Clone, Copy)]
pub struct RosterLookups<'a> {
    pub strategies: &'a StrategyTable,
    pub targets: &'a TargetTable,
    pub sat_to_act: &'a SatToAct,
}

/// Computed columns for one student
#[derive(Debug, Clone, PartialEq)]
struct StudentMetrics {
    sat_in_act: Option<f64>,
    best_score: Option<f64>,
    strategy: Option<i64>,
    target_rate: Option<f64>,
    ideal_rate: Option<f64>,
}

fn student_metrics(
    record: &crate::table::Record<'_>,
    lookups: &RosterLookups<'_>,
    rules: &EnrichmentRules,
) -> StudentMetrics {
    use roster_cols::*;

    let gpa = record.get(GPA);
    let sat_in_act = lookups.sat_to_act.convert(record.get(SAT));
    let best = best_score(record.get(ACT).as_number(), sat_in_act);
    let strategy = lookups.strategies.classify(gpa, best, rules);
    let group = NeedGroup::classify(record.get(EFC), record.get(RACE), rules);

    StudentMetrics {
        sat_in_act,
        best_score: best,
        strategy,
        target_rate: lookups.targets.lookup(strategy, gpa, group, Goal::Target, rules),
        ideal_rate: lookups.targets.lookup(strategy, gpa, group, Goal::Ideal, rules),
    }
}

/// Filter the roster to a campus (unless `All`) and add score, strategy and
/// target/ideal grad rate columns
pub fn enrich_roster(
    roster: &Table,
    campus: &str,
    lookups: &RosterLookups<'_>,
    rules: &EnrichmentRules,
) -> Table {
    use roster_cols::*;

    let mut enriched = roster.clone();
    if campus != ALL_CAMPUSES {
        enriched.retain(|r| r.get(CAMPUS).is_text(campus));
    }

    let metrics: Vec<StudentMetrics> = enriched
        .records()
        .map(|r| student_metrics(&r, lookups, rules))
        .collect();

    enriched.set_column(SAT_IN_ACT, metrics.iter().map(|m| m.sat_in_act.into()).collect());
    enriched.set_column(BEST_SCORE, metrics.iter().map(|m| m.best_score.into()).collect());
    enriched.set_column(
        STRATEGY,
        metrics
            .iter()
            .map(|m| m.strategy.map(Value::Int).unwrap_or_default())
            .collect(),
    );
    enriched.set_column(TARGET_RATE, metrics.iter().map(|m| m.target_rate.into()).collect());
    enriched.set_column(IDEAL_RATE, metrics.iter().map(|m| m.ideal_rate.into()).collect());

    let missing = metrics.iter().filter(|m| m.strategy.is_none()).count();
    if missing > 0 {
        log::info!("{} of {} students have no strategy (missing GPA or scores)", missing, metrics.len());
    }
    log::info!("Total roster length of {}", enriched.len());
    enriched
}
