//! Decision options: one row per live award a student could still choose

use crate::config::{DecisionOptionFields, EnrichmentRules};
use crate::enrich::{AppStatus, BumpList, predicted_grad_rate, roster_cols};
use crate::table::{IndexedTable, KeyPart, SortSpec, Table, Value};

/// Loans above this are added to the out-of-pocket cost
pub const LOAN_ALLOWANCE: f64 = 6000.0;

/// A row of the decision options tab
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionOption {
    pub student: Value,
    pub college: Value,
    pub result: Value,
    pub pgr: Value,
    pub out_of_pocket: Value,
    pub grants: Value,
}

impl DecisionOption {
    pub fn to_row(&self) -> Vec<Value> {
        vec![
            self.student.clone(),
            self.college.clone(),
            self.result.clone(),
            self.pgr.clone(),
            self.out_of_pocket.clone(),
            self.grants.clone(),
        ]
    }
}

/// Numeric cell or numeric text
fn numeric(value: &Value) -> Option<f64> {
    value
        .as_number()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

fn or_text(value: &Value, fallback: &str) -> Value {
    if value.is_blank() {
        Value::from(fallback)
    } else {
        value.clone()
    }
}

/// Out-of-pocket cost counting loans above the allowance as cost. Left as
/// is unless both values are numbers.
pub fn out_of_pocket_with_loans(loans: &Value, out_of_pocket: &Value) -> Value {
    match (numeric(loans), numeric(out_of_pocket)) {
        (Some(loans), Some(oop)) if loans > LOAN_ALLOWANCE => Value::Float(oop + (loans - LOAN_ALLOWANCE)),
        (_, Some(oop)) => Value::Float(oop),
        _ => out_of_pocket.clone(),
    }
}

/// Options for every student from the live award tab: denied rows dropped,
/// sorted by student then college
pub fn build_options(
    live_award: &Table,
    fields: &DecisionOptionFields,
    roster: &IndexedTable,
    colleges: &IndexedTable,
    bumps: &BumpList,
    rules: &EnrichmentRules,
) -> Vec<DecisionOption> {
    let mut awards = live_award.select(&fields.all());
    awards.retain(|r| !r.get(&fields.result_code).is_text(AppStatus::Denied.label()));
    awards.sort_by_specs(&[SortSpec::asc(&fields.sid), SortSpec::asc(&fields.college)]);

    awards
        .records()
        .map(|r| {
            let student = r.get(&fields.sid);
            let loans = match r.get(&fields.student_loans) {
                v if v.is_blank() => Value::Float(0.0),
                v => v.clone(),
            };
            let out_of_pocket = or_text(r.get(&fields.out_of_pocket), "TBD");
            let race = roster.lookup_value(student, roster_cols::RACE);

            let pgr = predicted_grad_rate(student, r.get(&fields.nces), race, colleges, bumps, rules);

            DecisionOption {
                student: student.clone(),
                college: r.get(&fields.college).clone(),
                result: or_text(r.get(&fields.result_code), "TBD"),
                pgr: or_text(&pgr, "N/A"),
                out_of_pocket: out_of_pocket_with_loans(&loans, &out_of_pocket),
                grants: or_text(r.get(&fields.grants), "N/A"),
            }
        })
        .collect()
}

/// The college a student marked as their choice: the only `CHOICE!` option,
/// or with two (home and campus versions) the one not ending in "Campus"
pub fn unique_choice(options: &[&DecisionOption]) -> Value {
    let choices: Vec<&&DecisionOption> = options
        .iter()
        .filter(|o| o.result.is_text(AppStatus::Choice.label()))
        .collect();

    match choices.as_slice() {
        [only] => only.college.clone(),
        [first, second] => {
            if first.college.to_string().ends_with("Campus") {
                second.college.clone()
            } else {
                first.college.clone()
            }
        }
        _ => Value::from(""),
    }
}

/// Options grouped by student key, in option order
pub fn options_for<'a>(options: &'a [DecisionOption], student: &KeyPart) -> Vec<&'a DecisionOption> {
    options
        .iter()
        .filter(|o| KeyPart::from_value(&o.student).as_ref() == Some(student))
        .collect()
}
