//! Per-student × institution award table (the document's award tab)

use std::collections::{HashMap, HashSet};

use crate::config::{CampusConfig, EnrichmentRules};
use crate::enrich::rates::{MINORITY_RATE, OVERALL_RATE};
use crate::enrich::{ApplicationFacts, classify, final_grad_rate, roster_cols, selectivity};
use crate::loader::{app_cols, college_cols};
use crate::table::{IndexedTable, KeyPart, Table, Value};

/// Column names as they appear in the live document
pub mod doc_cols {
    pub const SID: &str = "SID";
    pub const NCES_ID: &str = "NCESid";
    pub const HOME_AWAY: &str = "Home/Away";
    pub const RESULT: &str = "Result (from Naviance)";
    pub const STUDENT: &str = "Student";
    pub const COLLEGE: &str = "College/University";
    pub const TARGET_RATE: &str = "Target Grad Rate";
    pub const IDEAL_RATE: &str = "Ideal Grad Rate";
    pub const FINAL_RATE: &str = "6-Year Minority Grad Rate";
    pub const SELECTIVITY: &str =
        "Selectivity\n1=Most+\n2=Most\n3=Highly\n4=Very\n5=Competitive\n6=Less\n7=Non\n8=2 year";
    pub const UNIQUE: &str = "Unique";

    /// Identity and monitored status of an award row, in diff order
    pub const STATUS_KEY: [&str; 4] = [SID, NCES_ID, HOME_AWAY, RESULT];
}

/// Working column names before the rename to document names
mod work_cols {
    pub const NAME: &str = "lf";
    pub const TARGET_RATE: &str = "tgr";
    pub const IDEAL_RATE: &str = "igr";
    pub const RACE: &str = "race";
    pub const COLLEGE: &str = "cname";
    pub const SELECTIVITY: &str = "barrons";
    pub const LOCATION: &str = "local";
    pub const OVERALL: &str = "sixyrgr";
    pub const MINORITY: &str = "sixyrgraah";
    pub const FINAL_RATE: &str = "sixyrfinal";
    pub const RESULT: &str = "final_result";
}

/// Hand-entry columns added empty for the document's users to fill in
pub const HAND_ENTRY_COLUMNS: [&str; 12] = [
    "Award Receiv- ed?",
    "Tuition & Fees (including insurance if req.)",
    "Room & board (if not living at home)",
    "College grants & scholarships",
    "Government grants (Pell/SEOG/MAP)",
    "Net Price (before Loans) <CALCULATED>",
    "Student Loans offered (include all non-parent)",
    "Out of Pocket Cost (Direct Cost-Grants-Loans) <CALCULATED>",
    "Your EFC <DRAWN FROM OTHER TAB>",
    "Unmet need <CALCULATED>",
    "Work Study (enter for comparison if desired)",
    "Award",
];

/// Living-arrangement flags from the college table
pub mod location {
    pub const CAMPUS: &str = "Campus";
    pub const HOME: &str = "Home";
    pub const BOTH: &str = "Both";

    pub const AT_HOME_SUFFIX: &str = "--At Home";
    pub const ON_CAMPUS_SUFFIX: &str = "--On Campus";
}

fn rename_map() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        (work_cols::NAME, doc_cols::STUDENT),
        (work_cols::TARGET_RATE, doc_cols::TARGET_RATE),
        (work_cols::IDEAL_RATE, doc_cols::IDEAL_RATE),
        (work_cols::COLLEGE, doc_cols::COLLEGE),
        (work_cols::SELECTIVITY, doc_cols::SELECTIVITY),
        (work_cols::RESULT, doc_cols::RESULT),
        (work_cols::FINAL_RATE, doc_cols::FINAL_RATE),
        (app_cols::STUDENT_ID, doc_cols::SID),
        (app_cols::NCES, doc_cols::NCES_ID),
        (work_cols::LOCATION, doc_cols::HOME_AWAY),
    ])
}

/// Lookups for one application row
#[derive(Debug, Clone, PartialEq)]
struct AwardFields {
    name: Value,
    target_rate: Value,
    ideal_rate: Value,
    race: Value,
    college: String,
    selectivity: Value,
    location: String,
    overall: Option<f64>,
    minority: Option<f64>,
    final_rate: Option<f64>,
    status: String,
}

fn award_fields(
    app: &crate::table::Record<'_>,
    roster: &IndexedTable,
    colleges: &IndexedTable,
    rules: &EnrichmentRules,
) -> AwardFields {
    let sid = app.get(app_cols::STUDENT_ID);
    let nces = app.get(app_cols::NCES);
    let from_roster =
        |column: &str| roster.lookup_value(sid, column).cloned().unwrap_or_default();
    let from_college = |column: &str| colleges.lookup_value(nces, column).cloned();

    let race = roster
        .lookup_value(sid, roster_cols::RACE)
        .cloned()
        .unwrap_or_else(|| Value::from("N/A"));
    let college = from_college(college_cols::NAME)
        .or_else(|| Some(app.get(app_cols::COLLEGE_NAME).clone()).filter(|v| !v.is_blank()))
        .map(|v| v.to_string())
        .unwrap_or_else(|| "NotAvail".to_string());
    let overall = from_college(OVERALL_RATE).and_then(|v| v.as_number());
    let minority = from_college(MINORITY_RATE).and_then(|v| v.as_number());

    AwardFields {
        name: roster
            .lookup_value(sid, roster_cols::NAME)
            .cloned()
            .unwrap_or_else(|| Value::from("StudentMissing")),
        target_rate: from_roster(roster_cols::TARGET_RATE),
        ideal_rate: from_roster(roster_cols::IDEAL_RATE),
        college,
        selectivity: selectivity(&from_college(college_cols::BARRONS).unwrap_or_default()),
        location: from_college(college_cols::LIVING)
            .map(|v| v.to_string())
            .unwrap_or_else(|| location::CAMPUS.to_string()),
        overall,
        minority,
        final_rate: final_grad_rate(&race, overall, minority, app.get(app_cols::COMMENTS), rules),
        status: classify(&ApplicationFacts::from_record(app)).label().to_string(),
        race,
    }
}

/// Split `Both` rows into a home row (kept in place) and an on-campus
/// duplicate appended after all originals.
///
/// The home row keeps `Unique = 1` and the duplicate gets `Unique = 0`, so
/// per-student counts only see each application once.
fn split_home_away(table: &mut Table) {
    use location::*;

    let loc_idx = table.column_index(work_cols::LOCATION);
    let name_idx = table.column_index(work_cols::COLLEGE);
    let (Some(loc_idx), Some(name_idx)) = (loc_idx, name_idx) else {
        return;
    };

    let originals = table.rows().to_vec();
    let duplicates: Vec<Vec<Value>> = originals
        .iter()
        .filter(|row| row[loc_idx].is_text(BOTH))
        .cloned()
        .collect();

    let columns = table.columns().to_vec();
    let mut split = Table::new(columns);
    for mut row in originals {
        if !row[loc_idx].is_text(CAMPUS) {
            row[name_idx] = Value::from(format!("{}{}", row[name_idx], AT_HOME_SUFFIX));
        }
        if row[loc_idx].is_text(BOTH) {
            row[loc_idx] = Value::from(HOME);
        }
        split.push_row(row);
    }
    let original_count = split.len();
    for mut row in duplicates {
        row[loc_idx] = Value::from(CAMPUS);
        row[name_idx] = Value::from(format!("{}{}", row[name_idx], ON_CAMPUS_SUFFIX));
        split.push_row(row);
    }

    let mut unique = vec![Value::Int(1); original_count];
    unique.resize(split.len(), Value::Int(0));
    split.set_column(doc_cols::UNIQUE, unique);
    *table = split;
}

/// Build the award table for the students in the summary table
pub fn build_award(
    summary: &Table,
    student_index: &str,
    roster: &IndexedTable,
    applications: &Table,
    colleges: &IndexedTable,
    config: &CampusConfig,
    rules: &EnrichmentRules,
) -> Table {
    let students: HashSet<KeyPart> = summary
        .column(student_index)
        .iter()
        .filter_map(KeyPart::from_value)
        .collect();

    let mut award = applications.clone();
    award.retain(|r| KeyPart::from_value(r.get(app_cols::STUDENT_ID)).is_some_and(|k| students.contains(&k)));

    let fields: Vec<AwardFields> = award
        .records()
        .map(|r| award_fields(&r, roster, colleges, rules))
        .collect();

    award.set_column(work_cols::NAME, fields.iter().map(|f| f.name.clone()).collect());
    award.set_column(work_cols::TARGET_RATE, fields.iter().map(|f| f.target_rate.clone()).collect());
    award.set_column(work_cols::IDEAL_RATE, fields.iter().map(|f| f.ideal_rate.clone()).collect());
    award.set_column(work_cols::RACE, fields.iter().map(|f| f.race.clone()).collect());
    award.set_column(work_cols::COLLEGE, fields.iter().map(|f| Value::from(f.college.as_str())).collect());
    award.set_column(work_cols::SELECTIVITY, fields.iter().map(|f| f.selectivity.clone()).collect());
    award.set_column(work_cols::LOCATION, fields.iter().map(|f| Value::from(f.location.as_str())).collect());
    award.set_column(work_cols::OVERALL, fields.iter().map(|f| f.overall.into()).collect());
    award.set_column(work_cols::MINORITY, fields.iter().map(|f| f.minority.into()).collect());
    award.set_column(work_cols::FINAL_RATE, fields.iter().map(|f| f.final_rate.into()).collect());
    award.set_column(work_cols::RESULT, fields.iter().map(|f| Value::from(f.status.as_str())).collect());
    for column in HAND_ENTRY_COLUMNS {
        award.set_column(column, vec![Value::from(""); fields.len()]);
    }

    split_home_away(&mut award);

    let before = award.len();
    award.retain(|r| {
        let status = r.get(work_cols::RESULT).to_string();
        config.statuses_to_include.contains(&status)
    });
    log::debug!(
        "Kept {} of {} award rows with included statuses",
        award.len(),
        before
    );

    let rename: HashMap<&str, &str> = rename_map()
        .into_iter()
        .filter(|(_, to)| config.award_fields.iter().any(|f| f == to))
        .collect();
    award.rename(&rename);

    let mut award = award.select(&config.award_fields);
    award.sort_by_specs(&config.award_sort);

    log::info!("Award table: {} rows for {} students", award.len(), students.len());
    award
}
