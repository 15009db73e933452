//! Report tables assembled from the live mirror and the source lookups

use std::collections::HashMap;

use crate::build::doc_cols;
use crate::config::SummarySettings;
use crate::enrich::rates::posse_bump;
use crate::enrich::roster_cols;
use crate::loader::app_cols;
use crate::table::{IndexedTable, KeyPart, Record, SortSpec, Table, Value};

use super::columns::{ColumnSource, ReportColumn};

/// Report column holding the student's race code
pub const RACE_COLUMN: &str = "Race/Eth";

/// Race codes whose grad rate comes from the second `Grad rate` argument
const MINORITY_RACES: [&str; 4] = ["H", "B", "M", "I"];

/// Comment marking a Posse scholarship application
const POSSE: &str = "Posse";

/// Award report column named as the student's choice on the summary sheet
const COLLEGE_COLUMN: &str = "College";

static NULL: Value = Value::Null;

/// Lookup tables the report columns draw from
pub struct ReportSources<'a> {
    /// Enriched roster indexed by student id
    pub roster: &'a IndexedTable,
    pub colleges: &'a IndexedTable,
    pub applications: &'a Table,
    /// Student id column of the live summary tab
    pub index_field: &'a str,
}

/// First application row per (institution, student)
struct ApplicationIndex<'a> {
    table: &'a Table,
    rows: HashMap<(KeyPart, KeyPart), usize>,
}

impl<'a> ApplicationIndex<'a> {
    fn new(table: &'a Table) -> Self {
        let mut rows = HashMap::new();
        for (i, record) in table.records().enumerate() {
            let nces = KeyPart::from_value(record.get(app_cols::NCES));
            let sid = KeyPart::from_value(record.get(app_cols::STUDENT_ID));
            if let (Some(nces), Some(sid)) = (nces, sid) {
                rows.entry((nces, sid)).or_insert(i);
            }
        }
        Self { table, rows }
    }

    fn lookup(&self, nces: &Value, sid: &Value, field: &str) -> Value {
        let (Some(nces), Some(sid)) = (KeyPart::from_value(nces), KeyPart::from_value(sid)) else {
            return Value::Null;
        };
        self.rows
            .get(&(nces, sid))
            .and_then(|i| self.table.record(*i))
            .map(|r| r.get(field).clone())
            .unwrap_or_default()
    }
}

fn looked_up(value: Option<&Value>) -> Value {
    value.cloned().unwrap_or_default()
}

/// Value of a non-computed column for one live row
fn source_value(
    source: &ColumnSource,
    record: &Record<'_>,
    student: &Value,
    sources: &ReportSources<'_>,
    apps: &ApplicationIndex<'_>,
) -> Value {
    match source {
        ColumnSource::Live(name) => record.get(name).clone(),
        ColumnSource::Index => student.clone(),
        ColumnSource::Roster { key, field } => {
            let id = key.as_deref().map_or(student, |k| record.get(k));
            looked_up(sources.roster.lookup_value(id, field))
        }
        ColumnSource::College { key, field } => looked_up(sources.colleges.lookup_value(record.get(key), field)),
        ColumnSource::Apps { field } => apps.lookup(record.get(doc_cols::NCES_ID), record.get(doc_cols::SID), field),
        ColumnSource::Special(_) => Value::Null,
    }
}

/// Computed columns. `args` are the names of other report columns of the
/// same row.
pub fn special_value(column: &str, args: &[String], record: &Record<'_>) -> Value {
    let arg = |i: usize| args.get(i).map(|a| record.get(a)).unwrap_or(&NULL);

    match column {
        "Grad rate" => {
            let minority = record
                .get(RACE_COLUMN)
                .as_str()
                .is_some_and(|r| MINORITY_RACES.contains(&r.trim()));
            let rate = if minority { arg(1) } else { arg(0) };
            if rate.is_blank() {
                Value::from("N/A")
            } else {
                rate.clone()
            }
        }
        "Grad rate for sorting" => {
            let base = arg(0);
            if base.is_text("N/A") {
                return Value::Float(0.0);
            }
            match base.as_number() {
                Some(rate) if arg(1).is_text(POSSE) => Value::Float(posse_bump(rate)),
                Some(rate) => Value::Float(rate),
                None => base.clone(),
            }
        }
        "Unique" | "Award" => Value::Int(1),
        other => Value::from(format!("{}+{}", args.join("*"), other)),
    }
}

/// Fill every configured column for the rows of `live`, then drop helper
/// columns and sort
fn assemble(
    live: &Table,
    columns: &[ReportColumn],
    sources: &ReportSources<'_>,
    student_of: impl Fn(&Record<'_>) -> Value,
    sorts: &[SortSpec],
) -> Table {
    let apps = ApplicationIndex::new(sources.applications);

    let rows = live.records().map(|record| {
        let student = student_of(&record);
        columns
            .iter()
            .map(|c| source_value(&c.source, &record, &student, sources, &apps))
            .collect()
    });
    let mut table = Table::from_rows(columns.iter().map(|c| c.name.clone()), rows);

    // In configured order so later specials can read earlier ones
    for column in columns {
        if let ColumnSource::Special(args) = &column.source {
            let values = table
                .records()
                .map(|r| special_value(&column.name, args, &r))
                .collect();
            table.set_column(&column.name, values);
        }
    }

    table.sort_by_specs(sorts);
    let visible: Vec<&str> = columns
        .iter()
        .filter(|c| !c.is_helper())
        .map(|c| c.name.as_str())
        .collect();
    table.select(&visible)
}

/// One row per live award row
pub fn build_award_report(
    live_award: &Table,
    columns: &[ReportColumn],
    sources: &ReportSources<'_>,
    sorts: &[SortSpec],
) -> Table {
    let report = assemble(live_award, columns, sources, |r| r.get(doc_cols::SID).clone(), sorts);
    log::info!("Award report has {} rows", report.len());
    report
}

/// One row per live summary row. Adds a `Campus` column when none is configured.
pub fn build_student_report(
    live_summary: &Table,
    columns: &[ReportColumn],
    sources: &ReportSources<'_>,
    campus: &str,
    sorts: &[SortSpec],
) -> Table {
    let index_field = sources.index_field;
    let mut report = assemble(live_summary, columns, sources, |r| r.get(index_field).clone(), sorts);

    if !report.has_column(roster_cols::CAMPUS) {
        report.set_column(roster_cols::CAMPUS, vec![Value::from(campus); report.len()]);
    }
    log::info!("Student report has {} rows", report.len());
    report
}

/// Summary sheet column names
pub mod summary_cols {
    pub const APPLICATIONS: &str = "Applications";
    pub const ACCEPTED: &str = "Accepted";
    pub const AWARDS: &str = "Award options";
    pub const CHOICE: &str = "Choice";
}

#[derive(Default)]
struct StudentCounts {
    name: Value,
    applications: f64,
    accepted: f64,
    awards: f64,
    choice: Option<Value>,
}

/// Per-student counts over the award report, in award report order
pub fn build_summary_sheet(award_report: &Table, settings: &SummarySettings, choice_label: &str) -> Table {
    let mut order: Vec<KeyPart> = Vec::new();
    let mut counts: HashMap<KeyPart, StudentCounts> = HashMap::new();

    for record in award_report.records() {
        let Some(student) = KeyPart::from_value(record.get(&settings.student_field)) else {
            continue;
        };
        let entry = counts.entry(student.clone()).or_insert_with(|| {
            order.push(student);
            StudentCounts {
                name: record.get(&settings.name_field).clone(),
                ..StudentCounts::default()
            }
        });

        let unique = record.get(&settings.unique_field).as_number().unwrap_or(0.0);
        let result = record.get(&settings.result_field);
        let accepted = settings.accepted_labels.iter().any(|l| result.is_text(l));

        entry.applications += unique;
        if accepted {
            entry.accepted += unique;
            entry.awards += record.get(&settings.award_field).as_number().unwrap_or(0.0);
        }
        if result.is_text(choice_label) && entry.choice.is_none() {
            entry.choice = Some(record.get(COLLEGE_COLUMN).clone());
        }
    }

    let rows = order.into_iter().filter_map(|student| {
        let c = counts.remove(&student)?;
        Some(vec![
            student.to_value(),
            c.name,
            Value::Int(c.applications as i64),
            Value::Int(c.accepted as i64),
            Value::Int(c.awards as i64),
            c.choice.unwrap_or_default(),
        ])
    });

    Table::from_rows(
        [
            settings.student_field.as_str(),
            settings.name_field.as_str(),
            summary_cols::APPLICATIONS,
            summary_cols::ACCEPTED,
            summary_cols::AWARDS,
            summary_cols::CHOICE,
        ],
        rows,
    )
}
