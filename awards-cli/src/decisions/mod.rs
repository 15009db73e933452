//! Decision options and decisions tabs
//!
//! Each student gets a block of option rows (a blank row, one row per live
//! award that was not denied, then the standing defaults) and one decisions
//! row pointing at the first and last row of that block.

pub mod options;

use anyhow::{Context, Result};

use crate::api::{DocumentHandle, RemoteCall};
use crate::config::{DecisionDefault, DecisionOptionFields, EnrichmentRules, TabSettings};
use crate::enrich::{BumpList, roster_cols};
use crate::live::LiveTables;
use crate::table::{IndexedTable, KeyPart, Value};

pub use options::{DecisionOption, build_options, unique_choice};

pub const OPTIONS_HEADER: [&str; 6] = ["student", "college", "Result", "pgr", "out_of_pocket", "cgs"];
pub const DECISIONS_HEADER: [&str; 6] = ["SID", "LastFirst", "SR", "ER", "Choice", "Student TGR"];

/// Both tabs as grids, header first
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTables {
    pub options: Vec<Vec<Value>>,
    pub decisions: Vec<Vec<Value>>,
}

/// Lookups the decision refresh reads besides the live tabs
pub struct DecisionContext<'a> {
    pub roster: &'a IndexedTable,
    pub colleges: &'a IndexedTable,
    pub bumps: &'a BumpList,
    pub rules: &'a EnrichmentRules,
    pub fields: &'a DecisionOptionFields,
    pub defaults: &'a [DecisionDefault],
    pub index_field: &'a str,
}

fn header(names: [&str; 6]) -> Vec<Value> {
    names.iter().map(|n| Value::from(*n)).collect()
}

/// Build the options and decisions grids from the live summary and award tabs.
///
/// Row numbers in the decisions grid are sheet rows of the options tab, whose
/// data starts right below `options_header_row`.
pub fn build_decision_tables(live: &LiveTables, ctx: &DecisionContext<'_>, options_header_row: usize) -> DecisionTables {
    let all_options = build_options(&live.award, ctx.fields, ctx.roster, ctx.colleges, ctx.bumps, ctx.rules);

    let mut options = vec![header(OPTIONS_HEADER)];
    let mut decisions = vec![header(DECISIONS_HEADER)];
    let mut current_row = 1 + options_header_row as i64;

    for student in live.summary.records() {
        let id = student.get(ctx.index_field);
        let Some(key) = KeyPart::from_value(id) else {
            log::warn!("Skipping a summary row with no {}", ctx.index_field);
            continue;
        };
        let these = options::options_for(&all_options, &key);

        options.push(vec![
            id.clone(),
            Value::from(""),
            Value::from("N/A"),
            Value::from("TBD"),
            Value::from("TBD"),
            Value::Float(0.0),
        ]);
        options.extend(these.iter().map(|o| o.to_row()));
        for default in ctx.defaults {
            options.push(vec![
                id.clone(),
                Value::from(default.label.as_str()),
                Value::from("N/A"),
                Value::Float(default.pgr),
                Value::Float(0.0),
                Value::Float(0.0),
            ]);
        }

        let block = (1 + these.len() + ctx.defaults.len()) as i64;
        let target = match ctx.roster.lookup(&key, roster_cols::TARGET_RATE) {
            Some(rate) => rate.clone(),
            None => Value::from("TBD"),
        };
        decisions.push(vec![
            id.clone(),
            student.get(roster_cols::NAME).clone(),
            Value::Int(current_row),
            Value::Int(current_row + block - 1),
            unique_choice(&these),
            target,
        ]);
        current_row += block;
    }

    log::debug!(
        "Decision tables: {} option rows, {} students",
        options.len() - 1,
        decisions.len() - 1
    );
    DecisionTables { options, decisions }
}

/// Push both grids; the document rebuilds the tabs from them
pub async fn push_decisions(doc: &DocumentHandle<'_>, tables: &DecisionTables, tabs: &TabSettings) -> Result<Vec<RemoteCall>> {
    log::info!(
        "Pushing {} rows to '{}'",
        tables.options.len(),
        tabs.decision_options_name
    );
    let options_call = doc
        .refresh_decision_options(&tabs.decision_options_name, &tables.options)
        .await
        .with_context(|| format!("Failed to refresh '{}'", tabs.decision_options_name))?;

    log::info!("Pushing {} rows to '{}'", tables.decisions.len(), tabs.decision_name);
    let decisions_call = doc
        .refresh_decisions(&tabs.decision_name, &tabs.decision_options_name, &tables.decisions)
        .await
        .with_context(|| format!("Failed to refresh '{}'", tabs.decision_name))?;

    Ok(vec![options_call, decisions_call])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryDocument;
    use crate::config::Settings;
    use crate::enrich::rates::{MINORITY_RATE, OVERALL_RATE};
    use crate::table::Table;

    const EXAMPLE: &str = include_str!("../../settings/settings.example.toml");

    struct Fixture {
        settings: Settings,
        roster: IndexedTable,
        colleges: IndexedTable,
        bumps: BumpList,
        live: LiveTables,
    }

    fn fixture() -> Fixture {
        let settings = Settings::parse(EXAMPLE).unwrap();
        let roster = IndexedTable::new(
            Table::from_rows(
                ["StudentID", "LastFirst", "Race/ Eth", "Target Grad Rate"],
                vec![
                    vec![Value::Int(1001), Value::from("Doe, Jane"), Value::from("H"), Value::Float(0.7)],
                    vec![Value::Int(1002), Value::from("Roe, Rick"), Value::from("W"), Value::Null],
                ],
            ),
            "StudentID",
        );
        let colleges = IndexedTable::new(
            Table::from_rows(
                ["UNITID", OVERALL_RATE, MINORITY_RATE],
                vec![vec![Value::Int(5001), Value::Float(0.8), Value::Float(0.6)]],
            ),
            "UNITID",
        );
        let bumps = BumpList::default();

        let f = &settings.decision_option_fields;
        let award = Table::from_rows(
            [
                f.sid.as_str(),
                f.nces.as_str(),
                f.home.as_str(),
                f.college.as_str(),
                f.result_code.as_str(),
                f.out_of_pocket.as_str(),
                f.student_loans.as_str(),
                f.grants.as_str(),
                "Notes",
            ],
            vec![
                vec![
                    Value::Int(1001),
                    Value::Int(5001),
                    Value::from("Home"),
                    Value::from("City College--At Home"),
                    Value::from("CHOICE!"),
                    Value::Int(2000),
                    Value::Int(7500),
                    Value::Int(4000),
                    Value::from("called"),
                ],
                vec![
                    Value::Int(1001),
                    Value::Int(5009),
                    Value::from("Home"),
                    Value::from("Denied U--At Home"),
                    Value::from("Denied"),
                    Value::Null,
                    Value::Null,
                    Value::Null,
                    Value::Null,
                ],
                vec![
                    Value::Int(1001),
                    Value::Int(5002),
                    Value::from("Home"),
                    Value::from("Acme State--At Home"),
                    Value::from(""),
                    Value::from(""),
                    Value::from(""),
                    Value::from(""),
                    Value::Null,
                ],
            ],
        );
        let summary = Table::from_rows(
            ["StudentID", "LastFirst"],
            vec![
                vec![Value::Int(1001), Value::from("Doe, Jane")],
                vec![Value::Int(1002), Value::from("Roe, Rick")],
            ],
        );

        Fixture {
            settings,
            roster,
            colleges,
            bumps,
            live: LiveTables {
                summary,
                award,
                decision: None,
            },
        }
    }

    fn build(f: &Fixture) -> DecisionTables {
        let config = f.settings.for_campus("North").unwrap();
        let ctx = DecisionContext {
            roster: &f.roster,
            colleges: &f.colleges,
            bumps: &f.bumps,
            rules: &f.settings.enrichment,
            fields: &f.settings.decision_option_fields,
            defaults: &config.decision_defaults,
            index_field: "StudentID",
        };
        build_decision_tables(&f.live, &ctx, config.tabs.decision_options_header_row)
    }

    #[test]
    fn test_option_blocks_and_row_numbers() {
        let f = fixture();
        let tables = build(&f);

        // 1001: blank, Acme State, City College, two defaults; 1002: blank, two defaults
        assert_eq!(tables.options.len(), 1 + 5 + 3);
        assert_eq!(tables.options[0], header(OPTIONS_HEADER));
        assert_eq!(tables.options[2][1], Value::from("Acme State--At Home"));
        assert_eq!(tables.options[3][1], Value::from("City College--At Home"));
        assert_eq!(tables.options[4][1], Value::from("Community college"));

        assert_eq!(tables.decisions.len(), 3);
        assert_eq!(tables.decisions[1][2], Value::Int(2));
        assert_eq!(tables.decisions[1][3], Value::Int(6));
        assert_eq!(tables.decisions[2][2], Value::Int(7));
        assert_eq!(tables.decisions[2][3], Value::Int(9));
    }

    #[test]
    fn test_option_values() {
        let f = fixture();
        let tables = build(&f);

        let city = &tables.options[3];
        assert_eq!(city[2], Value::from("CHOICE!"));
        // Hispanic student uses the minority rate
        assert_eq!(city[3], Value::Float(0.6));
        assert_eq!(city[4], Value::Float(3500.0));
        assert_eq!(city[5], Value::Int(4000));

        let acme = &tables.options[2];
        assert_eq!(acme[2], Value::from("TBD"));
        assert_eq!(acme[3], Value::from("TBD"));
        assert_eq!(acme[4], Value::from("TBD"));
        assert_eq!(acme[5], Value::from("N/A"));
    }

    #[test]
    fn test_decision_rows() {
        let f = fixture();
        let tables = build(&f);

        assert_eq!(tables.decisions[1][4], Value::from("City College--At Home"));
        assert_eq!(tables.decisions[1][5], Value::Float(0.7));
        assert_eq!(tables.decisions[2][4], Value::from(""));
        assert_eq!(tables.decisions[2][5], Value::from("TBD"));
    }

    #[tokio::test]
    async fn test_push_both_tabs() {
        let f = fixture();
        let tables = build(&f);
        let config = f.settings.for_campus("North").unwrap();
        let doc = MemoryDocument::new();
        let handle = DocumentHandle::new(&doc, "doc-1");

        let calls = push_decisions(&handle, &tables, &config.tabs).await.unwrap();
        assert_eq!(calls.len(), 2);

        let functions: Vec<String> = doc.calls().into_iter().map(|(f, _)| f).collect();
        assert_eq!(functions, vec!["refreshDecisionOptions", "refreshDecisions"]);
        assert_eq!(doc.table(&config.tabs.decision_name).unwrap().len(), 2);
    }
}
