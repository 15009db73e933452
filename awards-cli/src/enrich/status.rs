//! Application status classification
//!
//! Rules are evaluated in order and the first match wins. Decision-code rules
//! come first, so an accepted application that is also waitlisted elsewhere
//! in the record still reads as accepted.

use crate::table::{Record, Value};

/// Final status of one application, as shown in the live document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppStatus {
    Denied,
    Choice,
    Accepted,
    GuaranteedTransfer,
    Waitlist,
    Deferred,
    Pending,
    Submitted,
    Interest,
    Unknown,
}

impl AppStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AppStatus::Denied => "Denied",
            AppStatus::Choice => "CHOICE!",
            AppStatus::Accepted => "Accepted!",
            AppStatus::GuaranteedTransfer => "Guar. Xfer",
            AppStatus::Waitlist => "Waitlist",
            AppStatus::Deferred => "Deferred",
            AppStatus::Pending => "Pending",
            AppStatus::Submitted => "Submitted",
            AppStatus::Interest => "Interest",
            AppStatus::Unknown => "?",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        ALL.iter().copied().find(|s| s.label() == label)
    }

    pub fn is_admitted(&self) -> bool {
        matches!(self, AppStatus::Choice | AppStatus::Accepted)
    }
}

impl std::fmt::Display for AppStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

const ALL: [AppStatus; 10] = [
    AppStatus::Denied,
    AppStatus::Choice,
    AppStatus::Accepted,
    AppStatus::GuaranteedTransfer,
    AppStatus::Waitlist,
    AppStatus::Deferred,
    AppStatus::Pending,
    AppStatus::Submitted,
    AppStatus::Interest,
    AppStatus::Unknown,
];

const ADMIT_CODES: [&str; 3] = ["accepted", "cond. accept", "summer admit"];
const SUBMITTED_STAGES: [&str; 3] = [
    "initial materials submitted",
    "mid-year submitted",
    "final submitted",
];

/// The application columns the rules look at
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationFacts {
    pub result_code: Option<String>,
    pub attending: Option<String>,
    pub waitlisted: bool,
    pub deferred: bool,
    pub stage: Option<String>,
    pub app_type: Option<String>,
}

/// Flags arrive as `1`, `1.0` or `"1"`
fn flag_set(value: &Value) -> bool {
    match value {
        Value::String(s) => s.trim() == "1",
        other => other.as_number() == Some(1.0),
    }
}

fn text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

impl ApplicationFacts {
    pub fn from_record(record: &Record<'_>) -> Self {
        Self {
            result_code: text(record.get("result_code")),
            attending: text(record.get("attending")),
            waitlisted: flag_set(record.get("waitlisted")),
            deferred: flag_set(record.get("deferred")),
            stage: text(record.get("stage")),
            app_type: text(record.get("type")),
        }
    }

    fn code_is(&self, code: &str) -> bool {
        self.result_code.as_deref() == Some(code)
    }

    fn admitted(&self) -> bool {
        self.result_code
            .as_deref()
            .is_some_and(|c| ADMIT_CODES.contains(&c))
    }
}

type Rule = fn(&ApplicationFacts) -> bool;

fn is_denied(f: &ApplicationFacts) -> bool {
    f.code_is("denied")
}

fn is_choice(f: &ApplicationFacts) -> bool {
    f.admitted() && f.attending.as_deref() == Some("yes")
}

fn is_accepted(f: &ApplicationFacts) -> bool {
    f.admitted()
}

fn is_guaranteed_transfer(f: &ApplicationFacts) -> bool {
    f.code_is("guar. transfer")
}

fn is_waitlisted(f: &ApplicationFacts) -> bool {
    f.waitlisted
}

fn is_deferred(f: &ApplicationFacts) -> bool {
    f.deferred
}

fn is_pending(f: &ApplicationFacts) -> bool {
    f.stage.as_deref() == Some("pending")
}

fn is_submitted(f: &ApplicationFacts) -> bool {
    f.stage
        .as_deref()
        .is_some_and(|s| SUBMITTED_STAGES.contains(&s))
}

fn is_interest(f: &ApplicationFacts) -> bool {
    f.app_type.as_deref() == Some("interest")
}

const RULES: &[(Rule, AppStatus)] = &[
    (is_denied, AppStatus::Denied),
    (is_choice, AppStatus::Choice),
    (is_accepted, AppStatus::Accepted),
    (is_guaranteed_transfer, AppStatus::GuaranteedTransfer),
    (is_waitlisted, AppStatus::Waitlist),
    (is_deferred, AppStatus::Deferred),
    (is_pending, AppStatus::Pending),
    (is_submitted, AppStatus::Submitted),
    (is_interest, AppStatus::Interest),
];

pub fn classify(facts: &ApplicationFacts) -> AppStatus {
    RULES
        .iter()
        .find(|(matches, _)| matches(facts))
        .map(|(_, status)| *status)
        .unwrap_or(AppStatus::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(code: &str) -> ApplicationFacts {
        ApplicationFacts {
            result_code: Some(code.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_decision_code_wins_over_later_rules() {
        let facts = ApplicationFacts {
            result_code: Some("accepted".to_string()),
            attending: Some("yes".to_string()),
            waitlisted: false,
            deferred: false,
            stage: Some("pending".to_string()),
            app_type: Some("interest".to_string()),
        };
        assert_eq!(classify(&facts), AppStatus::Choice);
    }

    #[test]
    fn test_accepted_and_waitlisted_is_accepted() {
        let facts = ApplicationFacts {
            waitlisted: true,
            ..facts("cond. accept")
        };
        assert_eq!(classify(&facts), AppStatus::Accepted);
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(classify(&facts("denied")), AppStatus::Denied);
        assert_eq!(classify(&facts("summer admit")), AppStatus::Accepted);
        assert_eq!(classify(&facts("guar. transfer")), AppStatus::GuaranteedTransfer);

        let waitlisted_and_deferred = ApplicationFacts {
            waitlisted: true,
            deferred: true,
            ..Default::default()
        };
        assert_eq!(classify(&waitlisted_and_deferred), AppStatus::Waitlist);

        let submitted = ApplicationFacts {
            stage: Some("mid-year submitted".to_string()),
            app_type: Some("interest".to_string()),
            ..Default::default()
        };
        assert_eq!(classify(&submitted), AppStatus::Submitted);

        let interest = ApplicationFacts {
            app_type: Some("interest".to_string()),
            ..Default::default()
        };
        assert_eq!(classify(&interest), AppStatus::Interest);
        assert_eq!(classify(&ApplicationFacts::default()), AppStatus::Unknown);
    }

    #[test]
    fn test_flags_from_record() {
        use crate::table::Table;

        let table = Table::from_rows(
            ["result_code", "waitlisted", "deferred"],
            vec![
                vec![Value::Null, Value::Float(1.0), Value::Null],
                vec![Value::Null, Value::from("0"), Value::from("1")],
            ],
        );
        let first = ApplicationFacts::from_record(&table.record(0).unwrap());
        let second = ApplicationFacts::from_record(&table.record(1).unwrap());
        assert_eq!(classify(&first), AppStatus::Waitlist);
        assert_eq!(classify(&second), AppStatus::Deferred);
    }

    #[test]
    fn test_labels_round_trip() {
        for status in ALL {
            assert_eq!(AppStatus::from_label(status.label()), Some(status));
        }
        assert_eq!(AppStatus::Unknown.to_string(), "?");
    }
}
