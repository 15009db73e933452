//! Where each report column takes its values from

use std::str::FromStr;

use crate::config::ReportColumnSetting;

/// Source of a report column's values.
///
/// Written in settings as a live column name, `INDEX`, or one of the
/// prefixed forms `ROSTER:[key column:]field`, `COLLEGE:key column:field`,
/// `APPS:field` and `SPECIAL:args...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    /// A column of the live tab, copied as is
    Live(String),
    /// The student id
    Index,
    /// Roster field of the student named by `key` (the student id when `None`)
    Roster { key: Option<String>, field: String },
    /// College table field of the institution in live column `key`
    College { key: String, field: String },
    /// Application field for the row's (institution, student) pair
    Apps { field: String },
    /// Computed from other report columns of the same row
    Special(Vec<String>),
}

impl ColumnSource {
    pub fn is_special(&self) -> bool {
        matches!(self, ColumnSource::Special(_))
    }
}

/// Error parsing a report column source
#[derive(Debug, Clone, PartialEq)]
pub enum ReportColumnError {
    UnknownPrefix { column: String, prefix: String },
    MissingField { column: String, source: String },
}

impl std::fmt::Display for ReportColumnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportColumnError::UnknownPrefix { column, prefix } => {
                write!(f, "Report column '{}' has an unknown source type '{}'", column, prefix)
            }
            ReportColumnError::MissingField { column, source } => {
                write!(f, "Report column '{}' source '{}' does not name a field", column, source)
            }
        }
    }
}

impl std::error::Error for ReportColumnError {}

impl FromStr for ColumnSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "INDEX" {
            return Ok(ColumnSource::Index);
        }
        let Some((prefix, rest)) = s.split_once(':') else {
            return Ok(ColumnSource::Live(s.to_string()));
        };

        let tokens: Vec<&str> = rest.split(':').collect();
        let non_empty = |t: &&str| !t.is_empty();

        match prefix {
            "SPECIAL" => Ok(ColumnSource::Special(tokens.iter().map(|t| t.to_string()).collect())),
            "ROSTER" => match tokens.as_slice() {
                [field] if non_empty(field) => Ok(ColumnSource::Roster {
                    key: None,
                    field: field.to_string(),
                }),
                [key, field] if non_empty(key) && non_empty(field) => Ok(ColumnSource::Roster {
                    key: Some(key.to_string()),
                    field: field.to_string(),
                }),
                _ => Err(String::new()),
            },
            "COLLEGE" => match tokens.as_slice() {
                [key, field] if non_empty(key) && non_empty(field) => Ok(ColumnSource::College {
                    key: key.to_string(),
                    field: field.to_string(),
                }),
                _ => Err(String::new()),
            },
            "APPS" => match tokens.last() {
                Some(field) if non_empty(field) => Ok(ColumnSource::Apps {
                    field: field.to_string(),
                }),
                _ => Err(String::new()),
            },
            other => Err(other.to_string()),
        }
    }
}

/// A parsed report column
#[derive(Debug, Clone, PartialEq)]
pub struct ReportColumn {
    pub name: String,
    pub source: ColumnSource,
}

impl ReportColumn {
    /// Helper columns feed other columns and are left out of the output
    pub fn is_helper(&self) -> bool {
        self.name.starts_with('x')
    }
}

pub fn parse_columns(settings: &[ReportColumnSetting]) -> Result<Vec<ReportColumn>, ReportColumnError> {
    settings
        .iter()
        .map(|s| {
            let source = s.source.parse::<ColumnSource>().map_err(|prefix| {
                if prefix.is_empty() {
                    ReportColumnError::MissingField {
                        column: s.column.clone(),
                        source: s.source.clone(),
                    }
                } else {
                    ReportColumnError::UnknownPrefix {
                        column: s.column.clone(),
                        prefix,
                    }
                }
            })?;
            Ok(ReportColumn {
                name: s.column.clone(),
                source,
            })
        })
        .collect()
}
