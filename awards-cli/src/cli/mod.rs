//! Command line arguments

pub mod handler;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::ALL_CAMPUSES;

pub use handler::run;

/// Which steps a run performs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Save, sync, refresh decisions and write the report
    #[default]
    All,
    /// Back up the live document to disk
    Save,
    /// Create a new document for campuses without one
    #[value(name = "make_new", alias = "make-new")]
    MakeNew,
    /// Sync the local tables into the live document
    #[value(name = "push_local", alias = "push-local")]
    PushLocal,
    /// Rebuild the decision tabs from the live award tab
    #[value(name = "refresh_decisions", alias = "refresh-decisions")]
    RefreshDecisions,
    /// Write the report workbook from the backup
    Report,
    /// Combine every campus backup into the All files
    Combine,
    /// Write one printable letter per student
    #[value(name = "report_single", alias = "report-single")]
    ReportSingle,
}

impl Mode {
    /// Modes that need the source files
    pub fn reads_sources(&self) -> bool {
        matches!(
            self,
            Mode::All | Mode::MakeNew | Mode::PushLocal | Mode::Report | Mode::RefreshDecisions | Mode::ReportSingle
        )
    }

    /// Modes that need freshly built local tables
    pub fn builds_local(&self) -> bool {
        matches!(self, Mode::All | Mode::MakeNew | Mode::PushLocal)
    }

    /// Modes that call the document service
    pub fn needs_remote(&self) -> bool {
        matches!(
            self,
            Mode::All | Mode::Save | Mode::MakeNew | Mode::PushLocal | Mode::RefreshDecisions
        )
    }

    /// Modes that run once over the combined data instead of per campus
    pub fn is_combined(&self) -> bool {
        matches!(self, Mode::Combine | Mode::Report | Mode::ReportSingle)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_possible_value() {
            Some(value) => write!(f, "{}", value.get_name()),
            None => write!(f, "{:?}", self),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "awards-cli", about = "Sync award letter trackers with student data", version)]
pub struct Cli {
    /// Settings file
    #[arg(long, short = 's', default_value = "settings/settings.toml")]
    pub settings: PathBuf,

    /// Campus to run, or All for every campus in the settings
    #[arg(long, short = 'c', default_value = ALL_CAMPUSES)]
    pub campus: String,

    /// Campuses to leave out of an All run
    #[arg(long, short = 'k', value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Only print warnings and errors
    #[arg(long, short = 'q')]
    pub quiet: bool,

    #[arg(long, short = 'm', value_enum, default_value_t = Mode::All)]
    pub mode: Mode,
}

impl Cli {
    /// Campuses this run covers, in settings order
    pub fn campuses(&self, campus_list: &[String]) -> Vec<String> {
        if self.mode == Mode::Combine {
            return vec![ALL_CAMPUSES.to_string()];
        }
        if self.campus != ALL_CAMPUSES || self.mode.is_combined() {
            return vec![self.campus.clone()];
        }
        campus_list
            .iter()
            .filter(|c| !self.skip.iter().any(|s| s.trim() == c.as_str()))
            .cloned()
            .collect()
    }
}
