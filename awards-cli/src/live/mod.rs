//! The live document as last read, and its on-disk copies

pub mod backup;
pub mod combine;
pub mod doclist;
pub mod reader;

pub use backup::BackupStore;
pub use combine::combine_campuses;
pub use doclist::DocList;
pub use reader::read_current_doc;

use crate::table::Table;

/// The three document tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveTab {
    Summary,
    Award,
    Decision,
}

impl LiveTab {
    pub const ALL: [LiveTab; 3] = [LiveTab::Summary, LiveTab::Award, LiveTab::Decision];

    /// Name used in backup file names
    pub fn file_key(&self) -> &'static str {
        match self {
            LiveTab::Summary => "efc",
            LiveTab::Award => "award",
            LiveTab::Decision => "decision",
        }
    }
}

impl std::fmt::Display for LiveTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_key())
    }
}

/// Snapshot of one campus document
#[derive(Debug, Clone, Default)]
pub struct LiveTables {
    pub summary: Table,
    pub award: Table,
    /// Absent until decisions have been pushed at least once
    pub decision: Option<Table>,
}

impl LiveTables {
    pub fn get(&self, tab: LiveTab) -> Option<&Table> {
        match tab {
            LiveTab::Summary => Some(&self.summary),
            LiveTab::Award => Some(&self.award),
            LiveTab::Decision => self.decision.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.award.is_empty() && self.decision.is_none()
    }
}
