//! Reconciling the live document with the local tables
//!
//! The local tables decide which rows exist; the document keeps every value
//! people typed into it. A cycle therefore only inserts missing rows, deletes
//! stale ones and rewrites the status cell of rows whose status moved.

pub mod batch;
pub mod diff;
pub mod engine;
pub mod payload;

pub use diff::{AwardDiff, KeyDiff, diff_award_rows, diff_keys, status_rows};
pub use engine::{SyncReport, sync_document};
