//! CSV copies of the live tabs, archived before every overwrite

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{LiveTab, LiveTables};
use crate::config::{ALL_CAMPUSES, Folders};
use crate::enrich::roster_cols;
use crate::table::io::{CsvOptions, read_csv, write_csv};
use crate::table::{Table, Value};

/// Backup folder layout: `<folder>/<prefix>-<campus>-<tab>.csv`, with the
/// previous version copied to the archive folder first
#[derive(Debug, Clone)]
pub struct BackupStore {
    folder: PathBuf,
    archive: PathBuf,
    prefix: String,
}

impl BackupStore {
    pub fn new(folder: impl Into<PathBuf>, archive: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            archive: archive.into(),
            prefix: prefix.into(),
        }
    }

    pub fn from_folders(folders: &Folders) -> Self {
        Self::new(&folders.live_backup, &folders.live_archive, &folders.live_backup_prefix)
    }

    pub fn path(&self, campus: &str, tab: LiveTab) -> PathBuf {
        self.folder
            .join(format!("{}-{}-{}.csv", self.prefix, campus, tab.file_key()))
    }

    /// Write one table, archiving the file it replaces
    pub fn save_table(&self, campus: &str, tab: LiveTab, table: &Table) -> Result<PathBuf> {
        let path = self.path(campus, tab);
        std::fs::create_dir_all(&self.folder)
            .with_context(|| format!("Failed to create backup folder: {}", self.folder.display()))?;

        if path.is_file() {
            self.archive_file(&path)?;
        }

        write_csv(&path, table)?;
        log::info!("Saved {} rows to {}", table.len(), path.display());
        Ok(path)
    }

    fn archive_file(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(&self.archive)
            .with_context(|| format!("Failed to create archive folder: {}", self.archive.display()))?;
        let Some(name) = path.file_name() else {
            return Ok(());
        };
        let target = self.archive.join(name);
        std::fs::copy(path, &target).with_context(|| {
            format!("Failed to archive {} to {}", path.display(), target.display())
        })?;
        log::debug!("Archived {} to {}", path.display(), target.display());
        Ok(())
    }

    /// Save every tab present in the snapshot
    pub fn save(&self, campus: &str, live: &LiveTables) -> Result<Vec<PathBuf>> {
        LiveTab::ALL
            .iter()
            .filter_map(|&tab| live.get(tab).map(|table| (tab, table)))
            .map(|(tab, table)| self.save_table(campus, tab, table))
            .collect()
    }

    /// One saved tab, or `None` when it was never saved
    pub fn load_table(&self, campus: &str, tab: LiveTab) -> Result<Option<Table>> {
        let path = self.path(campus, tab);
        if !path.is_file() {
            log::debug!("{} does not exist", path.display());
            return Ok(None);
        }
        // Text such as "N/A" or "TBD" is data in the live tabs
        read_csv(&path, &CsvOptions::blank_only())
            .with_context(|| format!("Failed to read live backup {}", path.display()))
            .map(Some)
    }

    /// Read back what [`BackupStore::save`] wrote
    pub fn load(&self, campus: &str) -> Result<LiveTables> {
        log::info!("Reading local copy of live data for {}", campus);
        Ok(LiveTables {
            summary: self.load_table(campus, LiveTab::Summary)?.unwrap_or_default(),
            award: self.load_table(campus, LiveTab::Award)?.unwrap_or_default(),
            decision: self.load_table(campus, LiveTab::Decision)?,
        })
    }

    /// This campus's rows of the combined decision file
    pub fn load_all_decision(&self, campus: &str) -> Result<Option<Table>> {
        let Some(mut table) = self.load_table(ALL_CAMPUSES, LiveTab::Decision)? else {
            return Ok(None);
        };
        let wanted = Value::from(campus);
        table.retain(|r| r.get(roster_cols::CAMPUS) == &wanted);
        Ok(Some(table))
    }
}
