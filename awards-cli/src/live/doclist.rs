//! Campus to document key list

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::table::io::{CsvOptions, read_csv, write_csv};
use crate::table::{Table, Value};

const CAMPUS_COLUMN: &str = "Campus";
const KEY_COLUMN: &str = "ss_key";

/// Which document belongs to which campus
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocList {
    keys: BTreeMap<String, String>,
}

impl DocList {
    /// Read the key file; a missing file is an empty list
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Document list {} does not exist yet", path.display());
            return Ok(Self::default());
        }

        let table = read_csv(path, &CsvOptions::blank_only())
            .with_context(|| format!("Failed to read document list: {}", path.display()))?;

        let keys = table
            .records()
            .filter(|r| !r.get(CAMPUS_COLUMN).is_blank() && !r.get(KEY_COLUMN).is_blank())
            .map(|r| (r.get(CAMPUS_COLUMN).to_string(), r.get(KEY_COLUMN).to_string()))
            .collect();
        Ok(Self { keys })
    }

    pub fn get(&self, campus: &str) -> Option<&str> {
        self.keys.get(campus).map(String::as_str)
    }

    pub fn contains(&self, campus: &str) -> bool {
        self.keys.contains_key(campus)
    }

    pub fn insert(&mut self, campus: impl Into<String>, key: impl Into<String>) {
        self.keys.insert(campus.into(), key.into());
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create folder: {}", parent.display()))?;
        }
        let table = Table::from_rows(
            [CAMPUS_COLUMN, KEY_COLUMN],
            self.keys
                .iter()
                .map(|(campus, key)| vec![Value::from(campus.as_str()), Value::from(key.as_str())]),
        );
        write_csv(path, &table)
    }

    /// Record a new campus document in the key file
    pub fn add_and_save(path: &Path, campus: &str, key: &str) -> Result<()> {
        let mut list = Self::read(path)?;
        list.insert(campus, key);
        list.save(path)?;
        log::info!("Saved document key for {} to {}", campus, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let list = DocList::read(&dir.path().join("doclist.csv")).unwrap();
        assert!(!list.contains("North"));
    }

    #[test]
    fn test_add_and_replace_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inputs/doclist.csv");

        DocList::add_and_save(&path, "North", "abc123").unwrap();
        DocList::add_and_save(&path, "South", "def456").unwrap();
        DocList::add_and_save(&path, "North", "xyz789").unwrap();

        let list = DocList::read(&path).unwrap();
        assert_eq!(list.get("North"), Some("xyz789"));
        assert_eq!(list.get("South"), Some("def456"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Campus,ss_key"));
    }
}
