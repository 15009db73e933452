//! Settings file and per-campus resolution
//!
//! Settings live in a single TOML file. Keys that can differ between campuses
//! are tables keyed by campus name, with a `Standard` entry used for every
//! campus that has no override of its own.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::table::SortSpec;

/// Key used when a campus has no override
pub const STANDARD: &str = "Standard";
/// Key selecting the alternate award layout for campuses in `use_complex`
pub const COMPLEX: &str = "Complex";
/// Pseudo-campus meaning "every campus"
pub const ALL_CAMPUSES: &str = "All";

/// A setting keyed by campus with a `Standard` fallback
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct PerCampus<T>(BTreeMap<String, T>);

impl<T> Default for PerCampus<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<T: Clone> PerCampus<T> {
    /// Campus override if present, otherwise the `Standard` entry
    pub fn resolve(&self, campus: &str) -> Option<&T> {
        self.0.get(campus).or_else(|| self.0.get(STANDARD))
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.0.get(key)
    }

    fn require(&self, campus: &str, name: &str) -> Result<T> {
        self.resolve(campus)
            .cloned()
            .with_context(|| format!("Setting '{}' has neither a '{}' nor a '{}' entry", name, campus, STANDARD))
    }
}

impl<T: Clone + Default> PerCampus<T> {
    fn resolve_or_default(&self, campus: &str) -> T {
        self.resolve(campus).cloned().unwrap_or_default()
    }
}

/// Source file locations
#[derive(Debug, Clone, Deserialize)]
pub struct InputFiles {
    /// Campus → document key list
    pub key_file: PathBuf,
    pub current_applications: PathBuf,
    pub current_roster: PathBuf,
    pub strategies: PathBuf,
    pub targets: PathBuf,
    pub colleges: PathBuf,
    pub sat_to_act: PathBuf,
    pub bump_list: PathBuf,
}

/// Output and backup locations
#[derive(Debug, Clone, Deserialize)]
pub struct Folders {
    pub output: PathBuf,
    pub live_backup: PathBuf,
    pub live_archive: PathBuf,
    /// Prefix of every backup file name
    pub live_backup_prefix: String,
}

/// Column lists for sources and live tabs
#[derive(Debug, Clone, Deserialize)]
pub struct FieldLists {
    /// Summary tab columns; the first is the student id
    pub efc_tab_fields: Vec<String>,
    pub app_fields: Vec<String>,
    pub roster_fields: Vec<String>,
    pub live_efc_fields: Vec<String>,
    pub live_award_fields: Vec<String>,
    pub live_decision_fields: Vec<String>,
}

/// Remote document service connection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// URL of the script execution endpoint
    pub endpoint: String,
    /// Ceiling applied to every remote call
    pub timeout_secs: u64,
    /// Run the latest saved script rather than the deployed one
    pub dev_mode: bool,
    /// Environment variable holding the bearer token
    pub token_env: String,
    /// Fallback token file; defaults to `<config dir>/awards-cli/token`
    pub token_file: Option<PathBuf>,
    /// Drive folder new documents are created in
    pub drive_folder: String,
    /// Suffix of new document titles (`"<campus> <file_stem>"`)
    pub file_stem: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_secs: 300,
            dev_mode: true,
            token_env: "AWARDS_ACCESS_TOKEN".to_string(),
            token_file: None,
            drive_folder: String::new(),
            file_stem: "Award Letter Tracker".to_string(),
        }
    }
}

/// Constants used by the enrichment rules
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentRules {
    pub gpa_floor: f64,
    pub score_floor: f64,
    /// GPA at or above which split strategies use their `+` row
    pub split_gpa: f64,
    /// EFC value meaning "no need data"
    pub no_need_efc: i64,
    /// Race codes using the W/A target columns and the overall PGR
    pub majority_races: Vec<String>,
    /// Race codes using the minority grad rate for the final rate
    pub minority_rate_races: Vec<String>,
}

impl Default for EnrichmentRules {
    fn default() -> Self {
        Self {
            gpa_floor: 1.5,
            score_floor: 12.0,
            split_gpa: 3.0,
            no_need_efc: -1,
            majority_races: vec!["W".to_string(), "A".to_string()],
            minority_rate_races: vec!["B".to_string(), "H".to_string(), "M".to_string()],
        }
    }
}

/// Live document tab names and 1-based header rows
#[derive(Debug, Clone, Deserialize)]
pub struct TabSettings {
    pub efc_name: String,
    pub award_name: String,
    pub decision_name: String,
    pub decision_options_name: String,
    pub efc_header_row: usize,
    pub award_header_row: usize,
    pub decision_header_row: usize,
    pub decision_options_header_row: usize,
}

/// Remote write limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Largest number of rows sent in one insert call; 0 sends everything at once
    pub max_insert_rows: usize,
    /// When false, missing award rows are reported but not inserted
    pub allow_award_inserts: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_insert_rows: 250,
            allow_award_inserts: true,
        }
    }
}

/// Live award tab columns read by the decision refresh
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionOptionFields {
    pub sid: String,
    pub nces: String,
    pub home: String,
    pub college: String,
    pub result_code: String,
    pub out_of_pocket: String,
    pub student_loans: String,
    pub grants: String,
}

impl DecisionOptionFields {
    pub fn all(&self) -> [&str; 8] {
        [
            &self.sid,
            &self.nces,
            &self.home,
            &self.college,
            &self.result_code,
            &self.out_of_pocket,
            &self.student_loans,
            &self.grants,
        ]
    }
}

/// A standing option added for every student in the decisions tab
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DecisionDefault {
    pub label: String,
    pub pgr: f64,
}

/// One report column: the workbook header and where its values come from
#[derive(Debug, Clone, Deserialize)]
pub struct ReportColumnSetting {
    pub column: String,
    pub source: String,
}

/// Column names the summary sheet aggregates over
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    pub student_field: String,
    pub name_field: String,
    pub result_field: String,
    pub unique_field: String,
    pub award_field: String,
    pub accepted_labels: Vec<String>,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            student_field: "SID".to_string(),
            name_field: "Student".to_string(),
            result_field: "Result".to_string(),
            unique_field: "Unique".to_string(),
            award_field: "Award".to_string(),
            accepted_labels: vec!["CHOICE!".to_string(), "Accepted!".to_string()],
        }
    }
}

/// Workbook report layout
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSettings {
    pub filename: String,
    pub folder: PathBuf,
    pub award_fields: Vec<ReportColumnSetting>,
    pub student_fields: Vec<ReportColumnSetting>,
    #[serde(default)]
    pub award_sorts: PerCampus<Vec<SortSpec>>,
    #[serde(default)]
    pub student_sorts: PerCampus<Vec<SortSpec>>,
    /// Column name → Excel number format
    #[serde(default)]
    pub formats: BTreeMap<String, String>,
    #[serde(default)]
    pub summary: SummarySettings,
    /// Award report columns printed on each student letter; all when empty
    #[serde(default)]
    pub letter_fields: Vec<String>,
}

/// Everything read from the settings file
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub campus_list: Vec<String>,
    /// Campuses using the `Complex` award layout
    #[serde(default)]
    pub use_complex: Vec<String>,
    pub inputs: InputFiles,
    pub folders: Folders,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub enrichment: EnrichmentRules,
    pub fields: FieldLists,
    pub decision_option_fields: DecisionOptionFields,
    pub award_fields: PerCampus<Vec<String>>,
    pub award_sort: PerCampus<Vec<SortSpec>>,
    pub tabs: PerCampus<TabSettings>,
    pub app_status_to_include: PerCampus<Vec<String>>,
    #[serde(default)]
    pub decision_defaults: PerCampus<Vec<DecisionDefault>>,
    #[serde(default)]
    pub sync: PerCampus<SyncSettings>,
    pub report: ReportSettings,
}

/// Settings with every per-campus key resolved for one campus
#[derive(Debug, Clone)]
pub struct CampusConfig {
    pub campus: String,
    pub award_fields: Vec<String>,
    pub award_sort: Vec<SortSpec>,
    pub tabs: TabSettings,
    pub statuses_to_include: Vec<String>,
    pub decision_defaults: Vec<DecisionDefault>,
    pub sync: SyncSettings,
    pub report_award_sorts: Vec<SortSpec>,
    pub report_student_sorts: Vec<SortSpec>,
}

impl Settings {
    /// Load and validate a settings file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings = Self::parse(&text)
            .with_context(|| format!("Invalid settings file: {}", path.display()))?;
        log::debug!(
            "Loaded settings from {} ({} campuses)",
            path.display(),
            settings.campus_list.len()
        );
        Ok(settings)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text).context("Failed to parse TOML")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.campus_list.is_empty() {
            bail!("campus_list is empty");
        }
        if self.fields.efc_tab_fields.is_empty() {
            bail!("fields.efc_tab_fields must name at least the student id column");
        }
        if self.award_fields.get(STANDARD).is_none() {
            bail!("award_fields needs a '{}' entry", STANDARD);
        }
        if !self.use_complex.is_empty() && self.award_fields.get(COMPLEX).is_none() {
            bail!("use_complex is set but award_fields has no '{}' entry", COMPLEX);
        }
        Ok(())
    }

    /// Resolve every per-campus key for one campus
    pub fn for_campus(&self, campus: &str) -> Result<CampusConfig> {
        let layout = if self.use_complex.iter().any(|c| c == campus) {
            COMPLEX
        } else {
            STANDARD
        };

        Ok(CampusConfig {
            campus: campus.to_string(),
            award_fields: self.award_fields.require(layout, "award_fields")?,
            award_sort: self.award_sort.require(layout, "award_sort")?,
            tabs: self.tabs.require(campus, "tabs")?,
            statuses_to_include: self
                .app_status_to_include
                .require(campus, "app_status_to_include")?,
            decision_defaults: self.decision_defaults.resolve_or_default(campus),
            sync: self.sync.resolve_or_default(campus),
            report_award_sorts: self.report.award_sorts.resolve_or_default(campus),
            report_student_sorts: self.report.student_sorts.resolve_or_default(campus),
        })
    }

    /// The student id column of the summary tab
    pub fn student_index_field(&self) -> &str {
        // validated non-empty on load
        self.fields.efc_tab_fields.first().map(String::as_str).unwrap_or("StudentID")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = include_str!("../../settings/settings.example.toml");

    #[test]
    fn test_example_settings_parse() {
        let settings = Settings::parse(EXAMPLE).unwrap();
        assert!(!settings.campus_list.is_empty());
        assert_eq!(settings.student_index_field(), "StudentID");
        assert_eq!(settings.remote.timeout_secs, 300);
        assert_eq!(settings.enrichment.gpa_floor, 1.5);
    }

    #[test]
    fn test_campus_override_and_standard_fallback() {
        let settings = Settings::parse(EXAMPLE).unwrap();

        let north = settings.for_campus("North").unwrap();
        let south = settings.for_campus("South").unwrap();

        // South overrides the tab names and the sync switch
        assert_eq!(north.tabs.award_name, "Award data");
        assert_eq!(south.tabs.award_name, "Awards");
        assert!(north.sync.allow_award_inserts);
        assert!(!south.sync.allow_award_inserts);
        assert_eq!(north.statuses_to_include, south.statuses_to_include);
    }

    #[test]
    fn test_complex_layout_selection() {
        let settings = Settings::parse(EXAMPLE).unwrap();
        let standard = settings.for_campus("North").unwrap();
        let complex = settings.for_campus("South").unwrap();
        assert_eq!(standard.award_fields, settings.award_fields.get(STANDARD).unwrap().clone());
        assert_eq!(complex.award_fields, settings.award_fields.get(COMPLEX).unwrap().clone());
        assert_eq!(complex.award_sort.len(), 3);
        assert!(!complex.award_sort[1].ascending);
    }

    #[test]
    fn test_missing_standard_is_an_error() {
        let per: PerCampus<String> = PerCampus(BTreeMap::from([("North".to_string(), "x".to_string())]));
        assert_eq!(per.resolve("North"), Some(&"x".to_string()));
        assert!(per.require("South", "tabs").is_err());
    }

    #[test]
    fn test_empty_campus_list_rejected() {
        let broken = EXAMPLE.replacen("campus_list = [\"North\", \"South\"]", "campus_list = []", 1);
        assert!(Settings::parse(&broken).is_err());
    }
}
