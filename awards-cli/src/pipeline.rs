//! Step sequence for one campus run
//!
//! [`PipelineContext`] starts with only the settings and fills in the roster,
//! local tables and live mirror as steps need them. [`run_mode`] strings the
//! steps together for each [`Mode`].

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use colored::*;

use crate::api::{DocumentHandle, ScriptService, create_document};
use crate::build::{LocalTables, build_local_tables, index_roster};
use crate::cli::Mode;
use crate::config::{CampusConfig, Settings};
use crate::decisions::{DecisionContext, build_decision_tables, push_decisions};
use crate::enrich::enrich_roster;
use crate::live::{BackupStore, DocList, LiveTables, combine_campuses, read_current_doc};
use crate::loader::SourceTables;
use crate::report::{self, ReportSources, ReportTables};
use crate::sync::{SyncReport, sync_document};
use crate::table::IndexedTable;

/// Everything one campus run has loaded so far
pub struct PipelineContext<'a> {
    settings: &'a Settings,
    config: CampusConfig,
    store: BackupStore,
    doclist: DocList,
    service: Option<&'a dyn ScriptService>,
    sources: Option<&'a SourceTables>,
    roster: Option<IndexedTable>,
    local: Option<LocalTables>,
    live: Option<LiveTables>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        settings: &'a Settings,
        campus: &str,
        service: Option<&'a dyn ScriptService>,
        sources: Option<&'a SourceTables>,
    ) -> Result<Self> {
        let config = settings
            .for_campus(campus)
            .with_context(|| format!("No usable settings for campus {}", campus))?;
        let doclist = DocList::read(&settings.inputs.key_file)?;

        Ok(Self {
            settings,
            config,
            store: BackupStore::from_folders(&settings.folders),
            doclist,
            service,
            sources,
            roster: None,
            local: None,
            live: None,
        })
    }

    pub fn campus(&self) -> &str {
        &self.config.campus
    }

    fn service(&self) -> Result<&'a dyn ScriptService> {
        self.service
            .ok_or_else(|| anyhow!("No document service configured for this run"))
    }

    fn sources(&self) -> Result<&'a SourceTables> {
        self.sources
            .ok_or_else(|| anyhow!("Source files were not loaded for this run"))
    }

    fn document(&self) -> Result<DocumentHandle<'a>> {
        let key = self.doclist.get(self.campus()).with_context(|| {
            format!(
                "No document for {} in {}",
                self.campus(),
                self.settings.inputs.key_file.display()
            )
        })?;
        Ok(DocumentHandle::new(self.service()?, key))
    }

    /// Filter and enrich the roster for this campus
    pub fn enrich(&mut self) -> Result<&IndexedTable> {
        if self.roster.is_none() {
            let sources = self.sources()?;
            let roster = enrich_roster(
                &sources.roster,
                self.campus(),
                &sources.roster_lookups(),
                &self.settings.enrichment,
            );
            self.roster = Some(index_roster(roster));
        }
        self.roster
            .as_ref()
            .ok_or_else(|| anyhow!("Roster is not loaded"))
    }

    pub fn build_local(&mut self) -> Result<()> {
        self.enrich()?;
        let (Some(sources), Some(roster)) = (self.sources, self.roster.as_ref()) else {
            return Err(anyhow!("Roster is not loaded"));
        };
        self.local = Some(build_local_tables(sources, roster, self.settings, &self.config));
        Ok(())
    }

    pub async fn read_live(&mut self) -> Result<()> {
        let doc = self.document()?;
        let live = read_current_doc(&doc, &self.config.tabs)
            .await
            .with_context(|| format!("Failed to read the live document for {}", self.campus()))?;
        self.live = Some(live);
        Ok(())
    }

    pub fn save_live(&self) -> Result<Vec<PathBuf>> {
        let live = self.live.as_ref().ok_or_else(|| anyhow!("Live document has not been read"))?;
        self.store.save(self.campus(), live)
    }

    /// Fall back to the on-disk backup when the document was not read this run
    fn ensure_live(&mut self) -> Result<()> {
        if self.live.is_none() {
            self.live = Some(self.store.load(self.campus())?);
        }
        Ok(())
    }

    pub async fn push_local(&mut self) -> Result<SyncReport> {
        self.ensure_live()?;
        let doc = self.document()?;
        let (Some(local), Some(live)) = (self.local.as_ref(), self.live.as_ref()) else {
            return Err(anyhow!("Local tables have not been built"));
        };

        let report = sync_document(&doc, local, live, self.settings.student_index_field(), &self.config)
            .await
            .with_context(|| format!("Sync failed for {}", self.campus()))?;
        report.print(self.campus());
        Ok(report)
    }

    /// Create a document for this campus unless it already has one
    pub async fn make_new(&mut self) -> Result<Option<String>> {
        let campus = self.campus().to_string();
        if let Some(existing) = self.doclist.get(&campus) {
            println!(
                "{}",
                format!("{} already has a document ({}), skipping", campus, existing).yellow()
            );
            return Ok(None);
        }
        let local = self.local.as_ref().ok_or_else(|| anyhow!("Local tables have not been built"))?;

        let key = write_new_doc(self.service()?, self.settings, &self.config, local).await?;
        DocList::add_and_save(&self.settings.inputs.key_file, &campus, &key)?;
        println!("Created document for {}: {}", campus.bright_green().bold(), key);
        self.doclist.insert(campus, key.as_str());
        Ok(Some(key))
    }

    pub async fn refresh_decisions(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.enrich()?;
        let doc = self.document()?;
        let sources = self.sources()?;
        let (Some(live), Some(roster)) = (self.live.as_ref(), self.roster.as_ref()) else {
            return Err(anyhow!("Live tables or roster missing"));
        };

        let ctx = DecisionContext {
            roster,
            colleges: &sources.colleges,
            bumps: &sources.bump_list,
            rules: &self.settings.enrichment,
            fields: &self.settings.decision_option_fields,
            defaults: &self.config.decision_defaults,
            index_field: self.settings.student_index_field(),
        };
        let tables = build_decision_tables(live, &ctx, self.config.tabs.decision_options_header_row);
        push_decisions(&doc, &tables, &self.config.tabs)
            .await
            .with_context(|| format!("Decision refresh failed for {}", self.campus()))?;
        Ok(())
    }

    fn report_tables(&mut self) -> Result<ReportTables> {
        self.ensure_live()?;
        self.enrich()?;
        let sources = self.sources()?;
        let (Some(live), Some(roster)) = (self.live.as_ref(), self.roster.as_ref()) else {
            return Err(anyhow!("Live tables or roster missing"));
        };

        let report_sources = ReportSources {
            roster,
            colleges: &sources.colleges,
            applications: &sources.applications,
            index_field: self.settings.student_index_field(),
        };
        report::build_report_tables(live, &report_sources, &self.settings.report, &self.config)
    }

    /// Write the report workbook; returns its path
    pub fn report(&mut self) -> Result<PathBuf> {
        let tables = self.report_tables()?;
        let path = report::workbook_path(self.settings, self.campus());
        report::create_workbook(&path, &tables, &self.settings.report)?;
        println!("Report for {} written to {}", self.campus().bright_green().bold(), path.display());
        Ok(path)
    }

    pub fn letters(&mut self) -> Result<Vec<PathBuf>> {
        let tables = self.report_tables()?;
        let report_settings = &self.settings.report;
        let written = report::write_letters(
            &report::letter_folder(self.settings, self.campus()),
            self.campus(),
            &tables.students,
            &tables.awards,
            report_settings,
            &report::ColumnFormats::new(&report_settings.formats),
        )?;
        println!("{} letters written for {}", written.len(), self.campus().bright_green().bold());
        Ok(written)
    }

    pub fn combine(&self) -> Result<Vec<PathBuf>> {
        combine_campuses(&self.store, &self.settings.campus_list, &self.settings.fields)
    }
}

/// Create the document, then write and format both tabs. Returns the new key.
pub async fn write_new_doc(
    service: &dyn ScriptService,
    settings: &Settings,
    config: &CampusConfig,
    local: &LocalTables,
) -> Result<String> {
    let title = format!("{} {}", config.campus, settings.remote.file_stem);
    let key = create_document(service, &title, &settings.remote.drive_folder)
        .await
        .with_context(|| format!("Failed to create '{}'", title))?;

    let doc = DocumentHandle::new(service, key.as_str());
    let tabs = &config.tabs;
    doc.write_tab(&tabs.efc_name, &local.summary.to_grid())
        .await
        .with_context(|| format!("Failed to write '{}'", tabs.efc_name))?;
    doc.format_summary_tab(&tabs.efc_name).await?;
    doc.write_tab(&tabs.award_name, &local.award.to_grid())
        .await
        .with_context(|| format!("Failed to write '{}'", tabs.award_name))?;
    doc.format_award_tab(&tabs.award_name).await?;

    Ok(key)
}

/// Run every step `mode` calls for, in order
pub async fn run_mode(ctx: &mut PipelineContext<'_>, mode: Mode) -> Result<()> {
    use Mode::*;

    if mode.reads_sources() {
        ctx.enrich()?;
    }
    if mode.builds_local() {
        ctx.build_local()?;
    }

    if matches!(mode, All | Save) {
        ctx.read_live().await?;
        ctx.save_live()?;
    }
    if matches!(mode, All | PushLocal) {
        ctx.push_local().await?;
    }
    if mode == MakeNew {
        ctx.make_new().await?;
    }
    if mode == Combine {
        ctx.combine()?;
    }
    if mode == All {
        ctx.read_live().await?;
    }
    if matches!(mode, All | RefreshDecisions) {
        ctx.refresh_decisions().await?;
    }
    if mode == All {
        ctx.read_live().await?;
        ctx.save_live()?;
    }
    if matches!(mode, All | Report) {
        ctx.report()?;
    }
    if mode == ReportSingle {
        ctx.letters()?;
    }
    Ok(())
}

/// Build a context for `campus` and run `mode` on it
pub async fn run_campus(
    settings: &Settings,
    campus: &str,
    mode: Mode,
    service: Option<&dyn ScriptService>,
    sources: Option<&SourceTables>,
) -> Result<()> {
    let mut ctx = PipelineContext::new(settings, campus, service, sources)?;
    run_mode(&mut ctx, mode).await
}
