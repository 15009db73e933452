//! Runs the selected mode over every requested campus

use std::time::Instant;

use anyhow::{Context, Result};
use colored::*;

use super::{Cli, Mode};
use crate::api::{ScriptClient, ScriptService};
use crate::config::Settings;
use crate::loader::{SourceTables, read_sources};
use crate::pipeline::run_campus;

/// Print an aborted campus run with its full cause chain
fn print_failure(campus: &str, error: &anyhow::Error) {
    eprintln!("{} {}: {}", "Failed".red().bold(), campus.bold(), error);
    for cause in error.chain().skip(1) {
        eprintln!("  {} {}", "caused by:".dimmed(), cause);
    }
}

/// Run the mode for each campus in turn. A failing campus is reported and
/// the rest still run. Returns the number of campuses that failed.
pub async fn run(cli: Cli) -> Result<usize> {
    let settings = Settings::load(&cli.settings)?;
    let campuses = cli.campuses(&settings.campus_list);
    log::info!("Running {} for {}", cli.mode, campuses.join(", "));

    let client = if cli.mode.needs_remote() {
        Some(ScriptClient::from_config(&settings.remote).context("Failed to set up the document service")?)
    } else {
        None
    };
    let sources: Option<SourceTables> = if cli.mode.reads_sources() {
        Some(read_sources(&settings)?)
    } else {
        None
    };

    run_campuses(&settings, &campuses, cli.mode, client.as_ref().map(|c| c as &dyn ScriptService), sources.as_ref()).await
}

pub async fn run_campuses(
    settings: &Settings,
    campuses: &[String],
    mode: Mode,
    service: Option<&dyn ScriptService>,
    sources: Option<&SourceTables>,
) -> Result<usize> {
    let mut failures = 0;

    for campus in campuses {
        println!("{} {} ({})", "Processing".bold(), campus.bright_green().bold(), mode);
        let start = Instant::now();

        match run_campus(settings, campus, mode, service, sources).await {
            Ok(()) => println!(
                "Finished {} in {:.1}s",
                campus.bright_green(),
                start.elapsed().as_secs_f64()
            ),
            Err(e) => {
                failures += 1;
                print_failure(campus, &e);
            }
        }
    }

    if failures > 0 {
        println!(
            "{}",
            format!("{} of {} campuses failed", failures, campuses.len()).red().bold()
        );
    }
    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryDocument;
    use crate::live::DocList;

    const EXAMPLE: &str = include_str!("../../settings/settings.example.toml");

    #[tokio::test]
    async fn test_failing_campus_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::parse(EXAMPLE).unwrap();
        settings.inputs.key_file = dir.path().join("doclist.csv");
        settings.folders.live_backup = dir.path().join("live");
        settings.folders.live_archive = dir.path().join("live/archive");

        // Only South has a document
        DocList::add_and_save(&settings.inputs.key_file, "South", "doc-south").unwrap();
        let doc = MemoryDocument::new();

        let campuses = vec!["North".to_string(), "South".to_string()];
        let failures = run_campuses(&settings, &campuses, Mode::Save, Some(&doc), None)
            .await
            .unwrap();

        assert_eq!(failures, 1);
        assert_eq!(doc.calls_to("readDataTable"), 3);
        assert_eq!(doc.calls()[0].1[0], serde_json::json!("doc-south"));
    }
}
