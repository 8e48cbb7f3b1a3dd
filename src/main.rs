//! AE Analyzer - acceleration enrichment event detection for ECU datalogs
//!
//! Loads each datalog given on the command line, detects AE events with the
//! configured thresholds and prints a summary per file.

use anyhow::{bail, Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use ae_analyzer::analysis::ae::{AccelEnrichmentAnalyzer, AeAnalysis};
use ae_analyzer::analysis::Analyzer;
use ae_analyzer::args::Cli;
use ae_analyzer::columns::ColumnSelection;
use ae_analyzer::config::{DetectionConfig, DetectionParams};
use ae_analyzer::parsers::{self, Log};
use ae_analyzer::report::{detection_summary, event_title, EventCursor, EventWindow, FileReport};
use ae_analyzer::settings::AnalyzerSettings;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        tracing::error!("Error: {:#}", e);
        process::exit(1);
    }
}

/// A loaded log together with its detection results
struct Analyzed {
    path: PathBuf,
    log: Log,
    analysis: AeAnalysis,
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = AnalyzerSettings::load();
    let params = cli.detection_params(settings.detection);
    params.validate().context("Invalid detection parameters")?;

    if cli.save_settings {
        settings.detection = params;
        let path = settings.save().context("Failed to save settings")?;
        tracing::info!("Detection thresholds saved to {:?}", path);
    }

    let overrides = cli.column_overrides();
    let results: Vec<(PathBuf, Result<Analyzed>)> = cli
        .files
        .par_iter()
        .map(|path| (path.clone(), analyze_file(path, &overrides, params)))
        .collect();

    let mut analyzed = Vec::with_capacity(results.len());
    let mut failures = 0;
    for (path, result) in results {
        match result {
            Ok(file) => analyzed.push(file),
            Err(e) => {
                failures += 1;
                tracing::error!("{}: {:#}", path.display(), e);
            }
        }
    }

    if cli.json {
        let reports: Vec<FileReport> = analyzed.into_iter().map(file_report).collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for file in &analyzed {
            print_text(file, cli.show_event);
        }
    }

    if failures > 0 {
        bail!("{} of {} file(s) failed", failures, cli.files.len());
    }
    Ok(())
}

fn analyze_file(path: &Path, overrides: &ColumnSelection, params: DetectionParams) -> Result<Analyzed> {
    let log = parsers::load_file(path).with_context(|| format!("Failed to load {:?}", path))?;
    tracing::debug!(
        "{:?}: {} channels, {} rows",
        path,
        log.channels.len(),
        log.row_count()
    );

    let config = DetectionConfig::for_columns(&log.channel_names(), overrides, params);
    let analysis = AccelEnrichmentAnalyzer::new(config)
        .analyze(&log)
        .with_context(|| format!("Failed to analyze {:?}", path))?;

    Ok(Analyzed {
        path: path.to_path_buf(),
        log,
        analysis,
    })
}

fn file_report(file: Analyzed) -> FileReport {
    FileReport {
        file: file.path.display().to_string(),
        format: format_name(&file.log).to_string(),
        rows: file.log.row_count(),
        channels: file.log.channel_names(),
        analysis: file.analysis,
    }
}

fn format_name(log: &Log) -> &'static str {
    log.meta.format().map(|f| f.name()).unwrap_or("Unknown")
}

fn print_text(file: &Analyzed, show_event: Option<usize>) {
    let Analyzed {
        path,
        log,
        analysis,
    } = file;

    println!(
        "{} ({}, {} rows)",
        path.display(),
        format_name(log),
        log.row_count()
    );
    println!("  {}", detection_summary(analysis));

    let total = analysis.events.len();
    for (i, event) in analysis.events.iter().enumerate() {
        println!("  {}", event_title(i, total, event));
    }

    if let Some(n) = show_event {
        let mut cursor = EventCursor::new(total);
        match n.checked_sub(1).and_then(|i| cursor.seek(i)) {
            Some(index) => match EventWindow::extract(log, analysis, &analysis.events[index]) {
                Ok(window) => {
                    println!();
                    println!("{}", event_title(index, total, &analysis.events[index]));
                    print!("{}", window.to_table());
                }
                Err(e) => tracing::warn!("{}: {}", path.display(), e),
            },
            None => tracing::warn!(
                "{}: no event {} (found {})",
                path.display(),
                n,
                total
            ),
        }
    }
    println!();
}
