use anyhow::{Context, Result};
use clap::Parser;
use cosechar::{
    cli::{Cli, OutputFormat},
    config::Config,
    csv_output, json_output, scan,
    summary::{self, FrameworkSummary},
};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Harvest one framework/test-type pair, absorbing soft rejections.
///
/// Returns `None` when the pair is skipped (unverified, incomplete, failure
/// sentinel, no selectable trial) and logs fatal per-file failures without
/// aborting the batch.
fn harvest_pair(
    test_type: &str,
    framework: &str,
    files: &scan::TestFiles,
    failures: &mut usize,
) -> Option<FrameworkSummary> {
    if !files.is_complete() {
        tracing::debug!(framework, test_type, "skipping: result files incomplete");
        return None;
    }
    let verification = files.verification.as_deref()?;
    let raw_path = files.raw.as_deref()?;
    let stats_path = files.stats.as_deref()?;

    match scan::is_verified(verification) {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(framework, test_type, "skipping: verification failed");
            return None;
        }
        Err(err) => {
            tracing::error!(framework, test_type, "verification unreadable: {err:#}");
            *failures += 1;
            return None;
        }
    }

    let raw_text = match std::fs::read_to_string(raw_path) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(framework, test_type, "cannot read {}: {err}", raw_path.display());
            *failures += 1;
            return None;
        }
    };
    let stats_text = match std::fs::read_to_string(stats_path) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(framework, test_type, "cannot read {}: {err}", stats_path.display());
            *failures += 1;
            return None;
        }
    };

    match summary::summarize_framework(
        framework,
        &raw_text,
        &stats_text,
        &raw_path.display().to_string(),
        &stats_path.display().to_string(),
    ) {
        Ok(result) => result,
        Err(err) => {
            // Aborts this file only, never the batch
            tracing::error!(framework, test_type, "extraction failed: {err}");
            *failures += 1;
            None
        }
    }
}

fn write_output(
    out_dir: &Path,
    test_type: &str,
    summaries: &[FrameworkSummary],
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    let (extension, content) = match format {
        OutputFormat::Json => ("json", json_output::to_json(summaries, pretty)?),
        OutputFormat::Csv => ("csv", csv_output::to_csv(summaries)),
    };

    let path = out_dir.join(format!("{test_type}.{extension}"));
    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    println!("{test_type}: {} frameworks -> {}", summaries.len(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    let test_types: Vec<String> = match &args.test_type {
        Some(test_type) => {
            if !config.test_types.contains(test_type) {
                anyhow::bail!(
                    "unknown test type {:?}; configured types: {}",
                    test_type,
                    config.test_types.join(", ")
                );
            }
            vec![test_type.clone()]
        }
        None => config.test_types.clone(),
    };

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating output directory {}", args.out_dir.display()))?;

    let results = scan::scan_results_dir(&args.results_dir, &test_types)?;

    let mut failures = 0usize;
    for (test_type, frameworks) in &results {
        let summaries: Vec<FrameworkSummary> = frameworks
            .iter()
            .filter_map(|(framework, files)| {
                harvest_pair(test_type, framework, files, &mut failures)
            })
            .collect();

        write_output(&args.out_dir, test_type, &summaries, args.format, args.pretty)?;
    }

    if failures > 0 {
        eprintln!("{failures} file(s) failed extraction; rerun with --debug for details");
    }
    Ok(())
}
