//! The pre-cache command.

use std::path::PathBuf;
use std::time::Duration;

use fast_jsonl::{precache_with_progress, CacheConfig, PrecacheReport};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::CliError;
use crate::Args;

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Run the command described by `args`.
pub fn run(args: &Args) -> Result<(), CliError> {
    let config = args.cache_config()?;
    tracing::info!(
        files = args.files.len(),
        threads = args.threads,
        naming = %config.naming,
        "Starting pre-cache run"
    );

    let reports = precache_files(&args.files, args.threads, args.verbose, &config)?;

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        tracing::warn!(failed, total = reports.len(), "Pre-cache run finished with failures");
        return Err(CliError::Failed(failed));
    }
    tracing::info!(total = reports.len(), "Pre-cache run complete");
    Ok(())
}

/// Pre-cache `files`, printing per-file lines or driving a progress bar.
pub fn precache_files(
    files: &[PathBuf],
    threads: usize,
    verbose: bool,
    config: &CacheConfig,
) -> Result<Vec<PrecacheReport>, CliError> {
    if verbose {
        return Ok(precache_with_progress(
            files,
            threads,
            config,
            |report, completed, total| println!("{}", status_line(report, completed, total)),
        )?);
    }

    let bar = progress_bar(files.len() as u64);
    let reports = precache_with_progress(files, threads, config, |report, _, _| {
        if let Err(e) = &report.outcome {
            bar.println(format!("{}: {}", report.path.display(), e));
        }
        bar.inc(1);
    });
    bar.finish_and_clear();
    Ok(reports?)
}

/// The verbose-mode line for one finished file.
pub fn status_line(report: &PrecacheReport, completed: usize, total: usize) -> String {
    match &report.outcome {
        Ok(_) => format!("({}/{}) Caching completed successfully.", completed, total),
        Err(e) => format!("({}/{}) Caching failed with: {}", completed, total, e),
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
