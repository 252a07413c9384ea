//! Batch pre-caching of many JSONL files.
//!
//! Builds (or validates) the cache of every listed file ahead of time so that
//! later readers open instantly. With more than one thread the files are
//! spread over a dedicated rayon pool; same-path work is still serialized by
//! the per-cache lock inside [`cache_init`], distinct paths run in parallel.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::cache::cache_init;
use crate::config::{CacheConfig, StalenessPolicy};
use crate::error::{Error, Result};

/// Outcome of pre-caching one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecacheReport {
    /// Source path as given.
    pub path: PathBuf,
    /// Record count on success, rendered error otherwise.
    pub outcome: std::result::Result<usize, String>,
}

impl PrecacheReport {
    /// True if the cache was built or reused.
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Pre-cache `paths` using `threads` workers.
///
/// Equivalent to [`precache_with_progress`] with a no-op callback.
pub fn precache(
    paths: &[PathBuf],
    threads: usize,
    config: &CacheConfig,
) -> Result<Vec<PrecacheReport>> {
    precache_with_progress(paths, threads, config, |_, _, _| {})
}

/// Pre-cache `paths`, reporting each completion.
///
/// `threads <= 1` runs on the caller's thread. Reports are returned in input
/// order; `on_complete(report, completed, total)` fires in completion order,
/// one call at a time, with `completed` counting up from 1.
///
/// Per-file failures are captured in the reports. The function itself only
/// fails if the thread pool cannot be created.
pub fn precache_with_progress<F>(
    paths: &[PathBuf],
    threads: usize,
    config: &CacheConfig,
    on_complete: F,
) -> Result<Vec<PrecacheReport>>
where
    F: Fn(&PrecacheReport, usize, usize) + Sync,
{
    let total = paths.len();
    let completed = Mutex::new(0usize);

    let run_one = |path: &PathBuf| {
        let report = precache_one(path, config);
        let mut count = completed.lock();
        *count += 1;
        on_complete(&report, *count, total);
        report
    };

    if threads <= 1 {
        debug!(files = total, "Pre-caching sequentially");
        return Ok(paths.iter().map(run_one).collect());
    }

    debug!(files = total, threads, "Pre-caching in parallel");
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("fj-precache-{}", i))
        .build()
        .map_err(|e| Error::InvalidConfig(format!("failed to start thread pool: {}", e)))?;

    Ok(pool.install(|| paths.par_iter().map(run_one).collect()))
}

fn precache_one(path: &Path, config: &CacheConfig) -> PrecacheReport {
    let outcome = match cache_init(path, None, StalenessPolicy::default(), config) {
        Ok(artifact) => Ok(artifact.len()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Pre-caching failed");
            Err(e.to_string())
        }
    };
    PrecacheReport {
        path: path.to_path_buf(),
        outcome,
    }
}
