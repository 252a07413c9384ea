//! Lock-guarded cache initialization.

use std::path::{Path, PathBuf};

use crate::config::{CacheConfig, StalenessPolicy};
use crate::error::{Error, Result};
use crate::lock::FileLock;
use crate::naming::resolve;

use super::artifact::CacheArtifact;
use super::store;

/// Resolved locations for one source file's cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    /// Where the artifact is stored.
    pub cache_path: PathBuf,
    /// Marker file serializing initializations of this artifact.
    pub lock_path: PathBuf,
}

impl CacheLocation {
    /// Resolve the cache and lock paths for `source`.
    ///
    /// The lock is chosen by [`FileLock::for_cache_path`] from the cache path
    /// alone, so a derived cache and the same file passed explicitly share
    /// one lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the cache path resolves to the
    /// source file itself.
    pub fn resolve(source: &Path, cache_path: Option<&Path>, config: &CacheConfig) -> Result<Self> {
        let cache_path = match cache_path {
            Some(cache_path) => cache_path.to_path_buf(),
            None => config.path_deriver().cache_path(source)?,
        };
        let location = Self {
            lock_path: FileLock::for_cache_path(&cache_path).path().to_path_buf(),
            cache_path,
        };

        if resolve(&location.cache_path)? == resolve(source)? {
            return Err(Error::InvalidConfig(format!(
                "the file path {} and cache path {} resolve to the same location",
                source.display(),
                location.cache_path.display()
            )));
        }

        Ok(location)
    }
}

/// Produce a valid cache artifact for `path`, reusing or rebuilding as the
/// policy dictates.
///
/// Runs entirely under the artifact's [`FileLock`], so at most one
/// initializer per cache path is active across threads and processes. The
/// returned artifact is exactly what is on disk when the lock is released.
///
/// 1. `force_cache`: rebuild and return.
/// 2. No artifact on disk: build.
/// 3. Otherwise load it.
/// 4. `check_cache_time` and the source is newer: rebuild.
/// 5. `check_cache_hash` and the content changed: rebuild.
///
/// # Errors
///
/// - [`Error::NotFound`] if `path` does not exist
/// - [`Error::InvalidConfig`] if the cache path is the source path
/// - [`Error::LockTimeout`] if `config.lock_timeout` elapses
/// - [`Error::Io`] / [`Error::CacheCorrupt`] for filesystem failures
pub fn cache_init(
    path: &Path,
    cache_path: Option<&Path>,
    policy: StalenessPolicy,
    config: &CacheConfig,
) -> Result<CacheArtifact> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let location = CacheLocation::resolve(path, cache_path, config)?;
    cache_init_at(path, &location, policy, config)
}

/// [`cache_init`] with an already resolved [`CacheLocation`].
pub fn cache_init_at(
    path: &Path,
    location: &CacheLocation,
    policy: StalenessPolicy,
    config: &CacheConfig,
) -> Result<CacheArtifact> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let lock = FileLock::new(&location.lock_path);
    let _guard = lock.acquire_with(config.lock_timeout)?;

    init_locked(path, &location.cache_path, policy)
}

fn init_locked(path: &Path, cache_path: &Path, policy: StalenessPolicy) -> Result<CacheArtifact> {
    if policy.force_cache {
        tracing::info!(path = %path.display(), "Rebuilding JSONL cache (forced)");
        return rebuild(path, cache_path);
    }

    let mut artifact = if store::exists(cache_path) {
        tracing::debug!(cache = %cache_path.display(), "Reusing existing JSONL cache");
        store::load(cache_path)?
    } else {
        tracing::info!(path = %path.display(), "Building JSONL cache");
        rebuild(path, cache_path)?
    };

    if policy.check_cache_time && !store::time_valid(path, &artifact)? {
        tracing::warn!(path = %path.display(), "JSONL cache older than source, rebuilding");
        artifact = rebuild(path, cache_path)?;
    }

    if policy.check_cache_hash && !store::hash_valid(path, &artifact)? {
        tracing::warn!(path = %path.display(), "JSONL cache hash mismatch, rebuilding");
        artifact = rebuild(path, cache_path)?;
    }

    Ok(artifact)
}

fn rebuild(path: &Path, cache_path: &Path) -> Result<CacheArtifact> {
    let artifact = store::build(path)?;
    store::persist(&artifact, cache_path)?;
    Ok(artifact)
}
