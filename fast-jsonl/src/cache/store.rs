//! Building, persisting, loading, and validating cache artifacts.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::hashing::digest_file;
use crate::naming::{resolve_posix, PathDeriver};
use crate::scanner::scan;

use super::artifact::{CacheArtifact, CacheMeta};

/// Source modification time in seconds since UNIX_EPOCH.
pub fn mtime(path: &Path) -> Result<f64> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| Error::io(path, e))?;

    Ok(modified
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0))
}

/// Capture path, modification time, and content hash of `path`.
pub fn compute_metadata(path: &Path) -> Result<CacheMeta> {
    Ok(CacheMeta {
        path: resolve_posix(path)?,
        mtime: mtime(path)?,
        hash: digest_file(path)?,
    })
}

/// Scan `path` into a fresh artifact.
///
/// Metadata is taken before the scan so that a write racing with the scan
/// leaves the artifact looking older than the file, never newer.
pub fn build(path: &Path) -> Result<CacheArtifact> {
    let meta = compute_metadata(path)?;
    let lines = scan(path)?;
    Ok(CacheArtifact { meta, lines })
}

/// Write `artifact` to `cache_path`, replacing any existing file.
///
/// The document is written to a uniquely named temp file in the cache
/// directory and renamed into place, so a concurrent reader sees either the
/// old artifact or the complete new one. No pre-existing file other than
/// `cache_path` is ever opened for writing.
pub fn persist(artifact: &CacheArtifact, cache_path: &Path) -> Result<()> {
    let dir = match cache_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let temp = tempfile::Builder::new()
        .prefix(".fj-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| Error::io(dir, e))?;
    let temp_path = temp.path().to_path_buf();

    let mut writer = BufWriter::new(temp);
    serde_json::to_writer(&mut writer, artifact).map_err(|e| Error::Io {
        path: temp_path.clone(),
        source: e.into(),
    })?;
    writer.flush().map_err(|e| Error::io(&temp_path, e))?;
    let temp = writer
        .into_inner()
        .map_err(|e| Error::io(&temp_path, e.into_error()))?;

    temp.persist(cache_path)
        .map_err(|e| Error::io(cache_path, e.error))?;

    tracing::debug!(
        path = %cache_path.display(),
        records = artifact.len(),
        "Persisted JSONL cache"
    );

    Ok(())
}

/// Read the artifact stored at `cache_path`.
///
/// # Errors
///
/// Returns [`Error::CacheCorrupt`] if the file is not a valid artifact
/// (including an index with gaps or decreasing offsets).
pub fn load(cache_path: &Path) -> Result<CacheArtifact> {
    let file = File::open(cache_path).map_err(|e| Error::io(cache_path, e))?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|e| {
        if e.is_io() {
            Error::Io {
                path: cache_path.to_path_buf(),
                source: e.into(),
            }
        } else {
            Error::CacheCorrupt {
                path: cache_path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    })
}

/// True if a cache file exists at `cache_path`.
pub fn exists(cache_path: &Path) -> bool {
    cache_path.is_file()
}

/// True if a cache file exists at the derived cache path of `source`.
pub fn exists_for_source(source: &Path, deriver: &PathDeriver) -> Result<bool> {
    Ok(exists(&deriver.cache_path(source)?))
}

/// True if the artifact is at least as new as the source file.
pub fn time_valid(source: &Path, artifact: &CacheArtifact) -> Result<bool> {
    Ok(artifact.meta.mtime >= mtime(source)?)
}

/// True if the artifact's content hash matches the source file.
///
/// Re-reads the entire source file.
pub fn hash_valid(source: &Path, artifact: &CacheArtifact) -> Result<bool> {
    Ok(artifact.meta.hash == digest_file(source)?)
}
