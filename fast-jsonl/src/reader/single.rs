//! Cache-backed reader over one JSONL file.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::cache::{cache_init_at, CacheArtifact, CacheLocation};
use crate::config::{CacheConfig, ReaderOptions, StalenessPolicy};
use crate::error::{Error, InconsistencyKind, Result};
use crate::scanner::trim_newline;

use super::source::{RecordSource, Records};

/// Random-access reader over a single JSONL file.
///
/// Opening a reader runs [`cache_init`](crate::cache::cache_init), so the first open of a large file
/// pays for one full scan; later opens load the persisted index. The reader
/// keeps no file handle: every [`get`](RecordSource::get) opens the source,
/// seeks to the cached offset, reads one line, and closes it again.
///
/// Staleness is never detected implicitly. If the source changes after the
/// cache was built, reads fail with [`Error::Inconsistent`] (or return data
/// from the wrong offset) until the caller runs [`Reader::recache`] with a
/// check or [`Reader::force_recache`].
///
/// # Example
///
/// ```no_run
/// use fast_jsonl::{Reader, RecordSource};
///
/// let reader = Reader::open("data.jsonl")?;
/// let first = reader.get(0)?;
/// let window = reader.slice(Some(100), Some(105), None)?;
/// for record in reader.iter() {
///     let record = record?;
/// }
/// # Ok::<(), fast_jsonl::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Reader {
    path: PathBuf,
    explicit_cache_path: Option<PathBuf>,
    location: CacheLocation,
    config: CacheConfig,
    artifact: CacheArtifact,
}

impl Reader {
    /// Open `path` with default options: derived cache path, trust existing
    /// caches, naming strategy from `FAST_JSONL_DIR_METHOD`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with(path, ReaderOptions::from_env()?)
    }

    /// Open `path` with explicit options.
    ///
    /// # Errors
    ///
    /// Propagates every [`cache_init`](crate::cache::cache_init) error: [`Error::NotFound`] for a
    /// missing source, [`Error::InvalidConfig`] if the cache path is the
    /// source path, I/O and lock errors otherwise.
    pub fn open_with(path: impl Into<PathBuf>, options: ReaderOptions) -> Result<Self> {
        let path = path.into();
        let ReaderOptions {
            cache_path,
            policy,
            config,
        } = options;

        let (location, artifact) = initialize(&path, cache_path.as_deref(), policy, &config)?;

        tracing::debug!(
            path = %path.display(),
            cache = %location.cache_path.display(),
            records = artifact.len(),
            "Opened JSONL reader"
        );

        Ok(Self {
            path,
            explicit_cache_path: cache_path,
            location,
            config,
            artifact,
        })
    }

    /// Re-run cache initialization and replace the loaded index.
    ///
    /// A given `cache_path` replaces the remembered one; `None` keeps it. With
    /// the default policy and an unchanged cache path this reloads the same
    /// (possibly stale) artifact.
    pub fn recache(&mut self, cache_path: Option<PathBuf>, policy: StalenessPolicy) -> Result<()> {
        let explicit = cache_path.or_else(|| self.explicit_cache_path.clone());

        let (location, artifact) =
            initialize(&self.path, explicit.as_deref(), policy, &self.config)?;
        self.location = location;
        self.explicit_cache_path = explicit;
        self.artifact = artifact;
        Ok(())
    }

    /// [`recache`](Self::recache) with `force_cache` set.
    pub fn force_recache(&mut self, cache_path: Option<PathBuf>) -> Result<()> {
        self.recache(cache_path, StalenessPolicy::forced())
    }

    /// Source file path as given.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolved cache artifact path.
    pub fn cache_path(&self) -> &Path {
        &self.location.cache_path
    }

    /// The loaded artifact.
    pub fn artifact(&self) -> &CacheArtifact {
        &self.artifact
    }

    /// Cache configuration used for (re)initialization.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn read_line_at(&self, offset: u64) -> Result<Vec<u8>> {
        let file = File::open(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::io(&self.path, e))?;

        let mut line = Vec::new();
        reader
            .read_until(b'\n', &mut line)
            .map_err(|e| Error::io(&self.path, e))?;
        Ok(line)
    }
}

/// Resolve the cache location once and initialize the artifact there.
fn initialize(
    path: &Path,
    cache_path: Option<&Path>,
    policy: StalenessPolicy,
    config: &CacheConfig,
) -> Result<(CacheLocation, CacheArtifact)> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    let location = CacheLocation::resolve(path, cache_path, config)?;
    let artifact = cache_init_at(path, &location, policy, config)?;
    Ok((location, artifact))
}

impl RecordSource for Reader {
    fn len(&self) -> usize {
        self.artifact.len()
    }

    fn get(&self, position: usize) -> Result<Value> {
        let offset = self.artifact.lines.offset(position).ok_or_else(|| {
            Error::inconsistent(
                position,
                InconsistencyKind::OutOfRange {
                    len: self.artifact.len(),
                },
            )
        })?;

        let line = self.read_line_at(offset)?;
        if line.is_empty() {
            return Err(Error::inconsistent(position, InconsistencyKind::PastEndOfFile));
        }

        serde_json::from_slice(trim_newline(&line))
            .map_err(|_| Error::inconsistent(position, InconsistencyKind::Malformed))
    }
}

impl<'a> IntoIterator for &'a Reader {
    type Item = Result<Value>;
    type IntoIter = Records<'a, Reader>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
