//! Error types for cache construction and record reads.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Result type for fast-jsonl operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a cached position could not be turned into a record.
///
/// All three cases mean the loaded index and the file on disk disagree (or the
/// caller asked for a position the index never had). The only recovery is a
/// caller-initiated recache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InconsistencyKind {
    /// The position is not present in the loaded index.
    OutOfRange { len: usize },
    /// The index points at or beyond the end of the file.
    PastEndOfFile,
    /// The bytes at the cached offset are not a JSON value.
    Malformed,
}

impl fmt::Display for InconsistencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { len } => {
                write!(f, "position is outside the cached index of {} records", len)
            }
            Self::PastEndOfFile => write!(
                f,
                "no data at the cached offset; the cache holds more records than the file"
            ),
            Self::Malformed => write!(
                f,
                "data at the cached offset could not be parsed as JSON; check that it is not malformed"
            ),
        }
    }
}

/// Errors that can occur while building caches or reading records.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration: unknown naming strategy, cache path equal to the
    /// source path, mismatched cache path lists, zero slice step.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The source file does not exist.
    #[error("no file found at {}", .0.display())]
    NotFound(PathBuf),

    /// The cache and the source file disagree about a record.
    #[error("failed to read record {position}: {kind}")]
    Inconsistent { position: i64, kind: InconsistencyKind },

    /// Filesystem failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The cache file exists but does not hold a usable artifact.
    #[error("cache file {} is corrupt: {reason}", path.display())]
    CacheCorrupt { path: PathBuf, reason: String },

    /// A bounded lock wait ran out.
    #[error("timed out after {waited:?} waiting for lock {}", path.display())]
    LockTimeout { path: PathBuf, waited: Duration },
}

impl Error {
    /// Wrap an I/O error, mapping `NotFound` to [`Error::NotFound`].
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub(crate) fn inconsistent(position: usize, kind: InconsistencyKind) -> Self {
        Self::Inconsistent {
            position: position as i64,
            kind,
        }
    }

    /// True for the data/cache inconsistency family.
    pub fn is_inconsistency(&self) -> bool {
        matches!(self, Self::Inconsistent { .. })
    }
}
