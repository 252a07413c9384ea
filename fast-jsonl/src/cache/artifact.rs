//! Persisted cache document.

use serde::{Deserialize, Serialize};

use crate::index::LineIndex;

/// Source file metadata captured when the index was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    /// Resolved absolute source path with forward slashes.
    pub path: String,

    /// Source modification time, seconds since UNIX_EPOCH.
    pub mtime: f64,

    /// Base-62 SHA-256 token of the full source contents.
    pub hash: String,
}

/// The unit written to and read from a cache file.
///
/// ```text
/// { "meta": {"path": "...", "mtime": 1712345678.25, "hash": "..."},
///   "lines": {"0": 0, "1": 42, ...} }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheArtifact {
    pub meta: CacheMeta,
    pub lines: LineIndex,
}

impl CacheArtifact {
    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if no records are indexed.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
