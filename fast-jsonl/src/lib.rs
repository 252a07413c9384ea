//! fast-jsonl - random access into large JSONL files
//!
//! A JSONL file is scanned once to record the byte offset of every valid
//! record. The offsets are persisted as a small JSON cache next to the file or
//! under the user's home directory, so later opens skip the scan and every
//! record read is a single seek.
//!
//! # Architecture
//!
//! ```text
//! Reader / MultiReader ──► cache_init ──► FileLock (per cache path)
//!                                   │
//!                                   ├──► cache::load        (reuse)
//!                                   └──► scanner::scan ──► cache::persist (rebuild)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use fast_jsonl::{Reader, RecordSource, ReaderOptions, StalenessPolicy};
//!
//! // Rebuild the cache if the file changed since it was indexed.
//! let options = ReaderOptions::default().with_policy(StalenessPolicy::check_time());
//! let reader = Reader::open_with("train.jsonl", options)?;
//!
//! println!("{} records", reader.len());
//! let batch = reader.get_many([7, 3, 11])?;
//! let tail = reader.slice(Some(reader.len() as isize - 5), None, None)?;
//! # Ok::<(), fast_jsonl::Error>(())
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod hashing;
pub mod index;
pub mod lock;
pub mod logging;
pub mod naming;
pub mod precache;
pub mod reader;
pub mod scanner;

pub use cache::{cache_init, CacheArtifact, CacheMeta};
pub use config::{CacheConfig, ReaderOptions, StalenessPolicy, DIR_METHOD_ENV};
pub use error::{Error, InconsistencyKind, Result};
pub use index::LineIndex;
pub use lock::{FileLock, LockGuard};
pub use naming::{NamingStrategy, PathDeriver};
pub use precache::{precache, precache_with_progress, PrecacheReport};
pub use reader::{MultiReader, Reader, RecordSource, Records};
pub use scanner::{scan, ScanOutcome};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
