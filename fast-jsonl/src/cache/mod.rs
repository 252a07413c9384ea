//! Persistent byte-offset caches.
//!
//! A cache artifact records, for one JSONL source file, the byte offset of
//! every valid record plus enough metadata (modification time, content hash)
//! to decide later whether the artifact is stale.
//!
//! # Lifecycle
//!
//! ```text
//! source file ──scan──► CacheArtifact ──persist──► <cache>.cache.json
//!                             ▲                          │
//!                             └────────── load ──────────┘
//! ```
//!
//! [`cache_init`] is the entry point: it takes the per-artifact lock, then
//! reuses, loads, or rebuilds the artifact according to a
//! [`StalenessPolicy`](crate::StalenessPolicy).

mod artifact;
mod init;
mod store;

pub use artifact::{CacheArtifact, CacheMeta};
pub use init::{cache_init, cache_init_at, CacheLocation};
pub use store::{
    build, compute_metadata, exists, exists_for_source, hash_valid, load, mtime, persist,
    time_valid,
};
