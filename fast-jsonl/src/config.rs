//! Cache configuration.
//!
//! [`CacheConfig`] carries everything that decides *where* caches live and
//! how long to wait for them; [`StalenessPolicy`] decides *when* an existing
//! cache is rebuilt. Both are plain values passed down from the caller, so two
//! readers in one process can use different strategies without interfering.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::naming::{NamingStrategy, PathDeriver};

/// Environment variable selecting the naming strategy.
pub const DIR_METHOD_ENV: &str = "FAST_JSONL_DIR_METHOD";

/// Where caches are placed and how lock waits are bounded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Naming strategy for derived cache paths.
    pub naming: NamingStrategy,

    /// Override for the user-strategy cache root.
    pub user_cache_root: Option<PathBuf>,

    /// Maximum time to wait for the cache lock; `None` waits forever.
    pub lock_timeout: Option<Duration>,
}

impl CacheConfig {
    /// Create a config with the given naming strategy.
    pub fn new(naming: NamingStrategy) -> Self {
        Self {
            naming,
            ..Self::default()
        }
    }

    /// Read the naming strategy from `FAST_JSONL_DIR_METHOD`.
    ///
    /// An unset variable selects the user strategy.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] for any value other than
    /// `local` or `user`.
    pub fn from_env() -> Result<Self> {
        match std::env::var(DIR_METHOD_ENV) {
            Ok(value) => Ok(Self::new(value.parse()?)),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Set the naming strategy.
    pub fn with_naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    /// Set the user-strategy cache root.
    pub fn with_user_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.user_cache_root = Some(root.into());
        self
    }

    /// Bound lock waits.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Build the path deriver described by this config.
    pub fn path_deriver(&self) -> PathDeriver {
        let deriver = PathDeriver::new(self.naming);
        match &self.user_cache_root {
            Some(root) => deriver.with_user_root(root.clone()),
            None => deriver,
        }
    }
}

/// When an existing cache is regenerated.
///
/// The default trusts any existing cache. Checks are opt-in because a hash
/// check re-reads the whole source file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StalenessPolicy {
    /// Always rebuild; the two checks are skipped.
    pub force_cache: bool,

    /// Rebuild if the source was modified after the cache was built.
    pub check_cache_time: bool,

    /// Rebuild if the source's content hash differs from the cached one.
    pub check_cache_hash: bool,
}

impl StalenessPolicy {
    /// Rebuild unconditionally.
    pub fn forced() -> Self {
        Self {
            force_cache: true,
            ..Self::default()
        }
    }

    /// Rebuild when the modification time advanced.
    pub fn check_time() -> Self {
        Self {
            check_cache_time: true,
            ..Self::default()
        }
    }

    /// Rebuild when the content hash changed.
    pub fn check_hash() -> Self {
        Self {
            check_cache_hash: true,
            ..Self::default()
        }
    }

    /// True if no rebuild trigger is set, so an existing cache is used as-is.
    pub fn is_trusting(&self) -> bool {
        !(self.force_cache || self.check_cache_time || self.check_cache_hash)
    }
}

/// Options for opening a reader.
#[derive(Clone, Debug, Default)]
pub struct ReaderOptions {
    /// Explicit cache path; derived from the source path when `None`.
    pub cache_path: Option<PathBuf>,

    /// Rebuild policy used while opening.
    pub policy: StalenessPolicy,

    /// Placement and locking configuration.
    pub config: CacheConfig,
}

impl ReaderOptions {
    /// Default options with the given cache configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Default options with the naming strategy read from
    /// `FAST_JSONL_DIR_METHOD`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] for an unknown strategy name.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(CacheConfig::from_env()?))
    }

    /// Use an explicit cache path.
    pub fn with_cache_path(mut self, cache_path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(cache_path.into());
        self
    }

    /// Set the rebuild policy.
    pub fn with_policy(mut self, policy: StalenessPolicy) -> Self {
        self.policy = policy;
        self
    }
}
