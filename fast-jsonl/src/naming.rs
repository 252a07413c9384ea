//! Cache and lock file naming.
//!
//! This module is the single source of truth for where cache artifacts and
//! their lock files live. Two strategies are supported:
//!
//! - **local**: next to the source file, in a hidden `.fj_cache` directory
//!   (`<parent>/.fj_cache/<stem>/<hash(name)>.cache.json`)
//! - **user**: under the user's home directory
//!   (`~/.local/share/fj_cache/<path with "/" as "--">/<hash(path)>.cache.json`)
//!
//! The user strategy keeps a human-legible directory name for inspection and
//! adds a hash of the full path so that the separator substitution cannot make
//! two different files collide.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::hashing::digest_text;

/// Hidden directory used by the local strategy.
pub const LOCAL_CACHE_DIR: &str = ".fj_cache";

/// Cache root used by the user strategy, relative to the home directory.
pub const USER_CACHE_SUBDIR: &str = ".local/share/fj_cache";

/// Suffix of cache artifact files.
pub const CACHE_SUFFIX: &str = ".cache.json";

/// Suffix of lock marker files.
pub const LOCK_SUFFIX: &str = ".lock";

/// Where derived cache files are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingStrategy {
    /// Next to the source file.
    Local,
    /// Under the user's home directory.
    #[default]
    User,
}

impl NamingStrategy {
    /// Configuration string for this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingStrategy::Local => "local",
            NamingStrategy::User => "user",
        }
    }
}

impl fmt::Display for NamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamingStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(NamingStrategy::Local),
            "user" => Ok(NamingStrategy::User),
            other => Err(Error::InvalidConfig(format!(
                "unknown cache naming strategy \"{}\" (expected \"local\" or \"user\")",
                other
            ))),
        }
    }
}

/// Which artifact a derived path is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArtifactKind {
    Cache,
    Lock,
}

impl ArtifactKind {
    fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Cache => CACHE_SUFFIX,
            ArtifactKind::Lock => LOCK_SUFFIX,
        }
    }
}

/// Maps source file paths to cache and lock file paths.
#[derive(Debug, Clone, Default)]
pub struct PathDeriver {
    strategy: NamingStrategy,
    user_root: Option<PathBuf>,
}

impl PathDeriver {
    /// Create a deriver for the given strategy.
    pub fn new(strategy: NamingStrategy) -> Self {
        Self {
            strategy,
            user_root: None,
        }
    }

    /// Replace the user-strategy root (defaults to `~/.local/share/fj_cache`).
    pub fn with_user_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.user_root = Some(root.into());
        self
    }

    /// The active strategy.
    pub fn strategy(&self) -> NamingStrategy {
        self.strategy
    }

    /// Derive the cache artifact path for `source`, creating directories.
    pub fn cache_path(&self, source: &Path) -> Result<PathBuf> {
        self.artifact_path(source, ArtifactKind::Cache)
    }

    /// Derive the lock file path for `source`, creating directories.
    pub fn lock_path(&self, source: &Path) -> Result<PathBuf> {
        self.artifact_path(source, ArtifactKind::Lock)
    }

    fn artifact_path(&self, source: &Path, kind: ArtifactKind) -> Result<PathBuf> {
        let resolved = resolve(source)?;

        let (collision_dir, hashed) = match self.strategy {
            NamingStrategy::Local => {
                let parent = resolved.parent().unwrap_or_else(|| Path::new("/"));
                let stem = resolved
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .ok_or_else(|| {
                        Error::InvalidConfig(format!(
                            "cannot derive a cache path for {}: no file name",
                            source.display()
                        ))
                    })?;
                let name = resolved
                    .file_name()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (parent.join(LOCAL_CACHE_DIR).join(stem), digest_text(&name))
            }
            NamingStrategy::User => {
                let posix = to_posix(&resolved);
                let legible = posix.replace('/', "--");
                (self.user_root()?.join(legible), digest_text(&posix))
            }
        };

        fs::create_dir_all(&collision_dir).map_err(|e| Error::io(&collision_dir, e))?;
        Ok(collision_dir.join(format!("{}{}", hashed, kind.suffix())))
    }

    fn user_root(&self) -> Result<PathBuf> {
        match &self.user_root {
            Some(root) => Ok(root.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(USER_CACHE_SUBDIR))
                .ok_or_else(|| {
                    Error::InvalidConfig("could not determine the home directory".to_string())
                }),
        }
    }
}

/// Resolve `path` to an absolute path.
///
/// Existing paths are canonicalized (symlinks resolved); paths that do not
/// exist yet are joined onto the current directory.
pub fn resolve(path: &Path) -> Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(_) if path.is_absolute() => Ok(path.to_path_buf()),
        Err(_) => {
            let cwd = std::env::current_dir().map_err(|e| Error::io(path, e))?;
            Ok(cwd.join(path))
        }
    }
}

/// Resolve `path` and render it with forward slashes.
pub fn resolve_posix(path: &Path) -> Result<String> {
    Ok(to_posix(&resolve(path)?))
}

fn to_posix(path: &Path) -> String {
    let rendered = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        rendered.into_owned()
    } else {
        rendered.replace(std::path::MAIN_SEPARATOR, "/")
    }
}
