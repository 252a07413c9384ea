//! Advisory cross-process file lock.
//!
//! A [`FileLock`] names a marker file; holding the lock means holding an
//! exclusive advisory lock on that file. Every acquisition opens its own file
//! description, so two threads of one process exclude each other exactly as
//! two processes do.
//!
//! Only parties that use this protocol are excluded. There is no default
//! timeout: a holder that never releases starves every waiter unless the
//! waiters use [`FileLock::acquire_timeout`]. On unix a holder that exits
//! releases automatically because the kernel drops the lock with the
//! descriptor.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::naming::{CACHE_SUFFIX, LOCK_SUFFIX};

/// Interval between non-blocking attempts in [`FileLock::acquire_timeout`].
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Directory holding locks for explicitly given cache paths.
pub const LOCK_DIR: &str = ".locks";

/// A named advisory lock.
#[derive(Debug, Clone)]
pub struct FileLock {
    path: PathBuf,
}

/// Proof of holding a [`FileLock`]. Dropping it releases the lock.
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Create a lock on the marker file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Lock guarding the cache artifact at `cache_path`.
    ///
    /// The marker depends only on the cache file, however the caller named
    /// it. A derived artifact `<dir>/<hash>.cache.json` is guarded by
    /// `<dir>/<hash>.lock`; any other file by
    /// `<cache dir>/.locks/<cache file name>.lock`.
    pub fn for_cache_path(cache_path: &Path) -> Self {
        let dir = cache_path.parent().unwrap_or_else(|| Path::new("."));
        let name = cache_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match name.strip_suffix(CACHE_SUFFIX) {
            Some(stem) if !stem.is_empty() => {
                Self::new(dir.join(format!("{}{}", stem, LOCK_SUFFIX)))
            }
            _ => Self::new(dir.join(LOCK_DIR).join(format!("{}{}", name, LOCK_SUFFIX))),
        }
    }

    /// Path of the marker file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until the lock is held.
    pub fn acquire(&self) -> Result<LockGuard> {
        let file = self.open()?;
        sys::lock(&file).map_err(|e| Error::io(&self.path, e))?;
        tracing::trace!(path = %self.path.display(), "Acquired cache lock");
        Ok(LockGuard {
            file,
            path: self.path.clone(),
        })
    }

    /// Try to take the lock without blocking.
    pub fn try_acquire(&self) -> Result<Option<LockGuard>> {
        let file = self.open()?;
        if sys::try_lock(&file).map_err(|e| Error::io(&self.path, e))? {
            Ok(Some(LockGuard {
                file,
                path: self.path.clone(),
            }))
        } else {
            Ok(None)
        }
    }

    /// Wait at most `timeout` for the lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockTimeout`] if the lock is still held elsewhere when
    /// the budget runs out.
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<LockGuard> {
        let started = Instant::now();
        loop {
            if let Some(guard) = self.try_acquire()? {
                return Ok(guard);
            }
            let waited = started.elapsed();
            if waited >= timeout {
                return Err(Error::LockTimeout {
                    path: self.path.clone(),
                    waited,
                });
            }
            std::thread::sleep(POLL_INTERVAL.min(timeout - waited));
        }
    }

    /// Acquire, honouring an optional timeout.
    pub fn acquire_with(&self, timeout: Option<Duration>) -> Result<LockGuard> {
        match timeout {
            Some(timeout) => self.acquire_timeout(timeout),
            None => self.acquire(),
        }
    }

    fn open(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))
    }
}

impl LockGuard {
    /// Path of the held marker file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = sys::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to release cache lock");
        } else {
            tracing::trace!(path = %self.path.display(), "Released cache lock");
        }
    }
}

#[cfg(unix)]
mod sys {
    use std::fs::File;
    use std::io;
    use std::os::unix::io::AsRawFd;

    fn flock(file: &File, operation: libc::c_int) -> io::Result<()> {
        loop {
            // SAFETY: the descriptor is owned by `file` and stays open for the call.
            let rc = unsafe { libc::flock(file.as_raw_fd(), operation) };
            if rc == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    pub fn lock(file: &File) -> io::Result<()> {
        flock(file, libc::LOCK_EX)
    }

    pub fn try_lock(file: &File) -> io::Result<bool> {
        match flock(file, libc::LOCK_EX | libc::LOCK_NB) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn unlock(file: &File) -> io::Result<()> {
        flock(file, libc::LOCK_UN)
    }
}

#[cfg(not(unix))]
mod sys {
    use std::fs::File;
    use std::io;

    pub fn lock(file: &File) -> io::Result<()> {
        file.lock().map_err(io::Error::from)
    }

    pub fn try_lock(file: &File) -> io::Result<bool> {
        match file.try_lock() {
            Ok(()) => Ok(true),
            Err(std::fs::TryLockError::WouldBlock) => Ok(false),
            Err(std::fs::TryLockError::Error(e)) => Err(e),
        }
    }

    pub fn unlock(file: &File) -> io::Result<()> {
        file.unlock()
    }
}
