//! Workbook write lock
//!
//! Rewrites of the shared workbook file are serialized through a sentinel
//! file next to the workbook. Acquisition uses an atomic create-exclusive
//! open (no check-then-create window), polling at a fixed interval until the
//! marker can be created or the timeout elapses. A stale marker left by
//! an ungraceful exit therefore delays writers by at most the timeout
//! instead of wedging them forever.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;

/// How long to wait for the lock, and how often to retry.
#[derive(Debug, Clone, Copy)]
pub struct LockSettings {
    pub timeout: Duration,
    pub poll: Duration,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(10_000),
            poll: Duration::from_millis(50),
        }
    }
}

/// RAII guard over the lock marker. Dropping the guard removes the marker;
/// removal failure is swallowed (the marker exists only for mutual
/// exclusion, not durability).
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    /// Acquire the lock at `path`, waiting up to `settings.timeout`.
    pub fn acquire(path: &Path, settings: LockSettings) -> Result<Self, LockError> {
        let start = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(_) => {
                    return Ok(Self {
                        path: path.to_path_buf(),
                    })
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if start.elapsed() >= settings.timeout {
                        return Err(LockError::Timeout {
                            path: path.to_path_buf(),
                            waited_ms: start.elapsed().as_millis() as u64,
                        });
                    }
                    std::thread::sleep(settings.poll);
                }
                Err(e) => {
                    return Err(LockError::Io {
                        path: path.to_path_buf(),
                        source: e,
                    })
                }
            }
        }
    }

    /// The marker path this guard holds.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Errors that can occur while acquiring the workbook lock
#[derive(Debug, Error)]
pub enum LockError {
    #[error("timed out after {waited_ms}ms waiting for lock {path:?}. Remove the file if no other writer is running.")]
    Timeout { path: PathBuf, waited_ms: u64 },

    #[error("failed to create lock {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
