//! Per-identity advisory lock
//!
//! Provisioning infers state from what is on disk, so two concurrent
//! prepare/remove calls for the same identity would race between check and
//! act. An exclusive `flock(2)` on a lock file beside the library directory
//! serializes them across processes. The lock is released when the guard
//! drops. Other platforms get a no-op guard and callers must serialize.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ProvisionError;

/// Held for the duration of one prepare/remove
#[derive(Debug)]
pub struct IdentityLock {
    path: PathBuf,
    _file: File,
}

impl IdentityLock {
    /// Block until the lock at `path` is ours. The parent directory must exist.
    pub fn acquire(path: &Path) -> Result<Self, ProvisionError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| ProvisionError::io(format!("open lock {}", path.display()), e))?;

        lock_exclusive(&file)
            .map_err(|e| ProvisionError::io(format!("lock {}", path.display()), e))?;

        debug!(path = %path.display(), "identity lock acquired");
        Ok(Self {
            path: path.to_path_buf(),
            _file: file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for IdentityLock {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "identity lock released");
    }
}

#[cfg(target_os = "linux")]
fn lock_exclusive(file: &File) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;

    // SAFETY: the descriptor is owned by `file` and valid for the call
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn lock_exclusive(_file: &File) -> std::io::Result<()> {
    Ok(())
}
