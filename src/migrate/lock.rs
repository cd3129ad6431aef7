use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::{LockWait, MigrationError};

/// Exclusive advisory lock on a file. Released when dropped.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Create (if needed) and exclusively lock `path`.
    ///
    /// Opening the file and locking it fail with distinct errors:
    /// [`MigrationError::LockCreate`] and [`MigrationError::LockAcquire`].
    pub fn acquire(path: &Path, wait: LockWait) -> Result<Self, MigrationError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|source| MigrationError::LockCreate {
                path: path.to_path_buf(),
                source,
            })?;

        lock_exclusive(&file, wait).map_err(|source| MigrationError::LockAcquire {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Acquired lock {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Closing the descriptor releases the lock too; unlock explicitly so
        // the release does not depend on when the File is closed.
        if let Err(e) = unlock(&self.file) {
            debug!("Failed to release lock {}: {e}", self.path.display());
        }
    }
}

#[cfg(unix)]
fn flock(file: &File, operation: libc::c_int) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    loop {
        // SAFETY: flock is a standard POSIX call and `fd` is a valid
        // descriptor owned by `file` for the duration of the call.
        let rc = unsafe { libc::flock(fd, operation) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(unix)]
fn lock_exclusive(file: &File, wait: LockWait) -> io::Result<()> {
    let operation = match wait {
        LockWait::Block => libc::LOCK_EX,
        LockWait::Try => libc::LOCK_EX | libc::LOCK_NB,
    };
    flock(file, operation)
}

#[cfg(unix)]
fn unlock(file: &File) -> io::Result<()> {
    flock(file, libc::LOCK_UN)
}

#[cfg(not(unix))]
fn lock_exclusive(_file: &File, _wait: LockWait) -> io::Result<()> {
    Ok(())
}

#[cfg(not(unix))]
fn unlock(_file: &File) -> io::Result<()> {
    Ok(())
}
