//! Exclusive access to a result store.
//!
//! Dispatch appends and the rescore rewrite must never touch the same store
//! at once. Both take an advisory flock() on `<store>.lock` for the length of
//! the mutation; a second process fails fast instead of waiting. The kernel
//! drops the lock if the holder dies, so no stale-lock cleanup is needed.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

use crate::error::StoreError;

/// Lock file path for a store: the store path with `.lock` appended
pub fn lock_path(store_path: &Path) -> PathBuf {
    let mut name = store_path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

/// A held store lock that releases on drop
pub struct StoreLock {
    #[cfg_attr(not(unix), allow(dead_code))]
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Attempt to acquire the lock without blocking.
    /// Returns `StoreError::Locked` if another holder has it.
    pub fn try_acquire(store_path: &Path) -> Result<Self, StoreError> {
        let path = lock_path(store_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;

        match Self::try_lock_exclusive(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                return Err(StoreError::Locked(store_path.to_path_buf()));
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        }

        tracing::debug!(lock = %path.display(), "acquired store lock");
        Ok(StoreLock { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(unix)]
    fn try_lock_exclusive(file: &File) -> io::Result<()> {
        let fd = file.as_raw_fd();
        let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
        if result != 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::WouldBlock
                || err.raw_os_error() == Some(libc::EWOULDBLOCK)
                || err.raw_os_error() == Some(libc::EAGAIN)
            {
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "store is locked"));
            }
            return Err(err);
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn try_lock_exclusive(_file: &File) -> io::Result<()> {
        // No flock() here; exclusivity stays an operator precondition
        Ok(())
    }
}

#[cfg(unix)]
impl Drop for StoreLock {
    fn drop(&mut self) {
        let fd = self.file.as_raw_fd();
        // Release the lock - ignore errors on drop
        unsafe { libc::flock(fd, libc::LOCK_UN) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_path() {
        assert_eq!(
            lock_path(Path::new("data/results.jsonl")),
            PathBuf::from("data/results.jsonl.lock")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_acquire_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("results.jsonl");

        let lock1 = StoreLock::try_acquire(&store);
        assert!(lock1.is_ok(), "First lock should succeed");

        let lock2 = StoreLock::try_acquire(&store);
        assert!(matches!(lock2, Err(StoreError::Locked(_))), "Second lock should fail");

        drop(lock1);

        let lock3 = StoreLock::try_acquire(&store);
        assert!(lock3.is_ok(), "Lock should succeed after release");
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("nested").join("results.jsonl");
        let lock = StoreLock::try_acquire(&store).unwrap();
        assert!(lock.path().exists());
    }
}
