/*!
 * Advisory lock guarding a request file while it is being answered
 */

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{MidsyncError, Result};

/// Exclusive lock on `<request>.lock`, released on drop
///
/// The sidecar file is never removed, only unlocked.
#[derive(Debug)]
pub struct RespondLock {
    file: File,
}

impl RespondLock {
    /// Try to take the lock for `request_file` without blocking
    pub fn acquire(request_file: &Path) -> Result<Self> {
        let path = lock_path(request_file);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(lock = %path.display(), "acquired respond lock");
                Ok(Self { file })
            }
            Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                Err(MidsyncError::Locked(request_file.to_path_buf()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Drop for RespondLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Sidecar lock file for a request file
pub fn lock_path(request_file: &Path) -> PathBuf {
    let mut name = request_file.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_path_appends_suffix() {
        assert_eq!(
            lock_path(Path::new("/mid/photos.midsync")),
            PathBuf::from("/mid/photos.midsync.lock")
        );
    }

    #[test]
    fn test_second_acquire_is_refused() {
        let dir = tempdir().unwrap();
        let request = dir.path().join("photos.midsync");

        let _first = RespondLock::acquire(&request).unwrap();
        assert!(lock_path(&request).exists());

        let err = RespondLock::acquire(&request).unwrap_err();
        assert!(matches!(err, MidsyncError::Locked(ref p) if p == &request));
    }

    #[test]
    fn test_drop_releases_but_keeps_sidecar() {
        let dir = tempdir().unwrap();
        let request = dir.path().join("photos.midsync");

        let lock = RespondLock::acquire(&request).unwrap();
        drop(lock);

        assert!(lock_path(&request).exists());
        assert!(RespondLock::acquire(&request).is_ok());
    }
}
