//! Data directory locking
//!
//! Serializes commits from every `Store` handle that shares a data
//! directory, whether in this process or another. Each commit holds an
//! exclusive OS-level lock (`flock` on Unix, `LockFileEx` on Windows) on
//! `<data_dir>/.lock` while it reloads, applies and saves. The OS releases
//! the lock if the process dies.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use super::error::{StorageError, StorageResult};

/// Name of the lock file inside the data directory
pub const LOCK_FILE: &str = ".lock";

/// An exclusive lock on a data directory, released on drop
pub struct DataDirLock {
    file: File,
    path: PathBuf,
}

impl DataDirLock {
    /// Block until the data directory is exclusively locked
    ///
    /// Creates the directory and the lock file if needed.
    pub fn acquire(data_dir: &Path) -> StorageResult<Self> {
        if !data_dir.exists() {
            fs::create_dir_all(data_dir)
                .map_err(|e| StorageError::from_io(e, data_dir.to_path_buf()))?;
            debug!(path = %data_dir.display(), "Created data directory");
        }

        let path = data_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| StorageError::from_io(e, path.clone()))?;

        file.lock_exclusive()
            .map_err(|e| StorageError::from_io(e, path.clone()))?;
        debug!(path = %path.display(), "Acquired data directory lock");

        Ok(Self { file, path })
    }

    pub fn lock_path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "Failed to release data directory lock");
        }
    }
}
