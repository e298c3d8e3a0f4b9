//! Ledger persistence
//!
//! Saves the whole ledger state as a CBOR snapshot and keeps an append-only
//! journal of committed notifications. Snapshots use atomic writes (write to
//! temp file, sync, then rename) so a crash never leaves a torn file.
//!
//! Storage location: `~/.local/share/feedlink/` (configurable via `Config`)
//!
//! Files:
//! - `ledger.cbor` - The ledger snapshot
//! - `notifications.jsonl` - One committed notification per line

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{StorageError, StorageResult};
use super::lock::DataDirLock;
use crate::config::Config;
use crate::events::Committed;
use crate::ledger::LedgerState;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    state: &'a LedgerState,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    state: LedgerState,
}

/// Persistence layer for ledger snapshots and the notification journal
pub struct SnapshotPersistence {
    config: Config,
}

impl SnapshotPersistence {
    /// Create a new persistence handler with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check if a snapshot exists on disk
    pub fn exists(&self) -> bool {
        self.config.snapshot_path().exists()
    }

    /// Save the state atomically
    pub fn save(&self, state: &LedgerState) -> StorageResult<()> {
        let mut bytes = Vec::new();
        ciborium::into_writer(
            &SnapshotRef {
                version: SNAPSHOT_VERSION,
                state,
            },
            &mut bytes,
        )
        .map_err(|e| StorageError::Encode(e.to_string()))?;

        atomic_write(&self.config.snapshot_path(), &bytes)
    }

    /// Load the state from disk
    ///
    /// Returns `None` if the snapshot file doesn't exist.
    /// Returns an error if the file exists but can't be read or parsed.
    pub fn load(&self) -> StorageResult<Option<LedgerState>> {
        let path = self.config.snapshot_path();

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(|e| StorageError::from_read(e, path.clone()))?;
        let snapshot: Snapshot =
            ciborium::from_reader(bytes.as_slice()).map_err(|e| StorageError::InvalidFormat {
                path: path.clone(),
                details: e.to_string(),
            })?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StorageError::UnsupportedVersion {
                path,
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        Ok(Some(snapshot.state))
    }

    /// Load the state, treating a missing snapshot as an error
    pub fn load_existing(&self) -> StorageResult<LedgerState> {
        self.load()?.ok_or_else(|| StorageError::NotFound {
            path: self.config.snapshot_path(),
        })
    }

    /// Exclusively lock the data directory until the guard is dropped
    pub fn lock(&self) -> StorageResult<DataDirLock> {
        DataDirLock::acquire(&self.config.data_dir)
    }

    /// Append a committed notification to the journal
    pub fn append_journal(&self, committed: &Committed) -> StorageResult<()> {
        let path = self.config.journal_path();
        let mut line = serde_json::to_string(committed)
            .map_err(|e| StorageError::Encode(e.to_string()))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::from_io(e, path.clone()))?;
        file.write_all(line.as_bytes())
            .map_err(|e| StorageError::from_io(e, path.clone()))?;
        file.sync_data()
            .map_err(|e| StorageError::from_io(e, path))?;
        Ok(())
    }

    /// Read every journaled notification, oldest first
    pub fn read_journal(&self) -> StorageResult<Vec<Committed>> {
        let path = self.config.journal_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path).map_err(|e| StorageError::from_read(e, path.clone()))?;
        let mut entries = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| StorageError::from_read(e, path.clone()))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|e| StorageError::InvalidFormat {
                path: path.clone(),
                details: format!("line {}: {}", number + 1, e),
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Get total size of stored data in bytes
    pub fn stored_size(&self) -> u64 {
        [self.config.snapshot_path(), self.config.journal_path()]
            .iter()
            .filter_map(|path| fs::metadata(path).ok())
            .map(|meta| meta.len())
            .sum()
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
    }

    // Same directory, so the rename stays on one filesystem
    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|e| StorageError::from_io(e, path.to_path_buf()))?;

    Ok(())
}
