//! Storage layer
//!
//! Handles ledger snapshot persistence and the notification journal.
//!
//! ## Architecture
//!
//! - **Snapshot**: the full ledger state, rewritten atomically on every commit
//! - **Journal**: append-only JSON lines, one per committed notification
//! - **Lock**: `.lock`, held exclusively for the duration of each commit
//!
//! The snapshot is the source of truth; the journal exists for observers
//! that want to follow changes incrementally.

pub mod error;
pub mod lock;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use lock::DataDirLock;
pub use persistence::{SnapshotPersistence, SNAPSHOT_VERSION};
