//! feedlink Core Library
//!
//! This crate provides the core of feedlink, a ledger-style record store
//! for feedback collection: creators publish links, anyone permitted submits
//! immutable feedback against them, and a small admin set gates privileged
//! changes.
//!
//! # Architecture
//!
//! - **AdminRegistry**: privileged principals
//! - **LinkStore**: links and their lifecycle
//! - **FeedbackStore**: append-only arena of immutable feedback
//! - **QueryEngine**: privacy-aware read projections
//! - **Store**: transactional wrapper, persistence and notifications
//!
//! # Quick Start
//!
//! ```text
//! let store = Store::in_memory(Principal::new("root"))?;
//!
//! let link = store.create_link(&alice, "bugs", b"bug-reports".to_vec(), vec![], false)?;
//! let id = store.submit_feedback(&bob, &link, b"crashes on start".to_vec())?;
//!
//! let feedback = store.list_feedbacks(&link)?;
//! ```
//!
//! # Modules
//!
//! - `store`: Unified transactional interface (main entry point)
//! - `models`: Principals, ids, links and feedback
//! - `admin`, `links`, `feedback`: the state machines
//! - `query`: read projections
//! - `events`: change notifications
//! - `storage`: snapshot persistence and notification journal
//! - `config`: Application configuration

pub mod admin;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod feedback;
pub mod ledger;
pub mod links;
pub mod models;
pub mod query;
pub mod storage;
pub mod store;

pub use admin::AdminRegistry;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use events::{Committed, Notification};
pub use feedback::FeedbackStore;
pub use ledger::{LedgerState, Operation, Receipt};
pub use links::{LinkInfo, LinkStore};
pub use models::{Feedback, FeedbackId, Link, LinkId, LinkIdError, LinkStatus, Principal};
pub use query::{FeedbackEntry, FeedbackView, QueryEngine, SubmissionEntry, REDACTED_CONTENT};
pub use storage::{DataDirLock, SnapshotPersistence, StorageError};
pub use store::{Store, StoreStats};
