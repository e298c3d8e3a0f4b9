//! Transactional store
//!
//! The `Store` owns the one shared [`LedgerState`] and serializes every
//! mutation through a single write lock:
//!
//! 1. **begin**: take the write lock. A durable store also locks the data
//!    directory and reloads the snapshot, so commits from other handles on
//!    the same directory are never overwritten.
//! 2. apply the operation. Every operation validates before it mutates.
//! 3. **abort** on any rejection: nothing was changed
//! 4. **commit**: persist the snapshot (durable stores), install the new
//!    state, journal and publish exactly one notification
//!
//! Readers take the read lock and see a consistent committed snapshot: the
//! latest state this handle has loaded, at open or at its last commit.
//!
//! ## Usage
//!
//! ```ignore
//! let store = Store::in_memory(Principal::new("root"))?;
//!
//! let link = store.create_link(&alice, "bugs", b"bug-reports".to_vec(), vec![], false)?;
//! store.submit_feedback(&bob, &link, b"crashes on start".to_vec())?;
//!
//! let ids = store.list_feedback_ids(&bob, &link)?;
//! ```

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::LedgerResult;
use crate::events::{Committed, Notification};
use crate::ledger::{LedgerState, Operation, Receipt};
use crate::links::LinkInfo;
use crate::models::{Feedback, FeedbackId, LinkId, Principal};
use crate::query::{FeedbackEntry, FeedbackView, QueryEngine, SubmissionEntry};
use crate::storage::SnapshotPersistence;

/// Default buffer for in-memory stores
const IN_MEMORY_NOTIFICATION_CAPACITY: usize = 256;

/// Summary counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub revision: u64,
    pub admins: usize,
    pub links: usize,
    pub feedback: usize,
    /// Bytes on disk, for durable stores
    pub stored_bytes: Option<u64>,
}

pub struct Store {
    state: RwLock<LedgerState>,
    persistence: Option<SnapshotPersistence>,
    clock: Arc<dyn Clock>,
    notifications: broadcast::Sender<Committed>,
}

impl Store {
    /// A non-durable ledger seeded with one admin
    pub fn in_memory(seed_admin: Principal) -> LedgerResult<Self> {
        Self::in_memory_with_clock(seed_admin, Arc::new(SystemClock))
    }

    pub fn in_memory_with_clock(seed_admin: Principal, clock: Arc<dyn Clock>) -> LedgerResult<Self> {
        let state = LedgerState::new(seed_admin)?;
        Ok(Self::from_parts(
            state,
            None,
            clock,
            IN_MEMORY_NOTIFICATION_CAPACITY,
        ))
    }

    /// Create a new durable ledger in the configured data directory
    ///
    /// Fails if a ledger already exists there.
    pub fn initialize(config: Config, seed_admin: Principal) -> Result<Self> {
        let persistence = SnapshotPersistence::new(config.clone());
        let _dir_lock = persistence
            .lock()
            .context("Failed to lock the data directory")?;
        if persistence.exists() {
            bail!(
                "Ledger already initialized at {}",
                config.snapshot_path().display()
            );
        }

        let state = LedgerState::new(seed_admin.clone())
            .context("Seed admin must be a non-null principal")?;
        persistence
            .save(&state)
            .context("Failed to save initial ledger snapshot")?;

        info!(admin = %seed_admin, path = ?config.snapshot_path(), "Initialized ledger");
        Ok(Self::from_parts(
            state,
            Some(persistence),
            Arc::new(SystemClock),
            config.notification_capacity,
        ))
    }

    /// Open the ledger using the default configuration
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open an existing durable ledger
    pub fn open_with_config(config: Config) -> Result<Self> {
        let persistence = SnapshotPersistence::new(config.clone());
        let state = persistence
            .load()
            .context("Failed to load ledger snapshot")?
            .with_context(|| {
                format!(
                    "No ledger found in {}. Run `feedlink init --admin <principal>` first.",
                    config.data_dir.display()
                )
            })?;

        Ok(Self::from_parts(
            state,
            Some(persistence),
            Arc::new(SystemClock),
            config.notification_capacity,
        ))
    }

    fn from_parts(
        state: LedgerState,
        persistence: Option<SnapshotPersistence>,
        clock: Arc<dyn Clock>,
        capacity: usize,
    ) -> Self {
        let (notifications, _) = broadcast::channel(capacity.max(1));
        Self {
            state: RwLock::new(state),
            persistence,
            clock,
            notifications,
        }
    }

    /// Configuration of a durable store
    pub fn config(&self) -> Option<&Config> {
        self.persistence.as_ref().map(SnapshotPersistence::config)
    }

    pub fn is_durable(&self) -> bool {
        self.persistence.is_some()
    }

    // ==================== Transactions ====================

    /// Apply one mutation atomically on behalf of `caller`
    pub fn execute(
        &self,
        caller: &Principal,
        operation: Operation,
    ) -> LedgerResult<(Receipt, Committed)> {
        self.transact(caller, |state, now| state.apply(caller, operation, now))
    }

    /// Run `op` as one transaction and publish its notification
    ///
    /// `op` must leave the state untouched when it fails, which every
    /// `LedgerState` mutator guarantees.
    fn transact<T>(
        &self,
        caller: &Principal,
        op: impl FnOnce(&mut LedgerState, DateTime<Utc>) -> LedgerResult<(T, Notification)>,
    ) -> LedgerResult<(T, Committed)> {
        let mut state = self.write();
        let now = self.clock.now();

        let Some(persistence) = &self.persistence else {
            let (value, notification) = op(&mut *state, now).inspect_err(|err| {
                warn!(caller = %caller, error = %err, "Operation rejected");
            })?;
            let revision = state.advance_revision();
            let committed = Committed {
                revision,
                at: now,
                notification,
            };
            return Ok((value, self.publish(caller, committed)));
        };

        let _dir_lock = persistence.lock()?;
        // Another handle may have committed since this one last loaded
        let mut latest = persistence.load_existing()?;

        let (value, notification) = match op(&mut latest, now) {
            Ok(applied) => applied,
            Err(err) => {
                warn!(caller = %caller, error = %err, "Operation rejected");
                *state = latest;
                return Err(err);
            }
        };
        let revision = latest.advance_revision();

        if let Err(err) = persistence.save(&latest) {
            warn!(revision, error = %err, "Commit aborted: snapshot not saved");
            return Err(err.into());
        }
        *state = latest;

        let committed = Committed {
            revision,
            at: now,
            notification,
        };
        // The snapshot is already durable; a journal gap is reported, not rolled back
        if let Err(err) = persistence.append_journal(&committed) {
            warn!(revision, error = %err, "Failed to journal notification");
        }

        Ok((value, self.publish(caller, committed)))
    }

    /// Log and broadcast a commit. Called under the write lock so
    /// subscribers see revision order.
    fn publish(&self, caller: &Principal, committed: Committed) -> Committed {
        info!(
            revision = committed.revision,
            caller = %caller,
            event = %committed.notification,
            "Committed"
        );
        // No subscribers is not an error
        let _ = self.notifications.send(committed.clone());
        committed
    }

    pub fn add_admin(&self, caller: &Principal, target: Principal) -> LedgerResult<()> {
        self.execute(caller, Operation::AddAdmin { target })
            .map(|_| ())
    }

    pub fn remove_admin(&self, caller: &Principal, target: Principal) -> LedgerResult<()> {
        self.execute(caller, Operation::RemoveAdmin { target })
            .map(|_| ())
    }

    pub fn create_link(
        &self,
        caller: &Principal,
        name: impl Into<String>,
        topic: Vec<u8>,
        description: Vec<u8>,
        is_private: bool,
    ) -> LedgerResult<LinkId> {
        let name = name.into();
        self.transact(caller, |state, now| {
            state.create_link(caller, &name, topic, description, is_private, now)
        })
        .map(|(link_id, _)| link_id)
    }

    pub fn set_active(&self, caller: &Principal, link_id: &LinkId, is_active: bool) -> LedgerResult<()> {
        self.execute(
            caller,
            Operation::SetActive {
                link_id: *link_id,
                is_active,
            },
        )
        .map(|_| ())
    }

    pub fn set_private(
        &self,
        caller: &Principal,
        link_id: &LinkId,
        is_private: bool,
    ) -> LedgerResult<()> {
        self.execute(
            caller,
            Operation::SetPrivate {
                link_id: *link_id,
                is_private,
            },
        )
        .map(|_| ())
    }

    pub fn delete_link(&self, caller: &Principal, link_id: &LinkId) -> LedgerResult<()> {
        self.execute(caller, Operation::DeleteLink { link_id: *link_id })
            .map(|_| ())
    }

    pub fn submit_feedback(
        &self,
        caller: &Principal,
        link_id: &LinkId,
        content: Vec<u8>,
    ) -> LedgerResult<FeedbackId> {
        self.transact(caller, |state, now| {
            state.submit_feedback(caller, link_id, content, now)
        })
        .map(|(feedback_id, _)| feedback_id)
    }

    // ==================== Notifications ====================

    /// Receive every notification committed after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Committed> {
        self.notifications.subscribe()
    }

    /// Journaled notifications, oldest first. Empty for in-memory stores.
    pub fn journal(&self) -> LedgerResult<Vec<Committed>> {
        match &self.persistence {
            Some(persistence) => Ok(persistence.read_journal()?),
            None => Ok(Vec::new()),
        }
    }

    // ==================== Queries ====================

    /// Run a projection against the committed state
    pub fn query<T>(&self, f: impl FnOnce(&QueryEngine<'_>) -> T) -> T {
        let state = self.read();
        f(&QueryEngine::new(&state))
    }

    pub fn is_admin(&self, principal: &Principal) -> bool {
        self.query(|q| q.is_admin(principal))
    }

    pub fn admins(&self) -> Vec<Principal> {
        self.query(|q| q.admins())
    }

    pub fn exists(&self, link_id: &LinkId) -> bool {
        self.query(|q| q.exists(link_id))
    }

    pub fn get_topic(&self, link_id: &LinkId) -> LedgerResult<(Vec<u8>, Vec<u8>)> {
        self.query(|q| q.get_topic(link_id))
    }

    pub fn get_full_info(&self, link_id: &LinkId) -> LedgerResult<LinkInfo> {
        self.query(|q| q.get_full_info(link_id))
    }

    /// Raw feedback record, unredacted
    pub fn get_feedback_record(&self, feedback_id: FeedbackId) -> LedgerResult<Feedback> {
        self.read().feedback().get(feedback_id).cloned()
    }

    pub fn list_feedback_ids(
        &self,
        caller: &Principal,
        link_id: &LinkId,
    ) -> LedgerResult<Vec<FeedbackId>> {
        self.query(|q| q.list_feedback_ids(caller, link_id))
    }

    pub fn get_feedback(
        &self,
        caller: &Principal,
        feedback_id: FeedbackId,
    ) -> LedgerResult<FeedbackView> {
        self.query(|q| q.get_feedback(caller, feedback_id))
    }

    pub fn is_active(&self, link_id: &LinkId) -> bool {
        self.query(|q| q.is_active(link_id))
    }

    pub fn is_private(&self, link_id: &LinkId) -> LedgerResult<bool> {
        self.query(|q| q.is_private(link_id))
    }

    pub fn list_active_public_links(&self) -> Vec<LinkId> {
        self.query(|q| q.list_active_public_links())
    }

    pub fn list_all_active_links(&self, caller: &Principal) -> LedgerResult<Vec<LinkId>> {
        self.query(|q| q.list_all_active_links(caller))
    }

    pub fn list_all_links(&self, caller: &Principal) -> LedgerResult<Vec<LinkId>> {
        self.query(|q| q.list_all_links(caller))
    }

    pub fn list_by_creator(&self, creator: &Principal) -> Vec<LinkInfo> {
        self.query(|q| q.list_by_creator(creator))
    }

    pub fn list_feedback_by_submitter(
        &self,
        caller: &Principal,
        link_id: &LinkId,
        submitter: &Principal,
    ) -> LedgerResult<Vec<SubmissionEntry>> {
        self.query(|q| q.list_feedback_by_submitter(caller, link_id, submitter))
    }

    pub fn list_feedbacks(&self, link_id: &LinkId) -> LedgerResult<Vec<FeedbackEntry>> {
        self.query(|q| q.list_feedbacks(link_id))
    }

    // ==================== Stats ====================

    pub fn revision(&self) -> u64 {
        self.read().revision()
    }

    pub fn stats(&self) -> StoreStats {
        let state = self.read();
        StoreStats {
            revision: state.revision(),
            admins: state.admins().len(),
            links: state.links().len(),
            feedback: state.feedback().len(),
            stored_bytes: self.persistence.as_ref().map(SnapshotPersistence::stored_size),
        }
    }

    // Mutators validate before they change anything and durable commits
    // install a fully built state, so a poisoned lock still guards a
    // consistent value.
    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::{ErrorKind, LedgerError};
    use crate::events::Notification;
    use chrono::{Duration, TimeZone, Utc};
    use std::thread;
    use tempfile::TempDir;

    fn p(s: &str) -> Principal {
        Principal::new(s)
    }

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    fn store() -> Store {
        Store::in_memory(p("root")).unwrap()
    }

    fn public_link(store: &Store, name: &str) -> LinkId {
        store
            .create_link(&p("alice"), name, b"topic".to_vec(), Vec::new(), false)
            .unwrap()
    }

    #[test]
    fn test_create_then_full_info() {
        let store = store();
        let id = store
            .create_link(&p("alice"), "bugs", b"bug-reports".to_vec(), b"desc".to_vec(), true)
            .unwrap();

        let info = store.get_full_info(&id).unwrap();
        assert_eq!(info.topic, b"bug-reports");
        assert_eq!(info.description, b"desc");
        assert!(info.is_private);
        assert!(info.is_active);
        assert!(!info.is_deleted);
        assert_eq!(info.feedback_count, 0);
    }

    #[test]
    fn test_submit_then_list_feedbacks() {
        let store = store();
        let link = public_link(&store, "a");

        let id = store
            .submit_feedback(&p("bob"), &link, b"great".to_vec())
            .unwrap();

        let entries = store.list_feedbacks(&link).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, b"great");
        assert_eq!(entries[0].author, p("bob"));
        assert_eq!(entries[0].feedback_id, id);

        let record = store.get_feedback_record(id).unwrap();
        assert_eq!(entries[0].timestamp, record.timestamp());
        assert_eq!(store.get_full_info(&link).unwrap().feedback_count, 1);
    }

    #[test]
    fn test_empty_content_leaves_count() {
        let store = store();
        let link = public_link(&store, "a");

        let err = store.submit_feedback(&p("bob"), &link, Vec::new()).unwrap_err();
        assert!(matches!(err, LedgerError::EmptyContent));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.get_full_info(&link).unwrap().feedback_count, 0);
    }

    #[test]
    fn test_empty_topic_leaves_index() {
        let store = store();
        public_link(&store, "a");

        let result = store.create_link(&p("alice"), "b", Vec::new(), Vec::new(), false);
        assert!(matches!(result, Err(LedgerError::EmptyTopic)));
        assert_eq!(store.stats().links, 1);
    }

    #[test]
    fn test_duplicate_link_with_pinned_clock() {
        let clock = Arc::new(ManualClock::new(Utc.timestamp_opt(1_000, 0).unwrap()));
        let store = Store::in_memory_with_clock(p("root"), clock.clone()).unwrap();

        store
            .create_link(&p("alice"), "same", b"t".to_vec(), Vec::new(), false)
            .unwrap();
        let result = store.create_link(&p("alice"), "same", b"t".to_vec(), Vec::new(), false);
        assert!(matches!(result, Err(LedgerError::DuplicateLink(_))));

        clock.advance(Duration::milliseconds(1));
        assert!(store
            .create_link(&p("alice"), "same", b"t".to_vec(), Vec::new(), false)
            .is_ok());
        assert_eq!(store.stats().links, 2);
    }

    #[test]
    fn test_private_link_submission() {
        let store = store();
        let link = store
            .create_link(&p("alice"), "priv", b"t".to_vec(), Vec::new(), true)
            .unwrap();

        let err = store
            .submit_feedback(&p("bob"), &link, b"hi".to_vec())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(store
            .submit_feedback(&p("root"), &link, b"ok".to_vec())
            .is_ok());
    }

    #[test]
    fn test_deleted_link_rejects_everything() {
        let store = store();
        let link = public_link(&store, "a");
        store.delete_link(&p("root"), &link).unwrap();

        assert!(!store.is_active(&link));
        assert!(store.get_full_info(&link).unwrap().is_deleted);
        assert!(matches!(
            store.submit_feedback(&p("bob"), &link, b"x".to_vec()),
            Err(LedgerError::LinkDeleted(_))
        ));
        assert!(matches!(
            store.set_active(&p("root"), &link, true),
            Err(LedgerError::LinkDeleted(_))
        ));
        assert!(matches!(
            store.set_private(&p("root"), &link, true),
            Err(LedgerError::LinkDeleted(_))
        ));
    }

    #[test]
    fn test_self_removal_always_fails() {
        let store = store();
        assert!(matches!(
            store.remove_admin(&p("root"), p("root")),
            Err(LedgerError::SelfRemoval)
        ));

        store.add_admin(&p("root"), p("alice")).unwrap();
        assert!(matches!(
            store.remove_admin(&p("root"), p("root")),
            Err(LedgerError::SelfRemoval)
        ));
        assert_eq!(store.admins(), vec![p("alice"), p("root")]);
    }

    #[test]
    fn test_public_listing_is_subset_of_admin_listing() {
        let store = store();
        let public = public_link(&store, "a");
        let private = store
            .create_link(&p("alice"), "b", b"t".to_vec(), Vec::new(), true)
            .unwrap();
        let inactive = public_link(&store, "c");
        store.set_active(&p("root"), &inactive, false).unwrap();

        let public_ids = store.list_active_public_links();
        let all_ids = store.list_all_active_links(&p("root")).unwrap();

        assert_eq!(public_ids, vec![public]);
        assert!(all_ids.contains(&private));
        assert!(public_ids.iter().all(|id| all_ids.contains(id)));
        assert!(!all_ids.contains(&inactive));
    }

    #[test]
    fn test_set_active_twice_emits_two_notifications() {
        let store = store();
        let link = public_link(&store, "a");
        let mut rx = store.subscribe();

        store.set_active(&p("root"), &link, true).unwrap();
        let after_once = store.get_full_info(&link).unwrap();
        store.set_active(&p("root"), &link, true).unwrap();

        assert_eq!(store.get_full_info(&link).unwrap(), after_once);
        let expected = Notification::LinkStatusChanged {
            link_id: link,
            is_active: true,
        };
        assert_eq!(rx.try_recv().unwrap().notification, expected);
        assert_eq!(rx.try_recv().unwrap().notification, expected);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_no_notification_on_failure() {
        let store = store();
        let mut rx = store.subscribe();

        assert!(store.add_admin(&p("eve"), p("mallory")).is_err());
        assert!(store
            .create_link(&p("alice"), "x", Vec::new(), Vec::new(), false)
            .is_err());

        assert!(rx.try_recv().is_err());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_revisions_are_sequential() {
        let store = store();
        let mut rx = store.subscribe();

        store.add_admin(&p("root"), p("alice")).unwrap();
        let link = public_link(&store, "a");
        store.submit_feedback(&p("bob"), &link, b"x".to_vec()).unwrap();

        let revisions: Vec<u64> = (0..3).map(|_| rx.try_recv().unwrap().revision).collect();
        assert_eq!(revisions, vec![1, 2, 3]);
        assert_eq!(store.revision(), 3);
    }

    #[test]
    fn test_end_to_end_private_scenario() {
        let store = Store::in_memory(p("A")).unwrap();
        let link = store
            .create_link(&p("A"), "L", b"bug-reports".to_vec(), Vec::new(), true)
            .unwrap();

        assert!(matches!(
            store.submit_feedback(&p("U"), &link, b"hi".to_vec()),
            Err(LedgerError::Unauthorized(_))
        ));

        let id = store
            .submit_feedback(&p("A"), &link, b"noted".to_vec())
            .unwrap();
        assert_eq!(id, FeedbackId(0));

        assert!(store.list_feedback_ids(&p("U"), &link).unwrap().is_empty());
        assert_eq!(
            store.list_feedback_ids(&p("A"), &link).unwrap(),
            vec![FeedbackId(0)]
        );
    }

    #[test]
    fn test_concurrent_writers_are_serialized() {
        let store = Arc::new(store());
        let link = public_link(&store, "shared");

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let author = p(&format!("user-{}", n));
                    for i in 0..25 {
                        store
                            .submit_feedback(&author, &link, format!("{}-{}", n, i).into_bytes())
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let ids = store.list_feedback_ids(&p("root"), &link).unwrap();
        assert_eq!(ids.len(), 200);
        let expected: Vec<FeedbackId> = (0..200).map(FeedbackId).collect();
        assert_eq!(ids, expected);
        assert_eq!(store.revision(), 201);
    }

    #[test]
    fn test_initialize_and_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let link;
        {
            let store = Store::initialize(config.clone(), p("root")).unwrap();
            assert!(store.is_durable());
            link = public_link(&store, "persisted");
            store
                .submit_feedback(&p("bob"), &link, b"still here".to_vec())
                .unwrap();
        }

        let store = Store::open_with_config(config.clone()).unwrap();
        assert!(store.is_admin(&p("root")));
        assert_eq!(store.revision(), 2);
        assert_eq!(store.list_feedbacks(&link).unwrap()[0].content, b"still here");

        let journal = store.journal().unwrap();
        assert_eq!(journal.len(), 2);
        assert_eq!(journal[0].notification.name(), "LinkCreated");
        assert_eq!(journal[1].revision, 2);

        // Feedback ids continue where they left off
        assert_eq!(
            store
                .submit_feedback(&p("bob"), &link, b"again".to_vec())
                .unwrap(),
            FeedbackId(1)
        );
    }

    #[test]
    fn test_initialize_twice_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        Store::initialize(config.clone(), p("root")).unwrap();
        assert!(Store::initialize(config, p("other")).is_err());
    }

    #[test]
    fn test_initialize_rejects_null_seed() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Store::initialize(test_config(&temp_dir), Principal::null()).is_err());
        assert!(!test_config(&temp_dir).snapshot_path().exists());
    }

    #[test]
    fn test_open_without_ledger_fails() {
        let temp_dir = TempDir::new().unwrap();
        let err = Store::open_with_config(test_config(&temp_dir))
            .err()
            .unwrap();
        assert!(format!("{:#}", err).contains("feedlink init"));
    }

    #[test]
    fn test_failed_persist_aborts_commit() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        let config = Config {
            data_dir: data_dir.clone(),
            ..Config::default()
        };
        let store = Store::initialize(config, p("root")).unwrap();
        let mut rx = store.subscribe();

        // Replace the data directory with a plain file so the next save fails
        std::fs::remove_dir_all(&data_dir).unwrap();
        std::fs::write(&data_dir, b"in the way").unwrap();

        let err = store.add_admin(&p("root"), p("alice")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!store.is_admin(&p("alice")));
        assert_eq!(store.revision(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_failed_snapshot_write_aborts_commit() {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::initialize(test_config(&temp_dir), p("root")).unwrap();
        let mut rx = store.subscribe();

        // The atomic write cannot create its temp file over a directory
        let blocker = temp_dir.path().join("ledger.tmp");
        std::fs::create_dir(&blocker).unwrap();

        let err = store.add_admin(&p("root"), p("alice")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!store.is_admin(&p("alice")));
        assert_eq!(store.revision(), 0);
        assert!(rx.try_recv().is_err());
        assert!(store.journal().unwrap().is_empty());

        std::fs::remove_dir(&blocker).unwrap();
        store.add_admin(&p("root"), p("alice")).unwrap();
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn test_handles_sharing_a_directory_see_each_others_commits() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let link = {
            let store = Store::initialize(config.clone(), p("root")).unwrap();
            public_link(&store, "shared")
        };

        let a = Store::open_with_config(config.clone()).unwrap();
        let b = Store::open_with_config(config.clone()).unwrap();

        let first = a
            .submit_feedback(&p("alice"), &link, b"from a".to_vec())
            .unwrap();
        let second = b
            .submit_feedback(&p("bob"), &link, b"from b".to_vec())
            .unwrap();
        assert_eq!((first, second), (FeedbackId(0), FeedbackId(1)));

        // b reloaded a's commit before applying its own
        assert_eq!(b.list_feedbacks(&link).unwrap().len(), 2);

        let reopened = Store::open_with_config(config).unwrap();
        let entries = reopened.list_feedbacks(&link).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, b"from a");
        assert_eq!(entries[1].content, b"from b");
        assert_eq!(reopened.revision(), 3);

        let revisions: Vec<u64> = reopened
            .journal()
            .unwrap()
            .iter()
            .map(|committed| committed.revision)
            .collect();
        assert_eq!(revisions, vec![1, 2, 3]);
    }

    #[test]
    fn test_rejection_refreshes_stale_handle() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        Store::initialize(config.clone(), p("root")).unwrap();

        let a = Store::open_with_config(config.clone()).unwrap();
        let b = Store::open_with_config(config).unwrap();
        a.add_admin(&p("root"), p("alice")).unwrap();

        // Rejected against the latest state, which b now serves
        let err = b.add_admin(&p("root"), p("alice")).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyAdmin(_)));
        assert!(b.is_admin(&p("alice")));
        assert_eq!(b.revision(), 1);
    }

    #[test]
    fn test_concurrent_handles_allocate_unique_ids() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let link = {
            let store = Store::initialize(config.clone(), p("root")).unwrap();
            public_link(&store, "busy")
        };

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let config = config.clone();
                thread::spawn(move || {
                    let store = Store::open_with_config(config).unwrap();
                    (0..5)
                        .map(|i| {
                            store
                                .submit_feedback(
                                    &p(&format!("worker-{}", worker)),
                                    &link,
                                    format!("{}-{}", worker, i).into_bytes(),
                                )
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<FeedbackId> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        ids.sort();
        assert_eq!(ids, (0..20).map(FeedbackId).collect::<Vec<_>>());

        let reopened = Store::open_with_config(config).unwrap();
        assert_eq!(reopened.list_feedbacks(&link).unwrap().len(), 20);
        assert_eq!(reopened.revision(), 21);
    }

    #[test]
    fn test_stats() {
        let store = store();
        let link = public_link(&store, "a");
        store.submit_feedback(&p("bob"), &link, b"x".to_vec()).unwrap();

        let stats = store.stats();
        assert_eq!(stats.admins, 1);
        assert_eq!(stats.links, 1);
        assert_eq!(stats.feedback, 1);
        assert_eq!(stats.revision, 2);
        assert!(stats.stored_bytes.is_none());
    }
}
