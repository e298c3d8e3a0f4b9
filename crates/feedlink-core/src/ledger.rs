//! Ledger state
//!
//! [`LedgerState`] is the whole ledger as a single value: admin registry,
//! link store, feedback arena and a revision counter. Every mutating method
//! checks all of its preconditions before touching anything, so a rejected
//! operation leaves the state exactly as it was.
//!
//! [`Operation`] is the serializable form of a mutation, used by the
//! transactional [`Store`](crate::store::Store).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::admin::AdminRegistry;
use crate::error::LedgerResult;
use crate::events::Notification;
use crate::feedback::FeedbackStore;
use crate::links::LinkStore;
use crate::models::{FeedbackId, LinkId, Principal};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerState {
    admins: AdminRegistry,
    links: LinkStore,
    feedback: FeedbackStore,
    /// Number of committed mutations
    revision: u64,
}

impl LedgerState {
    /// A fresh ledger whose only admin is `seed_admin`
    pub fn new(seed_admin: Principal) -> LedgerResult<Self> {
        Ok(Self {
            admins: AdminRegistry::new(seed_admin)?,
            links: LinkStore::new(),
            feedback: FeedbackStore::new(),
            revision: 0,
        })
    }

    pub fn admins(&self) -> &AdminRegistry {
        &self.admins
    }

    pub fn links(&self) -> &LinkStore {
        &self.links
    }

    pub fn feedback(&self) -> &FeedbackStore {
        &self.feedback
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn advance_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    pub fn add_admin(&mut self, caller: &Principal, target: Principal) -> LedgerResult<Notification> {
        self.admins.add_admin(caller, target)
    }

    pub fn remove_admin(
        &mut self,
        caller: &Principal,
        target: &Principal,
    ) -> LedgerResult<Notification> {
        self.admins.remove_admin(caller, target)
    }

    pub fn create_link(
        &mut self,
        caller: &Principal,
        name: &str,
        topic: Vec<u8>,
        description: Vec<u8>,
        is_private: bool,
        now: DateTime<Utc>,
    ) -> LedgerResult<(LinkId, Notification)> {
        self.links
            .create_link(caller, name, topic, description, is_private, now)
    }

    pub fn set_active(
        &mut self,
        caller: &Principal,
        link_id: &LinkId,
        is_active: bool,
    ) -> LedgerResult<Notification> {
        self.links.set_active(&self.admins, caller, link_id, is_active)
    }

    pub fn set_private(
        &mut self,
        caller: &Principal,
        link_id: &LinkId,
        is_private: bool,
    ) -> LedgerResult<Notification> {
        self.links
            .set_private(&self.admins, caller, link_id, is_private)
    }

    pub fn delete_link(&mut self, caller: &Principal, link_id: &LinkId) -> LedgerResult<Notification> {
        self.links.delete_link(&self.admins, caller, link_id)
    }

    pub fn submit_feedback(
        &mut self,
        caller: &Principal,
        link_id: &LinkId,
        content: Vec<u8>,
        now: DateTime<Utc>,
    ) -> LedgerResult<(FeedbackId, Notification)> {
        self.feedback
            .submit_feedback(&mut self.links, &self.admins, caller, link_id, content, now)
    }

    /// Apply one operation on behalf of `caller`
    pub fn apply(
        &mut self,
        caller: &Principal,
        operation: Operation,
        now: DateTime<Utc>,
    ) -> LedgerResult<(Receipt, Notification)> {
        match operation {
            Operation::AddAdmin { target } => self
                .add_admin(caller, target)
                .map(|n| (Receipt::Applied, n)),
            Operation::RemoveAdmin { target } => self
                .remove_admin(caller, &target)
                .map(|n| (Receipt::Applied, n)),
            Operation::CreateLink {
                name,
                topic,
                description,
                is_private,
            } => self
                .create_link(caller, &name, topic, description, is_private, now)
                .map(|(id, n)| (Receipt::Link(id), n)),
            Operation::SetActive { link_id, is_active } => self
                .set_active(caller, &link_id, is_active)
                .map(|n| (Receipt::Applied, n)),
            Operation::SetPrivate {
                link_id,
                is_private,
            } => self
                .set_private(caller, &link_id, is_private)
                .map(|n| (Receipt::Applied, n)),
            Operation::DeleteLink { link_id } => self
                .delete_link(caller, &link_id)
                .map(|n| (Receipt::Applied, n)),
            Operation::SubmitFeedback { link_id, content } => self
                .submit_feedback(caller, &link_id, content, now)
                .map(|(id, n)| (Receipt::Feedback(id), n)),
        }
    }
}

/// A mutating operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    AddAdmin {
        target: Principal,
    },
    RemoveAdmin {
        target: Principal,
    },
    CreateLink {
        name: String,
        #[serde(with = "serde_bytes")]
        topic: Vec<u8>,
        #[serde(with = "serde_bytes")]
        description: Vec<u8>,
        is_private: bool,
    },
    SetActive {
        link_id: LinkId,
        is_active: bool,
    },
    SetPrivate {
        link_id: LinkId,
        is_private: bool,
    },
    DeleteLink {
        link_id: LinkId,
    },
    SubmitFeedback {
        link_id: LinkId,
        #[serde(with = "serde_bytes")]
        content: Vec<u8>,
    },
}

/// What a committed operation allocated, if anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receipt {
    Applied,
    Link(LinkId),
    Feedback(FeedbackId),
}
