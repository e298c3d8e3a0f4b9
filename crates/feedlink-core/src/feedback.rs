//! Feedback store
//!
//! An append-only arena of immutable [`Feedback`] records indexed by their
//! global sequential id. Records are never moved, compacted or removed, so an
//! id stays valid forever. Each record carries its owning link, which makes
//! the arena itself the feedback-to-link reverse index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::admin::AdminRegistry;
use crate::error::{LedgerError, LedgerResult};
use crate::events::Notification;
use crate::links::LinkStore;
use crate::models::{Feedback, FeedbackId, LinkId, Principal};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackStore {
    /// Position == id
    records: Vec<Feedback>,
}

impl FeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit feedback against a link
    ///
    /// A private link accepts submissions only from admins; its creator gets
    /// no special treatment.
    pub fn submit_feedback(
        &mut self,
        links: &mut LinkStore,
        admins: &AdminRegistry,
        caller: &Principal,
        link_id: &LinkId,
        content: Vec<u8>,
        now: DateTime<Utc>,
    ) -> LedgerResult<(FeedbackId, Notification)> {
        let link = links.require_live(link_id)?;
        if !link.is_active() {
            return Err(LedgerError::LinkInactive(*link_id));
        }
        if content.is_empty() {
            return Err(LedgerError::EmptyContent);
        }
        if link.is_private() && !admins.is_admin(caller) {
            return Err(LedgerError::Unauthorized(caller.clone()));
        }
        let (is_active, is_private) = (link.is_active(), link.is_private());

        let feedback_id = self.next_id();
        let link = links
            .get_mut(link_id)
            .ok_or(LedgerError::LinkNotFound(*link_id))?;
        link.push_feedback(feedback_id);
        self.records.push(Feedback::new(
            feedback_id,
            *link_id,
            caller.clone(),
            content,
            now,
        ));

        Ok((
            feedback_id,
            Notification::FeedbackSubmitted {
                feedback_id,
                link_id: *link_id,
                author: caller.clone(),
                timestamp: now,
                is_active,
                is_private,
            },
        ))
    }

    /// Raw record lookup, without any redaction
    pub fn get(&self, feedback_id: FeedbackId) -> LedgerResult<&Feedback> {
        usize::try_from(feedback_id.value())
            .ok()
            .and_then(|pos| self.records.get(pos))
            .ok_or(LedgerError::FeedbackNotFound(feedback_id))
    }

    /// The id the next submission will receive
    pub fn next_id(&self) -> FeedbackId {
        FeedbackId(self.records.len() as u64)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
