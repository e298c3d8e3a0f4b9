//! Read-only projections
//!
//! [`QueryEngine`] borrows a committed [`LedgerState`] and reshapes it for a
//! reader. Non-admin observers never see content belonging to a private
//! link, with two exceptions:
//!
//! - a submitter may always list their own past submissions to a link
//!   through [`QueryEngine::list_feedback_by_submitter`];
//! - [`QueryEngine::list_feedbacks`] applies no privacy gate at all.
//!
//! Where a reader is denied visibility, most projections return an empty or
//! redacted result rather than an error, so that "exists but hidden" cannot
//! be told apart from "exists and empty". Unknown ids are still hard errors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::admin::AdminRegistry;
use crate::error::{LedgerError, LedgerResult};
use crate::feedback::FeedbackStore;
use crate::ledger::LedgerState;
use crate::links::{LinkInfo, LinkStore};
use crate::models::{FeedbackId, Link, LinkId, Principal};

/// Placeholder returned instead of private feedback content
pub const REDACTED_CONTENT: &[u8] = b"[private feedback]";

/// A single feedback record as seen by a particular caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackView {
    #[serde(with = "serde_bytes")]
    pub content: Vec<u8>,
    pub timestamp: DateTime<Utc>,
    pub author: Principal,
    /// Whether `content` is the redaction placeholder
    pub redacted: bool,
}

/// A caller's own submission to a link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionEntry {
    #[serde(with = "serde_bytes")]
    pub content: Vec<u8>,
    pub timestamp: DateTime<Utc>,
    pub feedback_id: FeedbackId,
}

/// A feedback record in a full link listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackEntry {
    #[serde(with = "serde_bytes")]
    pub content: Vec<u8>,
    pub author: Principal,
    pub timestamp: DateTime<Utc>,
    pub feedback_id: FeedbackId,
}

pub struct QueryEngine<'a> {
    admins: &'a AdminRegistry,
    links: &'a LinkStore,
    feedback: &'a FeedbackStore,
}

impl<'a> QueryEngine<'a> {
    pub fn new(state: &'a LedgerState) -> Self {
        Self {
            admins: state.admins(),
            links: state.links(),
            feedback: state.feedback(),
        }
    }

    pub fn is_admin(&self, principal: &Principal) -> bool {
        self.admins.is_admin(principal)
    }

    pub fn admins(&self) -> Vec<Principal> {
        self.admins.admins()
    }

    pub fn exists(&self, link_id: &LinkId) -> bool {
        self.links.exists(link_id)
    }

    pub fn get_topic(&self, link_id: &LinkId) -> LedgerResult<(Vec<u8>, Vec<u8>)> {
        self.links
            .get_topic(link_id)
            .map(|(topic, description)| (topic.to_vec(), description.to_vec()))
    }

    pub fn get_full_info(&self, link_id: &LinkId) -> LedgerResult<LinkInfo> {
        self.links.get_full_info(link_id)
    }

    /// Feedback ids of a link, or an empty list when the caller may not see
    /// them (deleted, inactive, or private and caller not admin)
    pub fn list_feedback_ids(
        &self,
        caller: &Principal,
        link_id: &LinkId,
    ) -> LedgerResult<Vec<FeedbackId>> {
        let link = self.links.require(link_id)?;
        if link.is_deleted() || !link.is_active() || !self.may_view(caller, link) {
            debug!(link = %link_id, caller = %caller, "Feedback ids hidden from caller");
            return Ok(Vec::new());
        }
        Ok(link.feedback_ids().to_vec())
    }

    /// One feedback record, with content redacted when the owning link is
    /// private and the caller is not an admin. Author and timestamp are
    /// never redacted.
    pub fn get_feedback(
        &self,
        caller: &Principal,
        feedback_id: FeedbackId,
    ) -> LedgerResult<FeedbackView> {
        let record = self.feedback.get(feedback_id)?;
        let owner = self.links.require(&record.link_id())?;

        let redacted = !self.may_view(caller, owner);
        let content = if redacted {
            debug!(feedback = %feedback_id, caller = %caller, "Redacting private feedback");
            REDACTED_CONTENT.to_vec()
        } else {
            record.content().to_vec()
        };

        Ok(FeedbackView {
            content,
            timestamp: record.timestamp(),
            author: record.author().clone(),
            redacted,
        })
    }

    /// Never fails; unknown links are simply not active
    pub fn is_active(&self, link_id: &LinkId) -> bool {
        self.links.get(link_id).is_some_and(Link::is_active)
    }

    pub fn is_private(&self, link_id: &LinkId) -> LedgerResult<bool> {
        self.links.require(link_id).map(Link::is_private)
    }

    /// Active, non-deleted, public links in creation order
    pub fn list_active_public_links(&self) -> Vec<LinkId> {
        self.links
            .iter()
            .filter(|link| link.is_active() && !link.is_private())
            .map(Link::id)
            .collect()
    }

    /// Active, non-deleted links including private ones. Admins only.
    pub fn list_all_active_links(&self, caller: &Principal) -> LedgerResult<Vec<LinkId>> {
        self.admins.require_admin(caller)?;
        Ok(self
            .links
            .iter()
            .filter(|link| link.is_active())
            .map(Link::id)
            .collect())
    }

    /// Every link in creation order, whatever its state. Admins only.
    pub fn list_all_links(&self, caller: &Principal) -> LedgerResult<Vec<LinkId>> {
        self.admins.require_admin(caller)?;
        Ok(self.links.link_ids())
    }

    /// Every link created by `creator`, deleted ones included
    pub fn list_by_creator(&self, creator: &Principal) -> Vec<LinkInfo> {
        self.links
            .iter()
            .filter(|link| link.creator() == creator)
            .map(LinkInfo::from)
            .collect()
    }

    /// Submissions by `submitter` to a link, in submission order
    ///
    /// Empty when the link is deleted, or when it is private and the caller
    /// is neither an admin nor the submitter.
    pub fn list_feedback_by_submitter(
        &self,
        caller: &Principal,
        link_id: &LinkId,
        submitter: &Principal,
    ) -> LedgerResult<Vec<SubmissionEntry>> {
        let link = self.links.require(link_id)?;
        if link.is_deleted() {
            return Ok(Vec::new());
        }
        if link.is_private() && !(self.admins.is_admin(caller) || caller == submitter) {
            debug!(link = %link_id, caller = %caller, "Submissions hidden from caller");
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for &id in link.feedback_ids() {
            let record = self.feedback.get(id)?;
            if record.author() == submitter {
                entries.push(SubmissionEntry {
                    content: record.content().to_vec(),
                    timestamp: record.timestamp(),
                    feedback_id: id,
                });
            }
        }
        Ok(entries)
    }

    /// Every feedback record of a non-deleted link
    ///
    /// Unlike the other projections this applies no privacy gate.
    pub fn list_feedbacks(&self, link_id: &LinkId) -> LedgerResult<Vec<FeedbackEntry>> {
        let link = self.links.require(link_id)?;
        if link.is_deleted() {
            return Err(LedgerError::LinkDeleted(*link_id));
        }

        link.feedback_ids()
            .iter()
            .map(|&id| {
                let record = self.feedback.get(id)?;
                Ok(FeedbackEntry {
                    content: record.content().to_vec(),
                    author: record.author().clone(),
                    timestamp: record.timestamp(),
                    feedback_id: id,
                })
            })
            .collect()
    }

    fn may_view(&self, caller: &Principal, link: &Link) -> bool {
        !link.is_private() || self.admins.is_admin(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn p(s: &str) -> Principal {
        Principal::new(s)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn state() -> LedgerState {
        LedgerState::new(p("root")).unwrap()
    }

    fn link(state: &mut LedgerState, creator: &str, name: &str, is_private: bool) -> LinkId {
        state
            .create_link(&p(creator), name, b"topic".to_vec(), Vec::new(), is_private, at(1))
            .unwrap()
            .0
    }

    fn submit(state: &mut LedgerState, caller: &str, link: &LinkId, content: &str) -> FeedbackId {
        state
            .submit_feedback(&p(caller), link, content.as_bytes().to_vec(), at(5))
            .unwrap()
            .0
    }

    #[test]
    fn test_list_feedback_ids_visibility() {
        let mut st = state();
        let public = link(&mut st, "alice", "pub", false);
        let private = link(&mut st, "alice", "priv", true);
        let id = submit(&mut st, "bob", &public, "hi");
        let pid = submit(&mut st, "root", &private, "secret");

        let q = QueryEngine::new(&st);
        assert_eq!(q.list_feedback_ids(&p("bob"), &public).unwrap(), vec![id]);
        assert!(q.list_feedback_ids(&p("bob"), &private).unwrap().is_empty());
        assert_eq!(q.list_feedback_ids(&p("root"), &private).unwrap(), vec![pid]);
        // The creator is not privileged
        assert!(q.list_feedback_ids(&p("alice"), &private).unwrap().is_empty());
    }

    #[test]
    fn test_list_feedback_ids_errors_only_for_unknown() {
        let mut st = state();
        let inactive = link(&mut st, "alice", "a", false);
        let deleted = link(&mut st, "alice", "b", false);
        submit(&mut st, "bob", &inactive, "x");
        submit(&mut st, "bob", &deleted, "y");
        st.set_active(&p("root"), &inactive, false).unwrap();
        st.delete_link(&p("root"), &deleted).unwrap();

        let q = QueryEngine::new(&st);
        assert!(q.list_feedback_ids(&p("root"), &inactive).unwrap().is_empty());
        assert!(q.list_feedback_ids(&p("root"), &deleted).unwrap().is_empty());
        assert!(matches!(
            q.list_feedback_ids(&p("root"), &LinkId::from_bytes([0; 32])),
            Err(LedgerError::LinkNotFound(_))
        ));
    }

    #[test]
    fn test_get_feedback_redacts_content_only() {
        let mut st = state();
        let private = link(&mut st, "alice", "priv", true);
        let id = submit(&mut st, "root", &private, "secret");

        let q = QueryEngine::new(&st);
        let hidden = q.get_feedback(&p("bob"), id).unwrap();
        assert!(hidden.redacted);
        assert_eq!(hidden.content, REDACTED_CONTENT);
        assert_eq!(hidden.author, p("root"));
        assert_eq!(hidden.timestamp, at(5));

        let shown = q.get_feedback(&p("root"), id).unwrap();
        assert!(!shown.redacted);
        assert_eq!(shown.content, b"secret");

        assert!(matches!(
            q.get_feedback(&p("root"), FeedbackId(99)),
            Err(LedgerError::FeedbackNotFound(_))
        ));
    }

    #[test]
    fn test_get_feedback_public_link() {
        let mut st = state();
        let public = link(&mut st, "alice", "pub", false);
        let id = submit(&mut st, "bob", &public, "visible");

        let view = QueryEngine::new(&st).get_feedback(&p("carol"), id).unwrap();
        assert!(!view.redacted);
        assert_eq!(view.content, b"visible");
    }

    #[test]
    fn test_redaction_follows_current_privacy() {
        let mut st = state();
        let l = link(&mut st, "alice", "pub", false);
        let id = submit(&mut st, "bob", &l, "was public");
        st.set_private(&p("root"), &l, true).unwrap();

        let view = QueryEngine::new(&st).get_feedback(&p("bob"), id).unwrap();
        assert!(view.redacted);
    }

    #[test]
    fn test_is_active_and_is_private() {
        let mut st = state();
        let l = link(&mut st, "alice", "a", true);
        let missing = LinkId::from_bytes([0; 32]);

        let q = QueryEngine::new(&st);
        assert!(q.is_active(&l));
        assert!(!q.is_active(&missing));
        assert!(q.is_private(&l).unwrap());
        assert!(matches!(
            q.is_private(&missing),
            Err(LedgerError::LinkNotFound(_))
        ));

        st.delete_link(&p("root"), &l).unwrap();
        assert!(!QueryEngine::new(&st).is_active(&l));
    }

    #[test]
    fn test_active_link_listings() {
        let mut st = state();
        let public = link(&mut st, "alice", "a", false);
        let private = link(&mut st, "alice", "b", true);
        let inactive = link(&mut st, "alice", "c", false);
        let deleted = link(&mut st, "alice", "d", false);
        let public2 = link(&mut st, "bob", "e", false);
        st.set_active(&p("root"), &inactive, false).unwrap();
        st.delete_link(&p("root"), &deleted).unwrap();

        let q = QueryEngine::new(&st);
        assert_eq!(q.list_active_public_links(), vec![public, public2]);
        assert_eq!(
            q.list_all_active_links(&p("root")).unwrap(),
            vec![public, private, public2]
        );
        assert!(matches!(
            q.list_all_active_links(&p("alice")),
            Err(LedgerError::Unauthorized(_))
        ));

        assert_eq!(
            q.list_all_links(&p("root")).unwrap(),
            vec![public, private, inactive, deleted, public2]
        );
        assert!(matches!(
            q.list_all_links(&p("alice")),
            Err(LedgerError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_list_by_creator_includes_deleted() {
        let mut st = state();
        let a = link(&mut st, "alice", "a", true);
        let _b = link(&mut st, "bob", "b", false);
        let c = link(&mut st, "alice", "c", false);
        submit(&mut st, "bob", &c, "x");
        st.delete_link(&p("root"), &a).unwrap();

        let infos = QueryEngine::new(&st).list_by_creator(&p("alice"));
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].link_id, a);
        assert!(infos[0].is_deleted);
        assert!(infos[0].is_private);
        assert_eq!(infos[1].link_id, c);
        assert_eq!(infos[1].feedback_count, 1);

        assert!(QueryEngine::new(&st).list_by_creator(&p("nobody")).is_empty());
    }

    #[test]
    fn test_list_feedback_by_submitter_public() {
        let mut st = state();
        let l = link(&mut st, "alice", "a", false);
        let first = submit(&mut st, "bob", &l, "one");
        submit(&mut st, "carol", &l, "other");
        let third = submit(&mut st, "bob", &l, "two");

        let entries = QueryEngine::new(&st)
            .list_feedback_by_submitter(&p("anyone"), &l, &p("bob"))
            .unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.feedback_id).collect();
        assert_eq!(ids, vec![first, third]);
        assert_eq!(entries[0].content, b"one");
        assert_eq!(entries[1].content, b"two");
    }

    #[test]
    fn test_list_feedback_by_submitter_private() {
        let mut st = state();
        st.add_admin(&p("root"), p("ann")).unwrap();
        let l = link(&mut st, "alice", "a", true);
        submit(&mut st, "ann", &l, "mine");
        // ann later loses admin rights but may still see her own submissions
        st.remove_admin(&p("root"), &p("ann")).unwrap();

        let q = QueryEngine::new(&st);
        assert_eq!(
            q.list_feedback_by_submitter(&p("ann"), &l, &p("ann"))
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            q.list_feedback_by_submitter(&p("root"), &l, &p("ann"))
                .unwrap()
                .len(),
            1
        );
        assert!(q
            .list_feedback_by_submitter(&p("bob"), &l, &p("ann"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_list_feedback_by_submitter_deleted_and_unknown() {
        let mut st = state();
        let l = link(&mut st, "alice", "a", false);
        submit(&mut st, "bob", &l, "x");
        st.delete_link(&p("root"), &l).unwrap();

        let q = QueryEngine::new(&st);
        assert!(q
            .list_feedback_by_submitter(&p("bob"), &l, &p("bob"))
            .unwrap()
            .is_empty());
        assert!(matches!(
            q.list_feedback_by_submitter(&p("bob"), &LinkId::from_bytes([0; 32]), &p("bob")),
            Err(LedgerError::LinkNotFound(_))
        ));
    }

    #[test]
    fn test_list_feedbacks_has_no_privacy_gate() {
        let mut st = state();
        let l = link(&mut st, "alice", "a", true);
        let id = submit(&mut st, "root", &l, "secret");

        let entries = QueryEngine::new(&st).list_feedbacks(&l).unwrap();
        assert_eq!(
            entries,
            vec![FeedbackEntry {
                content: b"secret".to_vec(),
                author: p("root"),
                timestamp: at(5),
                feedback_id: id,
            }]
        );
    }

    #[test]
    fn test_list_feedbacks_errors() {
        let mut st = state();
        let l = link(&mut st, "alice", "a", false);
        st.delete_link(&p("root"), &l).unwrap();

        let q = QueryEngine::new(&st);
        assert!(matches!(
            q.list_feedbacks(&l),
            Err(LedgerError::LinkDeleted(_))
        ));
        assert!(matches!(
            q.list_feedbacks(&LinkId::from_bytes([0; 32])),
            Err(LedgerError::LinkNotFound(_))
        ));
    }
}
