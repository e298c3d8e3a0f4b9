//! Change notifications
//!
//! Exactly one [`Notification`] is emitted for each committed mutation and
//! none for a rejected one. External observers track the ledger incrementally
//! by consuming these in revision order.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{FeedbackId, LinkId, Principal};

/// A record of a successful state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    AdminAdded {
        admin: Principal,
    },
    AdminRemoved {
        admin: Principal,
    },
    LinkCreated {
        link_id: LinkId,
        creator: Principal,
        is_private: bool,
    },
    LinkStatusChanged {
        link_id: LinkId,
        is_active: bool,
    },
    LinkPrivacyChanged {
        link_id: LinkId,
        is_private: bool,
    },
    LinkDeleted {
        link_id: LinkId,
    },
    FeedbackSubmitted {
        feedback_id: FeedbackId,
        link_id: LinkId,
        author: Principal,
        timestamp: DateTime<Utc>,
        is_active: bool,
        is_private: bool,
    },
}

impl Notification {
    /// Stable event name
    pub fn name(&self) -> &'static str {
        match self {
            Notification::AdminAdded { .. } => "AdminAdded",
            Notification::AdminRemoved { .. } => "AdminRemoved",
            Notification::LinkCreated { .. } => "LinkCreated",
            Notification::LinkStatusChanged { .. } => "LinkStatusChanged",
            Notification::LinkPrivacyChanged { .. } => "LinkPrivacyChanged",
            Notification::LinkDeleted { .. } => "LinkDeleted",
            Notification::FeedbackSubmitted { .. } => "FeedbackSubmitted",
        }
    }

    /// The link this notification concerns, if any
    pub fn link_id(&self) -> Option<LinkId> {
        match self {
            Notification::AdminAdded { .. } | Notification::AdminRemoved { .. } => None,
            Notification::LinkCreated { link_id, .. }
            | Notification::LinkStatusChanged { link_id, .. }
            | Notification::LinkPrivacyChanged { link_id, .. }
            | Notification::LinkDeleted { link_id }
            | Notification::FeedbackSubmitted { link_id, .. } => Some(*link_id),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::AdminAdded { admin } | Notification::AdminRemoved { admin } => {
                write!(f, "{}({})", self.name(), admin)
            }
            Notification::LinkCreated {
                link_id,
                creator,
                is_private,
            } => write!(
                f,
                "{}({}, creator={}, private={})",
                self.name(),
                link_id,
                creator,
                is_private
            ),
            Notification::LinkStatusChanged { link_id, is_active } => {
                write!(f, "{}({}, active={})", self.name(), link_id, is_active)
            }
            Notification::LinkPrivacyChanged {
                link_id,
                is_private,
            } => write!(f, "{}({}, private={})", self.name(), link_id, is_private),
            Notification::LinkDeleted { link_id } => write!(f, "{}({})", self.name(), link_id),
            Notification::FeedbackSubmitted {
                feedback_id,
                link_id,
                author,
                ..
            } => write!(
                f,
                "{}(#{}, {}, author={})",
                self.name(),
                feedback_id,
                link_id,
                author
            ),
        }
    }
}

/// A notification as published by a committed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Committed {
    /// Ledger revision produced by this commit, starting at 1
    pub revision: u64,
    /// When the commit was applied
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub notification: Notification,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_json_shape() {
        let n = Notification::LinkStatusChanged {
            link_id: LinkId::from_bytes([3; 32]),
            is_active: false,
        };
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["event"], "link_status_changed");
        assert_eq!(value["is_active"], false);
        assert_eq!(n.name(), "LinkStatusChanged");
    }

    #[test]
    fn test_committed_roundtrip_through_json_line() {
        let committed = Committed {
            revision: 4,
            at: Utc::now(),
            notification: Notification::AdminAdded {
                admin: Principal::new("bob"),
            },
        };
        let line = serde_json::to_string(&committed).unwrap();
        assert!(!line.contains('\n'));
        let parsed: Committed = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, committed);
    }

    #[test]
    fn test_link_id_accessor() {
        let id = LinkId::from_bytes([9; 32]);
        assert_eq!(Notification::LinkDeleted { link_id: id }.link_id(), Some(id));
        assert_eq!(
            Notification::AdminRemoved {
                admin: Principal::new("x")
            }
            .link_id(),
            None
        );
    }
}
