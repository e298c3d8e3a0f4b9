//! Ledger errors
//!
//! Every rejected operation surfaces one of these synchronously. A rejected
//! operation never leaves a partial mutation behind.

use thiserror::Error;

use crate::models::{FeedbackId, LinkId, Principal};
use crate::storage::StorageError;

/// Broad classification of a [`LedgerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller lacks the required privilege
    Authorization,
    /// Malformed input
    Validation,
    /// Operation incompatible with the current entity state
    State,
    /// The commit could not be made durable
    Storage,
}

/// Errors returned by ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Unauthorized: '{0}' lacks the privilege for this operation")]
    Unauthorized(Principal),

    #[error("Invalid target: the null principal cannot be an admin")]
    InvalidTarget,

    #[error("'{0}' is already an admin")]
    AlreadyAdmin(Principal),

    #[error("'{0}' is not an admin")]
    NotAdmin(Principal),

    #[error("An admin cannot remove itself")]
    SelfRemoval,

    #[error("Topic must not be empty")]
    EmptyTopic,

    #[error("Feedback content must not be empty")]
    EmptyContent,

    #[error("Link already exists: {0}")]
    DuplicateLink(LinkId),

    #[error("Link not found: {0}")]
    LinkNotFound(LinkId),

    #[error("Link has been deleted: {0}")]
    LinkDeleted(LinkId),

    #[error("Link is inactive: {0}")]
    LinkInactive(LinkId),

    #[error("Link is already deleted: {0}")]
    AlreadyDeleted(LinkId),

    #[error("Feedback not found: {0}")]
    FeedbackNotFound(FeedbackId),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Unauthorized(_) => ErrorKind::Authorization,
            LedgerError::InvalidTarget | LedgerError::EmptyTopic | LedgerError::EmptyContent => {
                ErrorKind::Validation
            }
            LedgerError::Storage(_) => ErrorKind::Storage,
            LedgerError::AlreadyAdmin(_)
            | LedgerError::NotAdmin(_)
            | LedgerError::SelfRemoval
            | LedgerError::DuplicateLink(_)
            | LedgerError::LinkNotFound(_)
            | LedgerError::LinkDeleted(_)
            | LedgerError::LinkInactive(_)
            | LedgerError::AlreadyDeleted(_)
            | LedgerError::FeedbackNotFound(_) => ErrorKind::State,
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
