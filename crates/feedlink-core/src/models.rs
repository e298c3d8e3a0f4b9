//! Data models for feedlink
//!
//! Defines the core records: [`Link`] and [`Feedback`], together with the
//! identifiers that tie them to callers ([`Principal`]) and to each other
//! ([`LinkId`], [`FeedbackId`]).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// An authenticated caller identity
///
/// The hosting environment authenticates callers; the ledger only compares
/// principals for equality. The empty string is the null principal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Create a principal from its textual identity
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The null principal, never a valid admin target
    pub fn null() -> Self {
        Self(String::new())
    }

    /// Whether this is the null principal (empty or whitespace-only)
    pub fn is_null(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Principal {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Principal {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Errors parsing a [`LinkId`] from text
#[derive(Error, Debug)]
pub enum LinkIdError {
    #[error("Invalid base58check encoding: {0}")]
    Encoding(#[from] bs58::decode::Error),

    #[error("Invalid link ID length: expected 32 bytes, got {0}")]
    Length(usize),
}

/// Identity of a link
///
/// A SHA-256 digest over the creator, the caller-supplied name and the
/// creation time. Rendered as base58check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LinkId([u8; 32]);

impl LinkId {
    /// Derive the identity of a link created by `creator` under `name` at `at`
    ///
    /// Each field is length-prefixed so that distinct inputs never share an
    /// encoding.
    pub fn derive(name: &str, creator: &Principal, at: DateTime<Utc>) -> Self {
        let nanos = at
            .timestamp_nanos_opt()
            .unwrap_or_else(|| at.timestamp_millis().saturating_mul(1_000_000));

        let mut hasher = Sha256::new();
        hasher.update((name.len() as u64).to_be_bytes());
        hasher.update(name.as_bytes());
        hasher.update((creator.as_str().len() as u64).to_be_bytes());
        hasher.update(creator.as_str().as_bytes());
        hasher.update(nanos.to_be_bytes());
        Self(hasher.finalize().into())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_bs58check(&self) -> String {
        bs58::encode(self.0).with_check().into_string()
    }

    pub fn from_bs58check(s: &str) -> Result<Self, LinkIdError> {
        let bytes = bs58::decode(s.trim()).with_check(None).into_vec()?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| LinkIdError::Length(bytes.len()))?;
        Ok(Self(bytes))
    }

    /// Short prefix for list output
    pub fn short(&self) -> String {
        self.to_bs58check().chars().take(8).collect()
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bs58check())
    }
}

impl FromStr for LinkId {
    type Err = LinkIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bs58check(s)
    }
}

impl TryFrom<String> for LinkId {
    type Error = LinkIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_bs58check(&s)
    }
}

impl From<LinkId> for String {
    fn from(id: LinkId) -> Self {
        id.to_bs58check()
    }
}

/// Sequential feedback identifier, unique across the whole store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackId(pub u64);

impl FeedbackId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FeedbackId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(FeedbackId)
    }
}

/// Lifecycle of a link
///
/// `Active` and `Inactive` toggle freely; `Deleted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Active,
    Inactive,
    Deleted,
}

impl LinkStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, LinkStatus::Active)
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, LinkStatus::Deleted)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LinkStatus::Active => "active",
            LinkStatus::Inactive => "inactive",
            LinkStatus::Deleted => "deleted",
        };
        write!(f, "{}", label)
    }
}

/// A feedback-collection channel
///
/// Fields are private: the only way to change a link is through the
/// transitions below, each of which refuses to touch a deleted link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    id: LinkId,
    creator: Principal,
    #[serde(with = "serde_bytes")]
    topic: Vec<u8>,
    #[serde(with = "serde_bytes")]
    description: Vec<u8>,
    status: LinkStatus,
    is_private: bool,
    /// Append-only, in submission order
    feedback_ids: Vec<FeedbackId>,
    created_at: DateTime<Utc>,
}

impl Link {
    pub(crate) fn new(
        id: LinkId,
        creator: Principal,
        topic: Vec<u8>,
        description: Vec<u8>,
        is_private: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            creator,
            topic,
            description,
            status: LinkStatus::Active,
            is_private,
            feedback_ids: Vec::new(),
            created_at,
        }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn creator(&self) -> &Principal {
        &self.creator
    }

    pub fn topic(&self) -> &[u8] {
        &self.topic
    }

    pub fn description(&self) -> &[u8] {
        &self.description
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_deleted(&self) -> bool {
        self.status.is_deleted()
    }

    pub fn is_private(&self) -> bool {
        self.is_private
    }

    pub fn feedback_ids(&self) -> &[FeedbackId] {
        &self.feedback_ids
    }

    pub fn feedback_count(&self) -> usize {
        self.feedback_ids.len()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Toggle between active and inactive. Returns `false` if deleted.
    pub(crate) fn set_active(&mut self, is_active: bool) -> bool {
        if self.is_deleted() {
            return false;
        }
        self.status = if is_active {
            LinkStatus::Active
        } else {
            LinkStatus::Inactive
        };
        true
    }

    /// Change privacy. Returns `false` if deleted.
    pub(crate) fn set_private(&mut self, is_private: bool) -> bool {
        if self.is_deleted() {
            return false;
        }
        self.is_private = is_private;
        true
    }

    /// Move to the terminal state. Returns `false` if already deleted.
    pub(crate) fn mark_deleted(&mut self) -> bool {
        if self.is_deleted() {
            return false;
        }
        self.status = LinkStatus::Deleted;
        true
    }

    pub(crate) fn push_feedback(&mut self, id: FeedbackId) {
        self.feedback_ids.push(id);
    }
}

/// An immutable feedback submission
///
/// There are no mutators: once stored, author, content and timestamp are
/// fixed for the lifetime of the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feedback {
    id: FeedbackId,
    link_id: LinkId,
    author: Principal,
    #[serde(with = "serde_bytes")]
    content: Vec<u8>,
    timestamp: DateTime<Utc>,
}

impl Feedback {
    pub(crate) fn new(
        id: FeedbackId,
        link_id: LinkId,
        author: Principal,
        content: Vec<u8>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            link_id,
            author,
            content,
            timestamp,
        }
    }

    pub fn id(&self) -> FeedbackId {
        self.id
    }

    /// The link this feedback was submitted against
    pub fn link_id(&self) -> LinkId {
        self.link_id
    }

    pub fn author(&self) -> &Principal {
        &self.author
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
