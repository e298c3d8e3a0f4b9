//! Link store
//!
//! Owns every [`Link`] and its lifecycle. Links are kept in creation order,
//! which doubles as the global link index, with a position map for lookup by
//! id. Nothing is ever removed: deletion is a terminal status, not an erase.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::admin::AdminRegistry;
use crate::error::{LedgerError, LedgerResult};
use crate::events::Notification;
use crate::models::{Link, LinkId, Principal};

/// Full metadata view of a link, including deleted ones
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkInfo {
    pub link_id: LinkId,
    pub creator: Principal,
    #[serde(with = "serde_bytes")]
    pub topic: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub description: Vec<u8>,
    pub is_active: bool,
    pub is_private: bool,
    pub is_deleted: bool,
    pub feedback_count: usize,
}

impl From<&Link> for LinkInfo {
    fn from(link: &Link) -> Self {
        Self {
            link_id: link.id(),
            creator: link.creator().clone(),
            topic: link.topic().to_vec(),
            description: link.description().to_vec(),
            is_active: link.is_active(),
            is_private: link.is_private(),
            is_deleted: link.is_deleted(),
            feedback_count: link.feedback_count(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Link>", into = "Vec<Link>")]
pub struct LinkStore {
    /// Creation order
    links: Vec<Link>,
    positions: HashMap<LinkId, usize>,
}

impl From<Vec<Link>> for LinkStore {
    fn from(links: Vec<Link>) -> Self {
        let positions = links
            .iter()
            .enumerate()
            .map(|(pos, link)| (link.id(), pos))
            .collect();
        Self { links, positions }
    }
}

impl From<LinkStore> for Vec<Link> {
    fn from(store: LinkStore) -> Self {
        store.links
    }
}

impl LinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new active link. Open to any caller.
    pub fn create_link(
        &mut self,
        caller: &Principal,
        name: &str,
        topic: Vec<u8>,
        description: Vec<u8>,
        is_private: bool,
        now: DateTime<Utc>,
    ) -> LedgerResult<(LinkId, Notification)> {
        if topic.is_empty() {
            return Err(LedgerError::EmptyTopic);
        }

        let link_id = LinkId::derive(name, caller, now);
        if self.exists(&link_id) {
            return Err(LedgerError::DuplicateLink(link_id));
        }

        let link = Link::new(
            link_id,
            caller.clone(),
            topic,
            description,
            is_private,
            now,
        );
        self.positions.insert(link_id, self.links.len());
        self.links.push(link);

        Ok((
            link_id,
            Notification::LinkCreated {
                link_id,
                creator: caller.clone(),
                is_private,
            },
        ))
    }

    pub fn set_active(
        &mut self,
        admins: &AdminRegistry,
        caller: &Principal,
        link_id: &LinkId,
        is_active: bool,
    ) -> LedgerResult<Notification> {
        admins.require_admin(caller)?;
        let link = self.live_mut(link_id)?;
        if !link.set_active(is_active) {
            return Err(LedgerError::LinkDeleted(*link_id));
        }
        Ok(Notification::LinkStatusChanged {
            link_id: *link_id,
            is_active,
        })
    }

    pub fn set_private(
        &mut self,
        admins: &AdminRegistry,
        caller: &Principal,
        link_id: &LinkId,
        is_private: bool,
    ) -> LedgerResult<Notification> {
        admins.require_admin(caller)?;
        let link = self.live_mut(link_id)?;
        if !link.set_private(is_private) {
            return Err(LedgerError::LinkDeleted(*link_id));
        }
        Ok(Notification::LinkPrivacyChanged {
            link_id: *link_id,
            is_private,
        })
    }

    /// Irreversibly delete a link. Its feedback stays in the arena.
    pub fn delete_link(
        &mut self,
        admins: &AdminRegistry,
        caller: &Principal,
        link_id: &LinkId,
    ) -> LedgerResult<Notification> {
        admins.require_admin(caller)?;
        let link = self
            .get_mut(link_id)
            .ok_or(LedgerError::LinkNotFound(*link_id))?;
        if !link.mark_deleted() {
            return Err(LedgerError::AlreadyDeleted(*link_id));
        }
        Ok(Notification::LinkDeleted { link_id: *link_id })
    }

    pub fn exists(&self, link_id: &LinkId) -> bool {
        self.positions.contains_key(link_id)
    }

    pub fn get(&self, link_id: &LinkId) -> Option<&Link> {
        self.positions.get(link_id).map(|&pos| &self.links[pos])
    }

    /// Look up a link, failing with `LinkNotFound`
    pub fn require(&self, link_id: &LinkId) -> LedgerResult<&Link> {
        self.get(link_id).ok_or(LedgerError::LinkNotFound(*link_id))
    }

    /// Look up a link that has not been deleted
    pub fn require_live(&self, link_id: &LinkId) -> LedgerResult<&Link> {
        let link = self.require(link_id)?;
        if link.is_deleted() {
            return Err(LedgerError::LinkDeleted(*link_id));
        }
        Ok(link)
    }

    /// Topic and description of a live link
    pub fn get_topic(&self, link_id: &LinkId) -> LedgerResult<(&[u8], &[u8])> {
        let link = self.require_live(link_id)?;
        Ok((link.topic(), link.description()))
    }

    /// Full metadata. Deleted links remain inspectable here.
    pub fn get_full_info(&self, link_id: &LinkId) -> LedgerResult<LinkInfo> {
        self.require(link_id).map(LinkInfo::from)
    }

    /// All links in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    /// The global link index, in creation order
    pub fn link_ids(&self) -> Vec<LinkId> {
        self.links.iter().map(Link::id).collect()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub(crate) fn get_mut(&mut self, link_id: &LinkId) -> Option<&mut Link> {
        let pos = *self.positions.get(link_id)?;
        self.links.get_mut(pos)
    }

    fn live_mut(&mut self, link_id: &LinkId) -> LedgerResult<&mut Link> {
        let link = self
            .get_mut(link_id)
            .ok_or(LedgerError::LinkNotFound(*link_id))?;
        if link.is_deleted() {
            return Err(LedgerError::LinkDeleted(*link_id));
        }
        Ok(link)
    }
}
