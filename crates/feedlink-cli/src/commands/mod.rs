//! Command handlers

pub mod admin;
pub mod config;
pub mod events;
pub mod feedback;
pub mod init;
pub mod link;
pub mod status;

use std::collections::BTreeSet;

use anyhow::{bail, Result};

use feedlink_core::{LinkId, Principal, Store};

/// Fail unless the caller has an identity
///
/// Writes are attributed to the caller, so anonymous use is read-only.
pub fn require_identity(caller: &Principal) -> Result<()> {
    if caller.is_null() {
        bail!(
            "No principal configured. Pass --as <principal>, set FEEDLINK_PRINCIPAL, \
             or add `principal = \"...\"` to the config file."
        );
    }
    Ok(())
}

/// Parse a link ID (supports full ID or prefix)
///
/// Prefixes only match links the caller could list: active public links,
/// the caller's own links, and every link for admins.
pub fn parse_link_id(id: &str, store: &Store, caller: &Principal) -> Result<LinkId> {
    // Try full ID first
    if let Ok(link_id) = LinkId::from_bs58check(id) {
        return Ok(link_id);
    }

    let prefix = id.trim();
    if prefix.is_empty() {
        bail!("Link ID must not be empty");
    }

    let matches: Vec<LinkId> = visible_link_ids(store, caller)
        .into_iter()
        .filter(|link_id| link_id.to_string().starts_with(prefix))
        .collect();

    match matches.len() {
        0 => bail!("No link found matching: {}", prefix),
        1 => Ok(matches[0]),
        _ => {
            eprintln!("Multiple links match '{}':", prefix);
            for link_id in &matches {
                eprintln!("  {}", link_id);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

fn visible_link_ids(store: &Store, caller: &Principal) -> BTreeSet<LinkId> {
    let mut ids: BTreeSet<LinkId> = store.list_active_public_links().into_iter().collect();
    if caller.is_null() {
        return ids;
    }

    ids.extend(store.list_by_creator(caller).into_iter().map(|info| info.link_id));
    if let Ok(all) = store.list_all_links(caller) {
        ids.extend(all);
    }
    ids
}
