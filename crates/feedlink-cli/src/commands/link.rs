//! Link command handlers

use anyhow::{Context, Result};
use serde_json::json;

use feedlink_core::{LinkInfo, Principal, Store};

use crate::commands::{parse_link_id, require_identity};
use crate::editor::confirm;
use crate::output::{lossy, Output, OutputFormat};

/// Create a new link owned by the caller
pub fn create(
    store: &Store,
    caller: &Principal,
    name: String,
    topic: String,
    description: Option<String>,
    private: bool,
    output: &Output,
) -> Result<()> {
    require_identity(caller)?;

    let link_id = store
        .create_link(
            caller,
            name,
            topic.into_bytes(),
            description.map(String::into_bytes).unwrap_or_default(),
            private,
        )
        .context("Failed to create link")?;

    output.success(&format!("Created link: {}", link_id));
    output.print_link(&store.get_full_info(&link_id)?);

    Ok(())
}

/// Activate or deactivate a link
pub fn set_active(
    store: &Store,
    caller: &Principal,
    id: &str,
    is_active: bool,
    output: &Output,
) -> Result<()> {
    let link_id = parse_link_id(id, store, caller)?;
    store
        .set_active(caller, &link_id, is_active)
        .context("Failed to change link status")?;

    let verb = if is_active { "Activated" } else { "Deactivated" };
    output.success(&format!("{} link: {}", verb, link_id));
    if !output.should_prompt() {
        output.print_link(&store.get_full_info(&link_id)?);
    }
    Ok(())
}

/// Make a link private or public
pub fn set_private(
    store: &Store,
    caller: &Principal,
    id: &str,
    is_private: bool,
    output: &Output,
) -> Result<()> {
    let link_id = parse_link_id(id, store, caller)?;
    store
        .set_private(caller, &link_id, is_private)
        .context("Failed to change link privacy")?;

    let label = if is_private { "private" } else { "public" };
    output.success(&format!("Link {} is now {}", link_id, label));
    if !output.should_prompt() {
        output.print_link(&store.get_full_info(&link_id)?);
    }
    Ok(())
}

/// Delete a link
pub fn delete(store: &Store, caller: &Principal, id: &str, yes: bool, output: &Output) -> Result<()> {
    let link_id = parse_link_id(id, store, caller)?;
    let info = store.get_full_info(&link_id)?;

    // Confirm deletion
    if !yes && output.should_prompt() && !info.is_deleted {
        println!(
            "Delete link: {} - {} ({} feedback)",
            link_id.short(),
            lossy(&info.topic),
            info.feedback_count
        );
        if !confirm("This cannot be undone. Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store
        .delete_link(caller, &link_id)
        .context("Failed to delete link")?;

    output.success(&format!("Deleted link: {}", link_id));
    if !output.should_prompt() {
        output.print_link(&store.get_full_info(&link_id)?);
    }
    Ok(())
}

/// Show a single link
pub fn show(store: &Store, caller: &Principal, id: &str, output: &Output) -> Result<()> {
    let link_id = parse_link_id(id, store, caller)?;
    output.print_link(&store.get_full_info(&link_id)?);
    Ok(())
}

/// Show a link's topic and description
pub fn topic(store: &Store, caller: &Principal, id: &str, output: &Output) -> Result<()> {
    let link_id = parse_link_id(id, store, caller)?;
    let (topic, description) = store.get_topic(&link_id)?;

    match output.format {
        OutputFormat::Json => output.print_json(&json!({
            "link_id": link_id.to_string(),
            "topic": lossy(&topic),
            "description": lossy(&description),
        })),
        OutputFormat::Quiet => println!("{}", lossy(&topic)),
        OutputFormat::Human => {
            println!("{}", lossy(&topic));
            if !description.is_empty() {
                println!();
                println!("{}", lossy(&description));
            }
        }
    }
    Ok(())
}

/// List links
///
/// Defaults to active public links. `--all` adds private ones for admins;
/// `--creator` lists one creator's links in every state.
pub fn list(
    store: &Store,
    caller: &Principal,
    all: bool,
    creator: Option<Principal>,
    output: &Output,
) -> Result<()> {
    let links: Vec<LinkInfo> = if let Some(creator) = creator {
        store.list_by_creator(&creator)
    } else {
        let ids = if all {
            store
                .list_all_active_links(caller)
                .context("Listing private links requires admin privileges")?
        } else {
            store.list_active_public_links()
        };
        ids.iter()
            .map(|link_id| store.get_full_info(link_id))
            .collect::<Result<Vec<_>, _>>()?
    };

    output.print_links(&links);
    Ok(())
}
