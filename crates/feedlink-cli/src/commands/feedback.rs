//! Feedback command handlers

use std::io::Read;

use anyhow::{bail, Context, Result};

use feedlink_core::{FeedbackId, Principal, Store};

use crate::commands::{parse_link_id, require_identity};
use crate::editor::compose_feedback;
use crate::output::{lossy, Output};

/// Submit feedback to a link
///
/// Content comes from the argument, then piped stdin, then the editor.
pub fn submit(
    store: &Store,
    caller: &Principal,
    link_id: &str,
    content: Option<String>,
    output: &Output,
) -> Result<()> {
    require_identity(caller)?;
    let link_id = parse_link_id(link_id, store, caller)?;

    let content = match content {
        Some(content) => content,
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read feedback from stdin")?;
            buffer
        }
        None => {
            let (topic, _) = store.get_topic(&link_id)?;
            let composed = compose_feedback(&lossy(&topic))?;
            if composed.is_empty() {
                bail!("Feedback is empty, nothing submitted.");
            }
            composed
        }
    };

    let feedback_id = store
        .submit_feedback(caller, &link_id, content.into_bytes())
        .context("Failed to submit feedback")?;

    output.success(&format!("Submitted feedback #{} to {}", feedback_id, link_id));
    if output.is_json() {
        output.print_json(&serde_json::json!({
            "feedback_id": feedback_id.value(),
            "link_id": link_id.to_string(),
        }));
    } else if output.is_quiet() {
        println!("{}", feedback_id);
    }
    Ok(())
}

/// Show a single feedback record
pub fn get(store: &Store, caller: &Principal, id: u64, output: &Output) -> Result<()> {
    let feedback_id = FeedbackId(id);
    let view = store.get_feedback(caller, feedback_id)?;
    output.print_feedback(feedback_id, &view);
    Ok(())
}

/// List feedback ids on a link visible to the caller
pub fn ids(store: &Store, caller: &Principal, link_id: &str, output: &Output) -> Result<()> {
    let link_id = parse_link_id(link_id, store, caller)?;
    let ids = store.list_feedback_ids(caller, &link_id)?;
    output.print_feedback_ids(&link_id, &ids);
    Ok(())
}

/// List every feedback record on a link
pub fn list(store: &Store, caller: &Principal, link_id: &str, output: &Output) -> Result<()> {
    let link_id = parse_link_id(link_id, store, caller)?;
    let entries = store.list_feedbacks(&link_id)?;
    output.print_feedback_entries(&entries);
    Ok(())
}

/// List one submitter's feedback on a link
pub fn by_submitter(
    store: &Store,
    caller: &Principal,
    link_id: &str,
    submitter: &Principal,
    output: &Output,
) -> Result<()> {
    let link_id = parse_link_id(link_id, store, caller)?;
    let entries = store.list_feedback_by_submitter(caller, &link_id, submitter)?;
    output.print_submissions(&entries);
    Ok(())
}
