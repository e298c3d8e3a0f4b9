//! Events command handler

use anyhow::{Context, Result};

use feedlink_core::Store;

use crate::output::Output;

/// Show journaled notifications, oldest first
pub fn list(store: &Store, limit: Option<usize>, output: &Output) -> Result<()> {
    let mut events = store.journal().context("Failed to read notification journal")?;

    if let Some(limit) = limit {
        let skip = events.len().saturating_sub(limit);
        events.drain(..skip);
    }

    output.print_events(&events);
    Ok(())
}
