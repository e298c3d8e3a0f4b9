//! Status command handler

use anyhow::Result;

use feedlink_core::{Principal, Store};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(store: &Store, caller: &Principal, output: &Output) -> Result<()> {
    let stats = store.stats();
    let data_dir = store.config().map(|config| config.data_dir.clone());
    let is_admin = store.is_admin(caller);

    match output.format {
        OutputFormat::Json => output.print_json(&serde_json::json!({
            "data_dir": data_dir,
            "caller": caller.as_str(),
            "caller_is_admin": is_admin,
            "revision": stats.revision,
            "counts": {
                "admins": stats.admins,
                "links": stats.links,
                "feedback": stats.feedback,
            },
            "stored_bytes": stats.stored_bytes,
        })),
        OutputFormat::Quiet => {
            println!("{}", stats.revision);
        }
        OutputFormat::Human => {
            println!("feedlink Status");
            println!("===============");
            println!();
            if let Some(dir) = &data_dir {
                println!("Data directory: {}", dir.display());
            }
            println!("Revision:       {}", stats.revision);
            println!();
            println!("Caller:");
            if caller.is_null() {
                println!("  (anonymous)");
            } else {
                println!(
                    "  {}{}",
                    caller,
                    if is_admin { " (admin)" } else { "" }
                );
            }
            println!();
            println!("Counts:");
            println!("  Admins:   {}", stats.admins);
            println!("  Links:    {}", stats.links);
            println!("  Feedback: {}", stats.feedback);
            if let Some(bytes) = stats.stored_bytes {
                println!();
                println!("Storage: {}", format_bytes(bytes));
            }
        }
    }

    Ok(())
}

/// Format bytes as human-readable string
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
