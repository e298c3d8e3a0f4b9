//! Init command handler

use anyhow::{bail, Result};

use feedlink_core::{Config, Principal, Store};

use crate::output::{Output, OutputFormat};

/// Create a new ledger seeded with `admin`
pub fn run(config: Config, admin: Principal, output: &Output) -> Result<()> {
    if admin.is_null() {
        bail!("The seed admin must be a non-empty principal");
    }

    let snapshot_path = config.snapshot_path();
    let store = Store::initialize(config, admin.clone())?;

    match output.format {
        OutputFormat::Json => output.print_json(&serde_json::json!({
            "admin": admin.as_str(),
            "snapshot": snapshot_path,
            "revision": store.revision(),
        })),
        OutputFormat::Quiet => println!("{}", snapshot_path.display()),
        OutputFormat::Human => {
            println!();
            println!("Initialized ledger.");
            println!();
            println!("Seed admin: {}", admin);
            println!("Stored in:  {}", snapshot_path.display());
            println!();
            println!("Act as the admin with: feedlink --as {} admin list", admin);
        }
    }

    Ok(())
}
