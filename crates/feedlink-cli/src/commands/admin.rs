//! Admin command handlers

use anyhow::{Context, Result};
use serde_json::json;

use feedlink_core::{Principal, Store};

use crate::commands::require_identity;
use crate::output::{Output, OutputFormat};

/// Grant admin privileges to `target`
pub fn add(store: &Store, caller: &Principal, target: Principal, output: &Output) -> Result<()> {
    require_identity(caller)?;
    store
        .add_admin(caller, target.clone())
        .with_context(|| format!("Failed to add admin '{}'", target))?;

    output.success(&format!("Added admin: {}", target));
    report(output, &target, true);
    Ok(())
}

/// Revoke admin privileges from `target`
pub fn remove(store: &Store, caller: &Principal, target: Principal, output: &Output) -> Result<()> {
    require_identity(caller)?;
    store
        .remove_admin(caller, target.clone())
        .with_context(|| format!("Failed to remove admin '{}'", target))?;

    output.success(&format!("Removed admin: {}", target));
    report(output, &target, false);
    Ok(())
}

/// List every admin
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let admins = store.admins();

    match output.format {
        OutputFormat::Json => {
            output.print_json(&json!(admins.iter().map(Principal::as_str).collect::<Vec<_>>()))
        }
        OutputFormat::Quiet | OutputFormat::Human => {
            for admin in &admins {
                println!("{}", admin);
            }
            output.message(&format!("\n{} admin(s)", admins.len()));
        }
    }
    Ok(())
}

/// Report whether `target` is an admin
pub fn check(store: &Store, target: &Principal, output: &Output) -> Result<()> {
    let is_admin = store.is_admin(target);

    match output.format {
        OutputFormat::Json => report(output, target, is_admin),
        OutputFormat::Quiet => println!("{}", is_admin),
        OutputFormat::Human => {
            let name = if target.is_null() {
                "(anonymous)"
            } else {
                target.as_str()
            };
            if is_admin {
                println!("{} is an admin", name);
            } else {
                println!("{} is not an admin", name);
            }
        }
    }
    Ok(())
}

fn report(output: &Output, target: &Principal, is_admin: bool) {
    if output.is_json() {
        output.print_json(&json!({
            "principal": target.as_str(),
            "is_admin": is_admin,
        }));
    }
}
