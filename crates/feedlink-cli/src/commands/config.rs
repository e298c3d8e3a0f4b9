//! Config command handler

use std::path::PathBuf;

use anyhow::Result;

use feedlink_core::Config;

use crate::output::{Output, OutputFormat};

/// Show the effective configuration
pub fn show(config: &Config, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    match output.format {
        OutputFormat::Json => output.print_json(&serde_json::json!({
            "data_dir": config.data_dir,
            "principal": config.principal,
            "log_level": config.log_level,
            "log_file": config.log_file,
            "notification_capacity": config.notification_capacity,
        })),
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:              {}", config.data_dir.display());
            println!(
                "  principal:             {}",
                config.principal.as_deref().unwrap_or("(not set)")
            );
            println!(
                "  log_level:             {}",
                config.log_level.as_deref().unwrap_or("(not set)")
            );
            println!(
                "  log_file:              {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!("  notification_capacity: {}", config.notification_capacity);
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}
