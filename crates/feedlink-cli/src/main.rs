//! feedlink CLI
//!
//! Command-line interface for feedlink - feedback links and their submissions.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use feedlink_core::{Config, LedgerError, Principal, StorageError, Store};

mod commands;
mod editor;
mod output;

use output::{Output, OutputFormat};

/// Log level used when neither the config nor the environment set one
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Parser)]
#[command(name = "feedlink")]
#[command(about = "feedlink - Collect feedback through shareable links")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Act as this principal (overrides the configured principal)
    #[arg(long = "as", global = true, value_name = "PRINCIPAL")]
    as_principal: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new ledger with a seed admin
    Init {
        /// The first admin principal
        #[arg(long)]
        admin: String,
    },
    /// Manage admins
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Manage feedback links
    Link {
        #[command(subcommand)]
        command: LinkCommands,
    },
    /// Submit and read feedback
    Feedback {
        #[command(subcommand)]
        command: FeedbackCommands,
    },
    /// Show journaled change notifications
    Events {
        /// Only show the most recent N events
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show ledger status
    Status,
    /// Show configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Grant admin privileges
    Add {
        /// Principal to promote
        principal: String,
    },
    /// Revoke admin privileges
    #[command(alias = "rm")]
    Remove {
        /// Principal to demote
        principal: String,
    },
    /// List admins
    #[command(alias = "ls")]
    List,
    /// Check whether a principal is an admin
    Check {
        /// Principal to check (defaults to the caller)
        principal: Option<String>,
    },
}

#[derive(Subcommand)]
enum LinkCommands {
    /// Create a new link
    #[command(alias = "add")]
    Create {
        /// Name used to derive the link ID
        name: String,
        /// Topic shown to submitters
        #[arg(short, long)]
        topic: String,
        /// Longer description
        #[arg(short, long)]
        description: Option<String>,
        /// Only admins may submit feedback
        #[arg(long)]
        private: bool,
    },
    /// Accept feedback again (admin)
    Activate {
        /// Link ID (full or prefix)
        id: String,
    },
    /// Stop accepting feedback (admin)
    Deactivate {
        /// Link ID (full or prefix)
        id: String,
    },
    /// Restrict submissions to admins (admin)
    Private {
        /// Link ID (full or prefix)
        id: String,
    },
    /// Open submissions to everyone (admin)
    Public {
        /// Link ID (full or prefix)
        id: String,
    },
    /// Delete a link permanently (admin)
    #[command(alias = "rm")]
    Delete {
        /// Link ID (full or prefix)
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show link details
    Show {
        /// Link ID (full or prefix)
        id: String,
    },
    /// Show a link's topic and description
    Topic {
        /// Link ID (full or prefix)
        id: String,
    },
    /// List links
    #[command(alias = "ls")]
    List {
        /// Include private active links (admin)
        #[arg(long, conflicts_with = "creator")]
        all: bool,
        /// Only links created by this principal, in any state
        #[arg(long)]
        creator: Option<String>,
    },
}

#[derive(Subcommand)]
enum FeedbackCommands {
    /// Submit feedback to a link
    Submit {
        /// Link ID (full or prefix)
        link_id: String,
        /// Feedback content (opens editor if not provided)
        content: Option<String>,
    },
    /// Show a single feedback record
    Get {
        /// Feedback ID
        id: u64,
    },
    /// List the feedback IDs of a link visible to the caller
    Ids {
        /// Link ID (full or prefix)
        link_id: String,
    },
    /// List every feedback record of a link
    #[command(alias = "ls")]
    List {
        /// Link ID (full or prefix)
        link_id: String,
    },
    /// List one submitter's feedback on a link
    By {
        /// Link ID (full or prefix)
        link_id: String,
        /// Submitter (defaults to the caller)
        #[arg(long)]
        submitter: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    init_logging(&config);

    // Commands that don't need an existing ledger
    match &cli.command {
        Commands::Config { command } => {
            return handle_config_command(command.clone(), &config, cli.config.as_ref(), &output);
        }
        Commands::Init { admin } => {
            return commands::init::run(config, Principal::new(admin.as_str()), &output);
        }
        _ => {}
    }

    let caller = resolve_caller(cli.as_principal.as_deref(), &config);
    debug!(caller = %caller, "Resolved caller");

    let result = Store::open_with_config(config).and_then(|store| {
        run_store_command(cli.command, &store, &caller, &output)
    });
    if let Err(err) = &result {
        if let Some(hint) = recovery_hint(err) {
            eprintln!("Hint: {}", hint);
        }
    }
    result
}

fn run_store_command(
    command: Commands,
    store: &Store,
    caller: &Principal,
    output: &Output,
) -> Result<()> {
    match command {
        Commands::Init { .. } => unreachable!(),   // Handled above
        Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Admin { command } => handle_admin_command(command, store, caller, output),
        Commands::Link { command } => handle_link_command(command, store, caller, output),
        Commands::Feedback { command } => handle_feedback_command(command, store, caller, output),
        Commands::Events { limit } => commands::events::list(store, limit, output),
        Commands::Status => commands::status::show(store, caller, output),
    }
}

fn handle_admin_command(
    command: AdminCommands,
    store: &Store,
    caller: &Principal,
    output: &Output,
) -> Result<()> {
    match command {
        AdminCommands::Add { principal } => {
            commands::admin::add(store, caller, Principal::new(principal), output)
        }
        AdminCommands::Remove { principal } => {
            commands::admin::remove(store, caller, Principal::new(principal), output)
        }
        AdminCommands::List => commands::admin::list(store, output),
        AdminCommands::Check { principal } => {
            let target = principal.map(Principal::new).unwrap_or_else(|| caller.clone());
            commands::admin::check(store, &target, output)
        }
    }
}

fn handle_link_command(
    command: LinkCommands,
    store: &Store,
    caller: &Principal,
    output: &Output,
) -> Result<()> {
    match command {
        LinkCommands::Create {
            name,
            topic,
            description,
            private,
        } => commands::link::create(store, caller, name, topic, description, private, output),
        LinkCommands::Activate { id } => commands::link::set_active(store, caller, &id, true, output),
        LinkCommands::Deactivate { id } => {
            commands::link::set_active(store, caller, &id, false, output)
        }
        LinkCommands::Private { id } => commands::link::set_private(store, caller, &id, true, output),
        LinkCommands::Public { id } => commands::link::set_private(store, caller, &id, false, output),
        LinkCommands::Delete { id, yes } => commands::link::delete(store, caller, &id, yes, output),
        LinkCommands::Show { id } => commands::link::show(store, caller, &id, output),
        LinkCommands::Topic { id } => commands::link::topic(store, caller, &id, output),
        LinkCommands::List { all, creator } => {
            commands::link::list(store, caller, all, creator.map(Principal::new), output)
        }
    }
}

fn handle_feedback_command(
    command: FeedbackCommands,
    store: &Store,
    caller: &Principal,
    output: &Output,
) -> Result<()> {
    match command {
        FeedbackCommands::Submit { link_id, content } => {
            commands::feedback::submit(store, caller, &link_id, content, output)
        }
        FeedbackCommands::Get { id } => commands::feedback::get(store, caller, id, output),
        FeedbackCommands::Ids { link_id } => commands::feedback::ids(store, caller, &link_id, output),
        FeedbackCommands::List { link_id } => {
            commands::feedback::list(store, caller, &link_id, output)
        }
        FeedbackCommands::By { link_id, submitter } => {
            let submitter = submitter.map(Principal::new).unwrap_or_else(|| caller.clone());
            commands::feedback::by_submitter(store, caller, &link_id, &submitter, output)
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config: &Config,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config, config_path, output),
    }
}

/// Recovery advice for storage faults anywhere in the error chain
fn recovery_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain().find_map(|cause| {
        let storage = cause.downcast_ref::<StorageError>().or_else(|| {
            match cause.downcast_ref::<LedgerError>() {
                Some(LedgerError::Storage(storage)) => Some(storage),
                _ => None,
            }
        })?;
        storage.recovery_suggestion()
    })
}

/// The acting principal: `--as`, then the configured principal, else anonymous
fn resolve_caller(flag: Option<&str>, config: &Config) -> Principal {
    flag.map(Principal::new)
        .or_else(|| config.principal.as_deref().map(Principal::new))
        .unwrap_or_else(Principal::null)
}

/// Initialize logging
///
/// Level comes from the config (or FEEDLINK_LOG_LEVEL), defaulting to warn.
/// Logs go to `log_file` when configured, otherwise to stderr.
fn init_logging(config: &Config) {
    let log_level = config.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL);
    let env_filter = EnvFilter::new(format!(
        "feedlink_core={},feedlink_cli={}",
        log_level, log_level
    ));

    let Some(log_path) = config.log_file.as_ref() else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
        return;
    };

    let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            return;
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .try_init();
}
