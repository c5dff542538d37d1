//! Orgreg CLI
//!
//! Command-line interface for orgreg - a registry of local organizations.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing::debug;

use orgreg_core::{
    AuditLog, BackupRotator, CategoryRegistry, Config, HttpMirror, Registry, SyncDirection,
    SyncEngine, SyncRequest,
};

mod commands;
mod output;
mod prompt;
mod session;

use commands::record::RecordFields;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "orgreg")]
#[command(about = "Orgreg - registry of local organizations")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a record
    Add {
        /// Organization name
        name: String,
        #[command(flatten)]
        fields: RecordFields,
        /// Skip the duplicate tax id confirmation
        #[arg(long)]
        force: bool,
    },
    /// List records
    #[command(alias = "ls")]
    List {
        /// Filter by category
        #[arg(short, long)]
        kind: Option<String>,
        /// Search in name, director, comment, phone and tax id
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show record details
    Show {
        /// Record ID (full UUID or prefix)
        id: String,
    },
    /// Edit a record
    Edit {
        /// Record ID (full UUID or prefix)
        id: String,
        /// New organization name
        #[arg(short, long)]
        name: Option<String>,
        #[command(flatten)]
        fields: RecordFields,
        /// Skip the duplicate tax id confirmation
        #[arg(long)]
        force: bool,
    },
    /// Move a record to the trash
    #[command(alias = "rm")]
    Delete {
        /// Record ID (full UUID or prefix)
        id: String,
    },
    /// Manage the trash
    Trash {
        #[command(subcommand)]
        command: TrashCommands,
    },
    /// Manage categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Report records sharing a tax id
    #[command(alias = "dupes")]
    Duplicates,
    /// Sync with the remote mirror
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Show status
    Status,
    /// Show the audit trail
    Audit {
        /// Maximum number of entries to show
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum TrashCommands {
    /// List trashed records
    #[command(alias = "ls")]
    List,
    /// Restore a trashed record
    Restore {
        /// Record ID (full UUID or prefix)
        id: String,
    },
    /// Permanently delete a trashed record
    Purge {
        /// Record ID (full UUID or prefix)
        id: String,
    },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List categories
    #[command(alias = "ls")]
    List,
    /// Add a category
    Add {
        /// Category name
        name: String,
    },
    /// Remove a user category
    #[command(alias = "rm")]
    Remove {
        /// Category name
        name: String,
    },
}

#[derive(Subcommand)]
enum SyncCommands {
    /// Upload the local collection to the mirror
    Push {
        /// Mirror link, key or name (defaults to the configured mirror)
        target: Option<String>,
    },
    /// Replace the local collection with the mirror contents
    Pull {
        /// Mirror link, key or name (defaults to the configured mirror)
        target: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, mirror, sync_enabled, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    init_logging();

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), &output);
    }

    let mut config = Config::load()?;
    let actor = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    debug!(data_dir = %config.data_dir.display(), actor = %actor, "Loaded configuration");

    // Destructive operations sit behind the access-code window
    if is_protected(&cli.command) {
        session::ensure_authorized(&config)?;
    }

    let registry = Arc::new(Mutex::new(Registry::open(&config)?));
    let mut categories = CategoryRegistry::open(&config)?;
    let mut audit = AuditLog::open(&config);
    let backups = BackupRotator::new(&config);

    // Snapshot the pre-mutation state before anything changes
    let is_write = is_mutation(&cli.command);
    if is_write {
        backups.snapshot();
    }

    let result = match cli.command {
        Commands::Add {
            name,
            fields,
            force,
        } => {
            let mut reg = registry.lock().await;
            commands::record::add(
                &mut reg,
                &categories,
                &mut audit,
                &actor,
                name,
                fields,
                force,
                &output,
            )
        }
        Commands::List { kind, search } => {
            let reg = registry.lock().await;
            commands::record::list(&reg, &categories, kind, search, &output)
        }
        Commands::Show { id } => {
            let reg = registry.lock().await;
            commands::record::show(&reg, id, &output)
        }
        Commands::Edit {
            id,
            name,
            fields,
            force,
        } => {
            let mut reg = registry.lock().await;
            commands::record::edit(
                &mut reg,
                &categories,
                &mut audit,
                &actor,
                id,
                name,
                fields,
                force,
                &output,
            )
        }
        Commands::Delete { id } => {
            let mut reg = registry.lock().await;
            commands::record::delete(&mut reg, &mut audit, &actor, id, &output)
        }
        Commands::Trash { command } => {
            let mut reg = registry.lock().await;
            match command {
                TrashCommands::List => commands::trash::list(&reg, &output),
                TrashCommands::Restore { id } => {
                    commands::trash::restore(&mut reg, &mut audit, &actor, id, &output)
                }
                TrashCommands::Purge { id } => {
                    commands::trash::purge(&mut reg, &mut audit, &actor, id, &output)
                }
            }
        }
        Commands::Category { command } => match command {
            CategoryCommands::List => commands::category::list(&categories, &output),
            CategoryCommands::Add { name } => {
                commands::category::add(&mut categories, &mut audit, &actor, name, &output)
            }
            CategoryCommands::Remove { name } => {
                commands::category::remove(&mut categories, &mut audit, &actor, name, &output)
            }
        },
        Commands::Duplicates => {
            let reg = registry.lock().await;
            commands::dupes::report(&reg, &output)
        }
        Commands::Sync { command } => {
            let (direction, target) = match command {
                SyncCommands::Push { target } => (SyncDirection::Upload, target),
                SyncCommands::Pull { target } => (SyncDirection::Download, target),
            };
            commands::sync::run(
                registry.clone(),
                &mut config,
                &mut audit,
                &actor,
                direction,
                target,
                &output,
            )
            .await
        }
        Commands::Status => {
            let reg = registry.lock().await;
            commands::status::show(&config, &reg, &audit, &output)
        }
        Commands::Audit { limit } => commands::audit::show(&audit, limit, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
    };

    // Push the new state to the mirror after successful local mutations
    if is_write && result.is_ok() {
        silent_sync(&config, registry).await;
    }

    result
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}

/// Commands gated behind the access-code window
fn is_protected(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Delete { .. }
            | Commands::Trash {
                command: TrashCommands::Restore { .. } | TrashCommands::Purge { .. }
            }
            | Commands::Category {
                command: CategoryCommands::Add { .. } | CategoryCommands::Remove { .. }
            }
    )
}

/// Commands that mutate the record collections
fn is_mutation(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Add { .. }
            | Commands::Edit { .. }
            | Commands::Delete { .. }
            | Commands::Trash {
                command: TrashCommands::Restore { .. } | TrashCommands::Purge { .. }
            }
            | Commands::Sync {
                command: SyncCommands::Pull { .. }
            }
    )
}

/// Enqueue a background upload after a mutation, fire-and-forget
///
/// Failures never surface here; the engine logs them. The queue is
/// drained before the process exits so the upload still happens.
async fn silent_sync(config: &Config, registry: Arc<Mutex<Registry>>) {
    if !config.sync_enabled || config.mirror.is_none() {
        return;
    }

    let engine = SyncEngine::new(registry, HttpMirror::new(config), config);
    let handle = engine.spawn();
    handle.enqueue(SyncRequest::silent());
    handle.shutdown().await;
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("orgreg_core=warn,orgreg=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
