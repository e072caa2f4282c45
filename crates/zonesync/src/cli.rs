//! Command-line interface
//!
//! `sync` is the default subcommand, so `zonesync --dry-run` and
//! `zonesync sync --dry-run` are the same invocation.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use zonesync_core::{FilesystemStore, Generate, Result, SyncEngine, SyncOptions};

use crate::providers;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub sync: SyncArgs,

    /// Credentials file mapping provider names to their configuration
    #[arg(
        long,
        global = true,
        env = "ZONESYNC_CONFIG",
        default_value = "config/zonesync.json"
    )]
    pub config: PathBuf,

    /// Log verbosity
    #[arg(
        long,
        global = true,
        env = "ZONESYNC_LOG_LEVEL",
        value_enum,
        default_value_t = LogLevel::Info
    )]
    pub log_level: LogLevel,
}

impl Cli {
    /// The subcommand to run, falling back to `sync`
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Sync(self.sync.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Sync the zone file to the configured DNS provider
    Sync(SyncArgs),
    /// Write a zone file from the configured DNS provider
    Generate(GenerateArgs),
}

impl Command {
    /// Whether operations are only logged
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Command::Sync(args) if args.dry_run)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct SyncArgs {
    /// Path to the zone file
    #[arg(long, default_value = "Zonefile")]
    pub source: PathBuf,

    /// Name of the provider entry in the credentials file
    #[arg(long, default_value = "zonesync")]
    pub destination: String,

    /// Log operations without performing them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip manifest, integrity and conflict checks
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct GenerateArgs {
    /// Name of the provider entry in the credentials file
    #[arg(long, default_value = "zonesync")]
    pub source: String,

    /// Path of the zone file to write
    #[arg(long, default_value = "Zonefile")]
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Run `command` with credentials from `config`
pub async fn execute(command: &Command, config: &Path) -> Result<()> {
    match command {
        Command::Sync(args) => {
            info!(
                "Syncing {} to {}",
                args.source.display(),
                args.destination
            );
            let source = Box::new(FilesystemStore::new(&args.source));
            let destination = providers::named_store(config, &args.destination)?;
            let operations = SyncEngine::new(source, destination)
                .run(SyncOptions {
                    dry_run: args.dry_run,
                    force: args.force,
                })
                .await?;
            info!("Sync finished: {} operation(s)", operations.len());
        }
        Command::Generate(args) => {
            info!(
                "Generating {} from {}",
                args.destination.display(),
                args.source
            );
            let source = providers::named_store(config, &args.source)?;
            let destination = Box::new(FilesystemStore::new(&args.destination));
            Generate::new(source, destination).run().await?;
        }
    }
    Ok(())
}
