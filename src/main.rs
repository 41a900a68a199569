mod commands;
mod plan;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use calsync_core::config::SyncConfig;
use calsync_core::date_range::DateRange;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calsync")]
#[command(about = "Mirror busy time from CalDAV and Google calendars into a single Google calendar")]
struct Cli {
    /// Config file (default: <config dir>/calsync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror the sources into the target calendar
    Sync {
        /// Compute and print the changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Window start (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Window end (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Show the changes the next sync would make
    Status {
        /// Window start (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Window end (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Authorize calsync to use a Google account
    Auth {
        /// Account name the tokens are stored under, e.g. me@gmail.com
        account: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Sync { dry_run, from, to } => {
            let config = SyncConfig::load(cli.config.as_deref())?;
            let range = resolve_range(&config, from.as_deref(), to.as_deref())?;
            commands::sync::run(config, range, dry_run, cli.verbose).await
        }
        Commands::Status { from, to } => {
            let config = SyncConfig::load(cli.config.as_deref())?;
            let range = resolve_range(&config, from.as_deref(), to.as_deref())?;
            commands::status::run(config, range).await
        }
        Commands::Auth { account } => commands::auth::run(&account).await,
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_range(config: &SyncConfig, from: Option<&str>, to: Option<&str>) -> Result<DateRange> {
    DateRange::from_args(from, to, config.past_days, config.future_days)
        .map_err(|e| anyhow::anyhow!(e))
}
