//! DocSync CLI
//!
//! Command-line tools for the DocSync local and remote stores.
//!
//! # Commands
//!
//! - `inspect` - Show local collections, counters and seller
//! - `next-number` - Allocate a document number from the local store
//! - `remote status` - Show replica counts in the remote folder
//! - `remote pull` - Back up the merged remote snapshot locally
//! - `remote compact` - Merge and trash redundant remote replicas

mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::{FileConfig, Settings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// DocSync command-line tools.
#[derive(Parser)]
#[command(name = "docsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the local data directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show local collections, counters and seller
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Allocate the next document number from the local store
    NextNumber {
        /// Series code (e.g. A, B)
        #[arg(short, long)]
        series: String,

        /// Document date (YYYY-MM-DD or RFC 3339)
        #[arg(short, long)]
        date: String,

        /// Dry run - show the number without persisting it
        #[arg(long)]
        dry_run: bool,
    },

    /// Remote store commands (token read from $DOCSYNC_TOKEN)
    Remote {
        #[command(subcommand)]
        command: RemoteCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum RemoteCommands {
    /// Show replica counts and duplicates
    Status,

    /// Hydrate from the remote store and write the snapshot locally
    Pull,

    /// Merge every replica into the primary and trash the rest
    Compact {
        /// Collection name or `counters`
        #[arg(short, long)]
        name: String,

        /// Dry run - show what would be done
        #[arg(short, long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(file, cli.path);

    match cli.command {
        Commands::Inspect { format } => {
            commands::inspect::run(&settings, &format).await?;
        }
        Commands::NextNumber {
            series,
            date,
            dry_run,
        } => {
            commands::next_number::run(&settings, &series, &date, dry_run).await?;
        }
        Commands::Remote { command } => match command {
            RemoteCommands::Status => commands::remote::status(&settings).await?,
            RemoteCommands::Pull => commands::remote::pull(&settings).await?,
            RemoteCommands::Compact { name, dry_run } => {
                commands::remote::compact(&settings, &name, dry_run).await?;
            }
        },
        Commands::Version => {
            println!("DocSync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("DocSync Core v{}", docsync_core::VERSION);
        }
    }

    Ok(())
}
