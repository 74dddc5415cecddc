//! LinkStash CLI
//!
//! Command-line tools for a file-backed LinkStash bookmark store.
//!
//! # Commands
//!
//! - `status` - Show the sync watermark, pending count, and backend status
//! - `pending` - List journal entries awaiting sync
//! - `add` / `remove` - Mutate bookmarks and record the changes
//! - `sync` - Run a sync round against a remote server

mod commands;
mod http;

use clap::{Parser, Subcommand};
use linkstash_storage::{FileStore, KeyValueStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// LinkStash command-line bookmark tools.
#[derive(Parser)]
#[command(name = "linkstash")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the state file
    #[arg(global = true, long, default_value = "linkstash.json")]
    data: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the sync watermark, pending count, and backend status
    Status,

    /// List journal entries awaiting sync
    Pending,

    /// Add or update a bookmark
    Add {
        /// The URL to bookmark
        url: String,

        /// Display title (defaults to the URL)
        #[arg(short, long)]
        title: Option<String>,

        /// Tags, repeatable
        #[arg(short = 'g', long = "tag")]
        tags: Vec<String>,
    },

    /// Remove a bookmark
    Remove {
        /// The URL to remove
        url: String,
    },

    /// Run a sync round against a remote server
    Sync {
        /// Base URL of the sync server
        #[arg(long)]
        server: String,

        /// Bearer credential
        #[arg(long)]
        token: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> commands::CommandResult {
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open_with_create_dirs(&cli.data)?);

    match cli.command {
        Commands::Status => commands::status(store),
        Commands::Pending => commands::pending(store),
        Commands::Add { url, title, tags } => commands::add(store, url, title, tags),
        Commands::Remove { url } => commands::remove(store, url),
        Commands::Sync { server, token } => commands::sync(store, server, token),
    }
}
