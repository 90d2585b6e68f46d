mod commands;
mod config;
mod remote;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_duplicates, cmd_menu, cmd_profile_set, cmd_profile_show, cmd_search, cmd_sync,
};
use crate::config::Config;
use crate::remote::HttpMenuSource;
use lemon_core::store::LocalStore;
use lemon_core::sync::SyncEngine;

#[derive(Parser)]
#[command(
    name = "lemon",
    version,
    about = "Little Lemon menu, cached locally",
    long_about = "Fetches the Little Lemon menu, keeps a local SQLite copy of it, \
                  and lets you browse it by category."
)]
struct Cli {
    /// Menu document URL (overrides LEMON_MENU_URL)
    #[arg(long, global = true)]
    menu_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the local menu with a fresh copy from the remote endpoint
    Sync {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the cached menu, cheapest first
    Menu {
        /// Category to show: starters, mains, desserts (repeatable, default: all)
        #[arg(short, long = "category")]
        categories: Vec<String>,
        /// Sync from the remote endpoint before showing the menu
        #[arg(long)]
        sync: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search cached menu items by name
    Search {
        /// Text to look for in item names
        query: String,
        /// Restrict to a category (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List item names stored more than once
    Duplicates {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or edit the local profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Serve the cached menu over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show profile fields and the menu header badge
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set profile fields (an empty value clears the field)
    Set {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Avatar image path or URL
        #[arg(long)]
        avatar: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Logs go to stderr so `--json` output stays clean. Filter with `LEMON_LOG`.
fn init_logging() {
    let filter = EnvFilter::try_from_env("LEMON_LOG")
        .unwrap_or_else(|_| EnvFilter::new("lemon=info,lemon_core=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.menu_url)?;
    let store = LocalStore::open(&config.db_path)?;
    let source = Arc::new(HttpMenuSource::new(&config.endpoint.menu_url)?);
    let engine = SyncEngine::new(store.clone(), source, config.endpoint);

    match cli.command {
        Commands::Sync { json } => cmd_sync(&engine, json).await,
        Commands::Menu {
            categories,
            sync,
            json,
        } => cmd_menu(&engine, &categories, sync, json).await,
        Commands::Search {
            query,
            categories,
            json,
        } => cmd_search(&store, &query, &categories, json).await,
        Commands::Duplicates { json } => cmd_duplicates(&store, json).await,
        Commands::Profile { command } => match command {
            ProfileCommands::Show { json } => cmd_profile_show(&store, json),
            ProfileCommands::Set {
                first_name,
                last_name,
                email,
                avatar,
                json,
            } => cmd_profile_set(
                &store,
                first_name.as_deref(),
                last_name.as_deref(),
                email.as_deref(),
                avatar.as_deref(),
                json,
            ),
        },
        Commands::Serve { port, bind } => server::start_server(engine, port, &bind).await,
    }
}
