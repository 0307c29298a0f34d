//! Quill CLI - command-line interface for Quill
//!
//! This is the main entry point for running the sync server and
//! managing notes in the local store.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "quill")]
#[command(author = "Quill Contributors")]
#[command(version)]
#[command(about = "Real-time collaborative notes", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Note store location (defaults to the user data directory)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the sync server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Headless mode: bind to 0.0.0.0 for remote access
        #[arg(long)]
        headless: bool,
    },

    /// Create a new note
    Create {
        /// Title for the note (defaults to "Untitled Note")
        title: Option<String>,
    },

    /// List notes, most recently updated first
    List {
        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a note's current content
    Show {
        /// Note id
        id: String,

        /// Print raw JSON instead of the content
        #[arg(long)]
        json: bool,
    },

    /// List a note's saved versions, newest first
    Versions {
        /// Note id
        id: String,
    },

    /// Restore a note to the version saved at a timestamp
    Restore {
        /// Note id
        id: String,

        /// RFC3339 timestamp of the version, as shown by `versions`
        timestamp: String,
    },

    /// Follow a note's live edits from a running server
    Watch {
        /// Note id
        id: String,

        /// Server URL
        #[arg(long, default_value = "ws://127.0.0.1:5000")]
        url: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = cli.data_dir.as_deref();

    let result = match cli.command {
        Commands::Serve { port, headless } => commands::serve(port, headless, data_dir).await,
        Commands::Create { title } => commands::create(title.as_deref(), data_dir),
        Commands::List { json } => commands::list(json, data_dir),
        Commands::Show { id, json } => commands::show(&id, json, data_dir),
        Commands::Versions { id } => commands::versions(&id, data_dir),
        Commands::Restore { id, timestamp } => {
            commands::restore(&id, &timestamp, data_dir).await
        }
        Commands::Watch { id, url } => commands::watch(&id, &url).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
