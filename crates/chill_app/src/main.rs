// SPDX-License-Identifier: MIT OR Apache-2.0
//! Chill - node-based modeling front end for the slicer.
//!
//! Documents are processing graphs built from script nodes. This binary
//! manages them from the command line:
//! - List the node library
//! - Create, inspect and edit documents
//! - Export the generated program and launch the slicer on it

mod commands;
mod context;
mod history;
mod library;
mod settings;

use clap::{Parser, Subcommand};
use context::AppContext;
use settings::{Settings, SETTINGS_FILE_NAME};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chill")]
#[command(author, version, about = "Chill node editor", long_about = None)]
struct Cli {
    /// Settings file
    #[arg(long, global = true, default_value = SETTINGS_FILE_NAME)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available nodes
    Nodes,

    /// Create an empty document
    New(commands::DocumentArgs),

    /// Summarize a document
    Info(commands::DocumentArgs),

    /// Print the declarative script of a document
    Script(commands::DocumentArgs),

    /// Generate the slicer program for a document
    Export(commands::ExportArgs),

    /// Export a document and open it in the slicer
    Slice(commands::DocumentArgs),

    /// Edit a document with line commands read from standard input
    Edit(commands::DocumentArgs),
}

fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chill_app=info,chill_graph=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::debug!("Starting Chill v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load_or_default(&cli.settings)?;
    let library = library::scan(&settings.node_dirs);
    let mut ctx = AppContext::new(settings, library);

    match cli.command {
        Commands::Nodes => commands::nodes(&ctx),
        Commands::New(args) => commands::new(&mut ctx, args),
        Commands::Info(args) => commands::info(&mut ctx, args),
        Commands::Script(args) => commands::script(&mut ctx, args),
        Commands::Export(args) => commands::export(&mut ctx, args),
        Commands::Slice(args) => commands::slice(&mut ctx, args),
        Commands::Edit(args) => commands::edit(&mut ctx, args),
    }
}
