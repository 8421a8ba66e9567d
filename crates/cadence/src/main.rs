//! Cadence CLI - music playlist injection for static documentation sites.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Inject a music playlist and player into static documentation sites")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to cadence.toml config file
    #[arg(short, long, default_value = "cadence.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config and create the music directory
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        yes: bool,
    },

    /// Inject the playlist into every page of a built site
    Inject {
        /// Built site directory (defaults to config or "site")
        #[arg(short, long)]
        site: Option<PathBuf>,

        /// Docs source directory (defaults to config or "docs")
        #[arg(short, long)]
        docs: Option<PathBuf>,

        /// Report changes without writing pages
        #[arg(long)]
        dry_run: bool,

        /// Keep running and re-inject whenever pages are rebuilt
        #[arg(short, long)]
        watch: bool,
    },

    /// Print the discovered playlist as JSON
    Playlist {
        /// Docs source directory (defaults to config or "docs")
        #[arg(short, long)]
        docs: Option<PathBuf>,
    },

    /// Preview a built site
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Directory to serve (defaults to config or "site")
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Run the inject pass before serving
        #[arg(long)]
        inject: bool,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
        Commands::Inject {
            site,
            docs,
            dry_run,
            watch,
        } => {
            commands::inject::run(&cli.config, site, docs, dry_run, watch).await?;
        }
        Commands::Playlist { docs } => {
            commands::playlist::run(&cli.config, docs).await?;
        }
        Commands::Serve {
            port,
            dir,
            inject,
            no_open,
        } => {
            commands::serve::run(&cli.config, port, dir, inject, !no_open).await?;
        }
    }

    Ok(())
}
