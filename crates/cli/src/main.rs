//! Sitewatch CLI - sitewatch command

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;
mod config;
mod util;

/// Sitewatch - debounced change notifications for site source trees
#[derive(Parser)]
#[command(name = "sitewatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: ./sitewatch.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch directory trees and print each debounced batch
    Watch {
        /// Roots to watch (default: roots from the config file, else ".")
        roots: Vec<PathBuf>,

        /// Quiescence window in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,

        /// Only print batches touching these extensions (repeatable)
        #[arg(long = "ext")]
        extensions: Vec<String>,

        /// Print one JSON object per batch
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config {
        /// Print an example sitewatch.toml instead
        #[arg(long)]
        example: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so batch output on stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Watch { roots, debounce_ms, extensions, json } => {
            let args = cmd::watch::WatchArgs { roots, debounce_ms, extensions, json };
            cmd::watch::run(cli.config.as_deref(), args).await
        }
        Commands::Config { example } => {
            if example {
                cmd::config::run_example().await
            } else {
                cmd::config::run_show(cli.config.as_deref()).await
            }
        }
    }
}
