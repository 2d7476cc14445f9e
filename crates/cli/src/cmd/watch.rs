//! Watch directory trees and print debounced batches
//!
//! Batches go to stdout, logs to stderr. Runs until Ctrl+C or until the
//! watcher stops on its own after a fatal error.

use crate::config::{self, Overrides, Settings};
use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use watcher::{EventBatch, Watcher};

/// How often the loop checks that the watcher thread is still alive
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_millis(500);

/// Arguments to `sitewatch watch`
#[derive(Debug, Clone, Default)]
pub struct WatchArgs {
    pub roots: Vec<PathBuf>,
    pub debounce_ms: Option<u64>,
    pub extensions: Vec<String>,
    pub json: bool,
}

pub async fn run(config_path: Option<&Path>, args: WatchArgs) -> Result<()> {
    // 1. Resolve settings from the config file and flags
    let loaded = config::load(config_path)?;
    let settings = Settings::resolve(
        &loaded,
        Overrides {
            roots: args.roots,
            debounce_ms: args.debounce_ms,
            extensions: args.extensions,
            json: args.json,
        },
    );

    // 2. Start the watcher and subscribe before any root is registered
    let watcher = Watcher::new(settings.watcher.clone()).context("Failed to start watcher")?;
    let batches = watcher
        .subscribe_channel()
        .context("Failed to subscribe to watcher")?;

    // 3. Register roots
    let mut roots = Vec::with_capacity(settings.roots.len());
    for root in &settings.roots {
        let count = watcher
            .watch(root)
            .with_context(|| format!("Failed to watch {}", root.display()))?;
        // Event paths are canonical, so display relative to the canonical root
        let canonical = std::fs::canonicalize(root).unwrap_or_else(|_| root.clone());
        debug!("Watching {} ({} directories)", canonical.display(), count);
        roots.push(canonical);
    }

    if !settings.json {
        print_banner(&settings, &roots);
    }

    // 4. Print batches off the async runtime
    let printer = {
        let roots = roots.clone();
        let extensions = settings.extensions.clone();
        let json = settings.json;
        tokio::task::spawn_blocking(move || {
            for batch in batches {
                if !util::is_relevant(&batch, &extensions) {
                    debug!("Skipping batch of {} events (extension filter)", batch.len());
                    continue;
                }
                if print_batch(&batch, &roots, json).is_err() {
                    // stdout closed
                    break;
                }
            }
        })
    };

    // 5. Wait for Ctrl+C or for the watcher to die
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut health = tokio::time::interval(HEALTH_CHECK_INTERVAL);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl+C")?;
                info!("Received Ctrl+C, shutting down");
                break;
            }
            _ = health.tick() => {
                if !watcher.is_running() {
                    break;
                }
            }
        }
    }

    // 6. Stop the watcher; this closes the subscriber channel and ends the printer
    let stopped = watcher.stop();
    printer.await.context("Batch printer task failed")?;
    stopped.context("Watcher stopped with an error")?;

    if !settings.json {
        println!("{}", "Stopped".dimmed());
    }

    Ok(())
}

fn print_banner(settings: &Settings, roots: &[PathBuf]) {
    println!("{}", "Watching".bold());
    for root in roots {
        println!("  {}", root.display().to_string().cyan());
    }
    println!(
        "{}",
        format!(
            "debounce {}ms, {}",
            settings.watcher.debounce_ms,
            if settings.extensions.is_empty() {
                "all extensions".to_string()
            } else {
                format!("extensions: {}", settings.extensions.join(", "))
            }
        )
        .dimmed()
    );
    println!("{}", "Press Ctrl+C to stop".dimmed());
    println!();
}

fn print_batch(batch: &Arc<EventBatch>, roots: &[PathBuf], json: bool) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if json {
        let value = util::batch_to_json(batch, util::now_unix_ms());
        writeln!(out, "{}", value)?;
    } else {
        for line in util::format_batch(batch, roots) {
            writeln!(out, "{}", line)?;
        }
    }
    out.flush()
}
