//! Configuration command
//!
//! Shows the effective watch settings or prints an example config file.

use crate::config::{self, Overrides, Settings};
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

/// Show the effective configuration
pub async fn run_show(config_path: Option<&Path>) -> Result<()> {
    let loaded = config::load(config_path)?;
    let settings = Settings::resolve(&loaded, Overrides::default());

    println!("{}", "Sitewatch Configuration".bold());
    match &loaded.path {
        Some(path) => println!("{}: {}\n", "Location".dimmed(), path.display().dimmed()),
        None => println!(
            "{}: {}\n",
            "Location".dimmed(),
            format!("none ({} not found, using defaults)", config::CONFIG_FILE).dimmed()
        ),
    }

    println!("{}", "[watch]".yellow());
    println!("  {} =", "roots".cyan());
    for root in &settings.roots {
        println!("    {}", root.display());
    }
    println!(
        "  {} = {} {}",
        "debounce_ms".cyan(),
        settings.watcher.debounce_ms,
        format!("({:?} quiescence window)", settings.watcher.debounce()).dimmed()
    );
    println!(
        "  {} = {}",
        "extensions".cyan(),
        if settings.extensions.is_empty() {
            "(all)".dimmed().to_string()
        } else {
            settings.extensions.join(", ")
        }
    );

    if let Err(e) = settings.watcher.validate() {
        println!("\n{} {}", "Invalid:".red().bold(), e);
    }

    Ok(())
}

/// Print an example configuration file
pub async fn run_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}
