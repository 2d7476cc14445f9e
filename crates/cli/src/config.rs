//! Configuration file handling
//!
//! `sitewatch.toml` is optional. Command-line flags override file values,
//! and relative roots in the file resolve against the file's directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use watcher::WatcherConfig;

/// File name looked up in the current directory
pub const CONFIG_FILE: &str = "sitewatch.toml";

/// On-disk configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub watch: WatchSection,
}

/// `[watch]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchSection {
    /// Directory trees to watch
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// Only report batches touching these extensions (empty: everything)
    #[serde(default)]
    pub extensions: Vec<String>,

    #[serde(flatten)]
    pub watcher: WatcherConfig,
}

/// Configuration plus where it came from
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: FileConfig,
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// Directory relative roots in the file are resolved against
    fn base_dir(&self) -> Option<&Path> {
        self.path.as_deref().and_then(Path::parent)
    }
}

/// Fully resolved settings for the watch command
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub roots: Vec<PathBuf>,
    pub extensions: Vec<String>,
    pub watcher: WatcherConfig,
    pub json: bool,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub roots: Vec<PathBuf>,
    pub debounce_ms: Option<u64>,
    pub extensions: Vec<String>,
    pub json: bool,
}

impl Settings {
    pub fn resolve(loaded: &LoadedConfig, overrides: Overrides) -> Self {
        let section = &loaded.config.watch;

        let roots = if !overrides.roots.is_empty() {
            overrides.roots
        } else if !section.roots.is_empty() {
            section
                .roots
                .iter()
                .map(|root| match loaded.base_dir() {
                    Some(base) if root.is_relative() => base.join(root),
                    _ => root.clone(),
                })
                .collect()
        } else {
            vec![PathBuf::from(".")]
        };

        let extensions = if overrides.extensions.is_empty() {
            section.extensions.clone()
        } else {
            overrides.extensions
        };

        let mut watcher = section.watcher.clone();
        if let Some(debounce_ms) = overrides.debounce_ms {
            watcher.debounce_ms = debounce_ms;
        }

        Self {
            roots,
            extensions,
            watcher,
            json: overrides.json,
        }
    }
}

/// Parse configuration from TOML text
pub fn parse(text: &str) -> Result<FileConfig> {
    toml::from_str(text).context("Failed to parse sitewatch configuration")
}

/// Load the config file
///
/// An explicit path must exist. Without one, `./sitewatch.toml` is used when
/// present and defaults otherwise.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = std::env::current_dir()
                .context("Failed to get current directory")?
                .join(CONFIG_FILE);
            if !candidate.exists() {
                return Ok(LoadedConfig::default());
            }
            candidate
        }
    };

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = parse(&text).with_context(|| format!("Invalid config file {}", path.display()))?;

    Ok(LoadedConfig {
        config,
        path: Some(path),
    })
}

/// Example configuration with every key documented
pub fn example_config() -> &'static str {
    r#"# sitewatch.toml

[watch]
# Directory trees to watch; relative paths resolve against this file
roots = ["content", "static"]

# Quiescence window in milliseconds before a batch is flushed
debounce_ms = 25

# Only report batches that touch these extensions (empty: report everything)
extensions = ["md", "html", "css"]
"#
}
