//! Watcher configuration

use crate::error::{Result, WatchError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default quiescence window in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 25;

/// Watcher configuration
///
/// Only the quiescence window is tunable. The raw-event queue between the
/// platform backend and the worker loop is always unbounded: the worker's
/// reactive `watch()` calls are synchronous round trips to the backend's
/// thread, and a backend thread blocked on a full queue could never answer
/// them. A fixed depth would turn a large event burst into a deadlock, so
/// there is no queue-depth setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Quiescence window before a pending batch is flushed (default: 25ms)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl WatcherConfig {
    /// Config with a custom quiescence window
    pub fn with_debounce_ms(debounce_ms: u64) -> Self {
        Self { debounce_ms }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Reject configurations the worker loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.debounce_ms == 0 {
            return Err(WatchError::Config(
                "debounce_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}
