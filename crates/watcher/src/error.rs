//! Error type for the watcher crate

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or running a watcher
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Watch root does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk directory tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to watch {}: {source}", path.display())]
    WatchPath {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("Watch primitive error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Event queue overflowed, changes were dropped by the platform")]
    Overflow,

    #[error("Failed to spawn watcher thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("Watcher is not running")]
    Stopped,

    #[error("Watcher cannot be called from its own subscriber")]
    Reentrant,

    #[error("Watcher thread panicked")]
    WorkerPanicked,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl WatchError {
    /// Whether the error only says that a path has already gone away
    ///
    /// Such errors are expected while a tree is being deleted and are
    /// never fatal for reactive watch-set updates.
    pub fn is_not_found(&self) -> bool {
        match self {
            WatchError::RootNotFound(_) => true,
            WatchError::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            WatchError::Walk(e) => e
                .io_error()
                .map(|e| e.kind() == io::ErrorKind::NotFound)
                .unwrap_or(false),
            WatchError::WatchPath { source, .. } | WatchError::Notify(source) => {
                notify_not_found(source)
            }
            _ => false,
        }
    }
}

fn notify_not_found(error: &notify::Error) -> bool {
    match &error.kind {
        notify::ErrorKind::PathNotFound | notify::ErrorKind::WatchNotFound => true,
        notify::ErrorKind::Io(e) => e.kind() == io::ErrorKind::NotFound,
        _ => false,
    }
}

/// Result type for watcher operations
pub type Result<T> = std::result::Result<T, WatchError>;
