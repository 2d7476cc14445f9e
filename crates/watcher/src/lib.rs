//! File system watching for Sitewatch
//!
//! This crate provides the change-detection core:
//! - Directory-level watches kept in step with the tree as it changes
//! - Debouncing of event storms into ordered batches
//! - Fan-out of every batch to any number of subscribers
//!
//! A [`Watcher`] owns one background thread. Handles talk to it over a
//! command channel, so every method takes `&self` and the handle can be
//! shared between threads.

pub mod config;
pub mod debounce;
pub mod error;
pub mod registry;
pub mod source;
pub mod watchset;
mod worker;

pub use config::WatcherConfig;
pub use error::{Result, WatchError};
pub use registry::{ChannelSubscriber, FnSubscriber, Subscriber};
pub use sitewatch_core::{EventBatch, Op, RawEvent};
pub use source::{EventSource, NotifySource, SourceEvent};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use tracing::{debug, warn};
use worker::{Command, Worker};

/// Handle to a running watcher
///
/// Dropping the handle stops the watcher.
pub struct Watcher {
    commands: Sender<Command>,
    worker: Mutex<Option<JoinHandle<Result<()>>>>,
    worker_id: ThreadId,
}

impl Watcher {
    /// Start a watcher on the platform's native backend
    ///
    /// Nothing is watched until [`Watcher::watch`] is called.
    pub fn new(config: WatcherConfig) -> Result<Self> {
        config.validate()?;

        // Unbounded: reactive watch() calls round-trip through the platform
        // thread, which must never be parked on a full queue meanwhile
        let (tx, rx) = unbounded();
        let source = NotifySource::new(tx)?;
        Self::with_source(source, rx, config)
    }

    /// Start a watcher and register every root, failing on the first bad one
    pub fn with_roots<I, P>(roots: I, config: WatcherConfig) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let watcher = Self::new(config)?;
        for root in roots {
            watcher.watch(root)?;
        }
        Ok(watcher)
    }

    /// Start a watcher over a custom event source
    ///
    /// `events` must carry the raw events for the paths `source` is asked
    /// to watch.
    pub fn with_source<S: EventSource>(
        source: S,
        events: Receiver<SourceEvent>,
        config: WatcherConfig,
    ) -> Result<Self> {
        config.validate()?;

        let (commands, command_rx) = unbounded();
        let worker = Worker::new(source, config.debounce());
        let handle = thread::Builder::new()
            .name("sitewatch-watcher".to_string())
            .spawn(move || worker.run(events, command_rx))
            .map_err(WatchError::Spawn)?;

        Ok(Self {
            commands,
            worker_id: handle.thread().id(),
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Watch `root` and every directory below it
    ///
    /// Returns the number of newly watched paths. A missing root fails with
    /// [`WatchError::RootNotFound`]; the watcher keeps running either way.
    pub fn watch(&self, root: impl AsRef<Path>) -> Result<usize> {
        let path = root.as_ref().to_path_buf();
        self.request(|reply| Command::AddRoot { path, reply })?
    }

    /// Stop watching `path` and everything watched below it
    pub fn unwatch(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref().to_path_buf();
        self.request(|reply| Command::Unwatch { path, reply })?
    }

    /// Snapshot of the watched paths, sorted
    pub fn watched(&self) -> Result<Vec<PathBuf>> {
        self.request(|reply| Command::Watched { reply })
    }

    /// Register a subscriber
    ///
    /// When this returns, the subscriber is guaranteed to receive every
    /// batch flushed from then on. Earlier batches are never replayed.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> Result<()> {
        self.request(|reply| Command::Subscribe { subscriber, reply })
    }

    /// Register a closure as a subscriber
    pub fn subscribe_fn<F>(&self, f: F) -> Result<()>
    where
        F: Fn(Arc<EventBatch>) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnSubscriber(f)))
    }

    /// Register a subscriber that forwards batches into a channel
    ///
    /// The channel disconnects once the watcher stops.
    pub fn subscribe_channel(&self) -> Result<Receiver<Arc<EventBatch>>> {
        let (tx, rx) = unbounded();
        self.subscribe(Arc::new(ChannelSubscriber::new(tx)))?;
        Ok(rx)
    }

    /// Whether the worker loop is still alive
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stop the watcher and return how the worker loop ended
    ///
    /// The first call reports the loop's result, including a fatal error
    /// that ended it earlier; later calls return `Ok(())`. Calling this
    /// from inside a subscriber asks the loop to stop without waiting.
    pub fn stop(&self) -> Result<()> {
        let handle = self.worker.lock().take();
        let Some(handle) = handle else {
            return Ok(());
        };

        // The loop may already have exited on its own
        let _ = self.commands.send(Command::Stop);

        if thread::current().id() == self.worker_id {
            debug!("Stop requested from the watcher thread, not joining");
            return Ok(());
        }

        handle.join().map_err(|_| WatchError::WorkerPanicked)?
    }

    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command) -> Result<T> {
        if thread::current().id() == self.worker_id {
            return Err(WatchError::Reentrant);
        }

        let (reply, response) = bounded(1);
        self.commands
            .send(make(reply))
            .map_err(|_| WatchError::Stopped)?;
        response.recv().map_err(|_| WatchError::Stopped)
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Watcher stopped with error: {}", e);
        }
    }
}
