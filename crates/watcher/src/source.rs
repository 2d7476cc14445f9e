//! Event sources: the platform watch primitive behind a small trait
//!
//! The watch-set manager only needs two capabilities from the platform:
//! start observing a single directory and stop observing it. Raw events
//! travel separately, over a channel, so the source never calls back into
//! the worker loop.

use crate::error::{Result, WatchError};
use crossbeam_channel::Sender;
use notify::event::ModifyKind;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use sitewatch_core::{Op, RawEvent};
use std::path::Path;
use tracing::debug;

/// Item carried on the raw event queue
///
/// `Err` is a platform-level failure; the worker decides whether it is fatal.
pub type SourceEvent = Result<RawEvent>;

/// A platform primitive that watches individual directories
///
/// Implementations watch exactly the given path, not its subtree. Keeping
/// the subtree registered is the watch-set manager's job.
pub trait EventSource: Send + 'static {
    /// Start observing `path`
    fn watch(&mut self, path: &Path) -> Result<()>;

    /// Stop observing `path`
    fn unwatch(&mut self, path: &Path) -> Result<()>;
}

/// Event source backed by the `notify` crate's recommended backend
///
/// Dropping the source drops the underlying watcher, which ends its
/// platform thread and closes the raw event queue.
pub struct NotifySource {
    watcher: RecommendedWatcher,
}

impl NotifySource {
    /// Create a source that pushes converted events into `events`
    pub fn new(events: Sender<SourceEvent>) -> Result<Self> {
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| {
                let items = match res {
                    Ok(event) => convert_event(event),
                    Err(e) => vec![Err(WatchError::Notify(e))],
                };

                for item in items {
                    // Receiver gone means the worker has exited
                    if events.send(item).is_err() {
                        return;
                    }
                }
            },
            Config::default(),
        )?;

        Ok(Self { watcher })
    }
}

impl EventSource for NotifySource {
    fn watch(&mut self, path: &Path) -> Result<()> {
        self.watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::WatchPath {
                path: path.to_path_buf(),
                source,
            })
    }

    fn unwatch(&mut self, path: &Path) -> Result<()> {
        self.watcher
            .unwatch(path)
            .map_err(|source| WatchError::WatchPath {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Map a notify event kind onto an operation
///
/// Access notifications (open/close) carry no change and are dropped.
pub fn op_for_kind(kind: &EventKind) -> Option<Op> {
    match kind {
        EventKind::Create(_) => Some(Op::Create),
        EventKind::Remove(_) => Some(Op::Remove),
        EventKind::Modify(ModifyKind::Name(_)) => Some(Op::Rename),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(Op::Chmod),
        EventKind::Modify(_) => Some(Op::Modify),
        EventKind::Any => Some(Op::Modify),
        EventKind::Access(_) | EventKind::Other => None,
    }
}

/// Convert one notify event into queue items, one per affected path
///
/// A rescan request means the platform dropped events; that is reported as
/// an overflow so the worker can stop rather than run with a stale view.
pub fn convert_event(event: notify::Event) -> Vec<SourceEvent> {
    if event.need_rescan() {
        return vec![Err(WatchError::Overflow)];
    }

    let Some(op) = op_for_kind(&event.kind) else {
        debug!("Dropping {:?} for {:?}", event.kind, event.paths);
        return Vec::new();
    };

    event
        .paths
        .into_iter()
        .map(|path| Ok(RawEvent::new(op, path)))
        .collect()
}
