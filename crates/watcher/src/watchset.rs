//! Watch-set manager
//!
//! Keeps the set of watched directories in step with the directory trees
//! under the roots. The set is plain data, an ordered path set, so a
//! directory and all its descendants form one contiguous range. Two
//! operations mutate it: add-subtree and remove-subtree.

use crate::error::{Result, WatchError};
use crate::source::EventSource;
use sitewatch_core::{Op, RawEvent};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Watched directories plus the source they are registered with
pub struct WatchSet<S: EventSource> {
    source: S,
    watched: BTreeSet<PathBuf>,
}

impl<S: EventSource> WatchSet<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            watched: BTreeSet::new(),
        }
    }

    /// Register `root` and every directory below it
    ///
    /// The root is canonicalized first; a missing root fails with
    /// `RootNotFound`. Returns the number of newly watched paths.
    pub fn add_root(&mut self, root: &Path) -> Result<usize> {
        let root = fs::canonicalize(root).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                WatchError::RootNotFound(root.to_path_buf())
            } else {
                WatchError::Io {
                    path: root.to_path_buf(),
                    source,
                }
            }
        })?;

        let added = self.add_subtree(&root, true)?;
        info!("Watching {} ({} new paths)", root.display(), added);
        Ok(added)
    }

    /// Drop `path` and everything watched below it
    ///
    /// Returns the number of paths removed; unknown paths remove nothing.
    pub fn unwatch(&mut self, path: &Path) -> Result<usize> {
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.remove_subtree(&path, false)
    }

    /// Adjust the watch set for one raw event
    ///
    /// Only creates, removes and renames touch the set. Errors for paths
    /// that vanished in the meantime are swallowed; anything else is fatal.
    ///
    /// A remove or rename naming a path that is a directory on disk means
    /// whatever is registered there may belong to a replaced inode, so the
    /// subtree is registered again from scratch.
    pub fn observe(&mut self, event: &RawEvent) -> Result<()> {
        match event.op {
            Op::Create => {
                if is_dir(&event.path) {
                    self.add_subtree(&event.path, false)?;
                }
            }
            Op::Remove | Op::Rename => {
                if is_dir(&event.path) {
                    self.refresh_subtree(&event.path)?;
                } else if !event.path.exists() {
                    self.remove_subtree(&event.path, false)?;
                }
            }
            Op::Modify | Op::Chmod => {}
        }
        Ok(())
    }

    pub fn is_watched(&self, path: &Path) -> bool {
        self.watched.contains(path)
    }

    /// Snapshot of the watched paths in sorted order
    pub fn watched(&self) -> Vec<PathBuf> {
        self.watched.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.watched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }

    fn add_subtree(&mut self, top: &Path, strict_top: bool) -> Result<usize> {
        let mut added = 0;

        for entry in WalkDir::new(top).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let strict = strict_top && e.depth() == 0;
                    let err = WatchError::Walk(e);
                    if !strict && err.is_not_found() {
                        debug!("Skipping vanished path during walk: {}", err);
                        continue;
                    }
                    return Err(err);
                }
            };

            // The top of the walk may be a single file root
            let is_top = entry.depth() == 0;
            if !entry.file_type().is_dir() && !(is_top && strict_top) {
                continue;
            }

            if self.watched.contains(entry.path()) {
                continue;
            }

            match self.source.watch(entry.path()) {
                Ok(()) => {
                    self.watched.insert(entry.path().to_path_buf());
                    added += 1;
                }
                Err(e) if !(is_top && strict_top) && e.is_not_found() => {
                    debug!("Directory vanished before it could be watched: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        if added > 0 {
            debug!("Added {} watches under {}", added, top.display());
        }
        Ok(added)
    }

    /// Drop every registration under `top`, then walk it again
    fn refresh_subtree(&mut self, top: &Path) -> Result<usize> {
        let removed = self.remove_subtree(top, true)?;
        let added = self.add_subtree(top, false)?;
        debug!(
            "Re-registered {} (dropped {}, watched {})",
            top.display(),
            removed,
            added
        );
        Ok(added)
    }

    /// Drop every registration under `top`, deepest first
    ///
    /// With `stale` set the registrations are known to be out of date, so
    /// any unwatch failure is tolerated.
    fn remove_subtree(&mut self, top: &Path, stale: bool) -> Result<usize> {
        let doomed: Vec<PathBuf> = self
            .watched
            .range(top.to_path_buf()..)
            .take_while(|p| p.starts_with(top))
            .cloned()
            .collect();

        // Deepest first so children are released before their parents
        for path in doomed.iter().rev() {
            // Forget the path even if the platform refuses, so a later
            // recreate registers it again
            self.watched.remove(path);

            if let Err(e) = self.source.unwatch(path) {
                if stale || e.is_not_found() || !path.exists() {
                    debug!("Ignoring unwatch failure for {}: {}", path.display(), e);
                } else {
                    return Err(e);
                }
            }
        }

        if !doomed.is_empty() {
            debug!("Removed {} watches under {}", doomed.len(), top.display());
        }
        Ok(doomed.len())
    }
}

fn is_dir(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.is_dir())
        .unwrap_or(false)
}
