//! Debounced event batches and the query helpers subscribers use on them
//!
//! A batch keeps every raw event in arrival order. Nothing is coalesced or
//! de-duplicated here; helpers that want unique paths compute them on demand.

use crate::event::{extension_matches, Op, RawEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Ordered sequence of raw events accumulated between two flushes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBatch {
    events: Vec<RawEvent>,
}

impl EventBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, preserving arrival order
    pub fn push(&mut self, event: RawEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[RawEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawEvent> {
        self.events.iter()
    }

    /// Whether any event path has extension `ext` (`"md"` or `".md"`)
    pub fn contains_extension(&self, ext: &str) -> bool {
        self.events.iter().any(|e| extension_matches(&e.path, ext))
    }

    /// Whether any event path has one of the given extensions
    pub fn contains_any_extension<S: AsRef<str>>(&self, exts: &[S]) -> bool {
        self.events
            .iter()
            .any(|e| exts.iter().any(|ext| extension_matches(&e.path, ext.as_ref())))
    }

    /// Paths with extension `ext`, in arrival order (duplicates included)
    pub fn paths_with_extension<'a>(&'a self, ext: &'a str) -> impl Iterator<Item = &'a Path> + 'a {
        self.events
            .iter()
            .filter(move |e| extension_matches(&e.path, ext))
            .map(|e| e.path.as_path())
    }

    /// Whether any event has the given operation
    pub fn contains_op(&self, op: Op) -> bool {
        self.events.iter().any(|e| e.op == op)
    }

    /// Whether any event path lies at or under `prefix`
    pub fn under(&self, prefix: &Path) -> bool {
        self.events.iter().any(|e| e.path.starts_with(prefix))
    }

    /// Distinct paths in first-seen order
    pub fn unique_paths(&self) -> Vec<&Path> {
        let mut seen = HashSet::new();
        self.events
            .iter()
            .map(|e| e.path.as_path())
            .filter(|p| seen.insert(*p))
            .collect()
    }
}

impl From<Vec<RawEvent>> for EventBatch {
    fn from(events: Vec<RawEvent>) -> Self {
        Self { events }
    }
}

impl FromIterator<RawEvent> for EventBatch {
    fn from_iter<I: IntoIterator<Item = RawEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a EventBatch {
    type Item = &'a RawEvent;
    type IntoIter = std::slice::Iter<'a, RawEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
