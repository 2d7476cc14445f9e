//! Debounce aggregator
//!
//! Collapses event storms into discrete batches. Every event resets the
//! quiescence deadline, so a continuous stream postpones the flush until
//! the stream actually pauses. There is no maximum batch size or latency.

use sitewatch_core::{EventBatch, RawEvent};
use std::mem;
use std::time::{Duration, Instant};

/// Aggregator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No pending batch, timer disarmed
    Idle,
    /// Batch non-empty, timer armed
    Accumulating,
}

/// Pending batch plus the single logical debounce timer
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: EventBatch,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: EventBatch::new(),
            deadline: None,
        }
    }

    /// Append an event and re-arm the timer for a full window from `now`
    pub fn push(&mut self, event: RawEvent, now: Instant) {
        self.pending.push(event);
        self.deadline = Some(now + self.window);
    }

    pub fn state(&self) -> DebounceState {
        if self.deadline.is_some() {
            DebounceState::Accumulating
        } else {
            DebounceState::Idle
        }
    }

    /// When the pending batch is due, if one is pending
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline, saturating at zero
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.map(|d| now >= d).unwrap_or(false)
    }

    /// Take the pending batch and disarm the timer
    pub fn take(&mut self) -> Option<EventBatch> {
        self.deadline = None;
        if self.pending.is_empty() {
            None
        } else {
            Some(mem::take(&mut self.pending))
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
