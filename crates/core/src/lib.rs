//! Core types for Sitewatch
//!
//! This crate provides:
//! - Raw change events as produced by the platform watch primitive
//! - Debounced event batches delivered to subscribers
//! - Query helpers subscribers use to decide whether a batch concerns them

pub mod batch;
pub mod event;

// Re-exports
pub use batch::EventBatch;
pub use event::{Op, RawEvent};
