//! State module for tracking crawl progress
//!
//! This module provides the run-scoped shared state mutated by workers.
//!
//! # Components
//!
//! - `VisitedSet`: Dedup gate over normalized URLs (atomic check-and-insert)
//! - `ProductMap`: Domain to product-page URLs discovered so far
//! - `CrawlPhase` / `PhaseTracker`: Lifecycle of a crawl run

mod phase;
mod visited;

// Re-export main types
pub use phase::{CrawlPhase, PhaseTracker};
pub use visited::{ProductMap, VisitedSet};
