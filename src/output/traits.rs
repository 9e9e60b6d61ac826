//! Output handler traits and types
//!
//! This module defines the trait interface for output handlers, which
//! materialize the discovered product URLs once a run is done.

use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output to {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Domain to sorted product-page URLs, as materialized at the end of a run
pub type ProductUrls = BTreeMap<String, Vec<String>>;

/// Trait for output handlers
///
/// Implementations must be thread-safe; the crawler calls
/// [`OutputHandler::write_products`] exactly once per run.
pub trait OutputHandler: Send + Sync {
    /// Persists the final domain to product URLs mapping
    fn write_products(&self, products: &ProductUrls) -> OutputResult<()>;

    /// Human-readable destination, used in log messages
    fn describe(&self) -> String;
}
