//! Output module for materializing crawl results
//!
//! This module handles:
//! - Writing the domain to product URLs mapping (JSON)
//! - Recording and displaying run statistics

mod json;
pub mod stats;
mod traits;

pub use json::JsonOutput;
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputHandler, OutputResult, ProductUrls};
