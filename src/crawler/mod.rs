//! Crawler module for product-page discovery
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with timeout-only retries
//! - HTML link extraction and product-page classification
//! - Sitemap bootstrapping
//! - The bounded frontier and the worker pool draining it
//! - Overall crawl coordination

mod classifier;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod pool;
mod sitemap;

pub use classifier::{
    Classification, ProductClassifier, Signal, ANCHOR_DENSITY_RATIO, PRODUCT_THRESHOLD,
    SIGNAL_WEIGHTS,
};
pub use coordinator::Crawler;
pub use fetcher::{build_http_client, Fetcher, MAX_ATTEMPTS};
pub use frontier::{Admission, Frontier, PendingHold, Task};
pub use parser::extract_links;
pub use pool::{TaskHandler, WorkerPool};
pub use sitemap::{is_product_sitemap, parse_sitemap, ParsedSitemap, SitemapDiscoverer};
