//! Product Scout: a polite product-page discovery crawler
//!
//! This crate crawls e-commerce sites breadth-first from a set of seed domains,
//! respecting robots.txt and crawl delays, and classifies every visited page
//! with a weighted heuristic to find product pages.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Product Scout operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("No seed URL could be scheduled")]
    NoSeeds,

    #[error("Invalid crawl phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("Worker task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
///
/// Most variants are expected filtering outcomes during link extraction
/// rather than failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("External domain: {0}")]
    ExternalDomain(String),

    #[error("Non-HTML resource: {0}")]
    NonHtmlResource(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Fetch-layer errors
///
/// Callers branch on the kind (see [`FetchError::is_timeout`]) rather than on
/// the message text.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Request failed for {url}: {source}")]
    RequestFailed { url: String, source: reqwest::Error },

    #[error("Non-200 status code {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request cancelled for {url}")]
    Cancelled { url: String },
}

impl FetchError {
    /// Returns true for deadline-class failures that should be skipped, not escalated
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if the request was abandoned because the run was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Result type alias for Product Scout operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, Task};
pub use state::CrawlPhase;
pub use crate::url::{extract_domain, normalize_url};
