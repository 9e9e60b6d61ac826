//! Configuration module for Product Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use product_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, SeedEntry, UserAgentConfig};

// Re-export parser functions
pub use parser::{
    config_hash, load_config, load_config_with_hash, load_config_with_overrides, ConfigOverrides,
    LoadedConfig,
};
pub use validation::validate;
