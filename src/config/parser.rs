//! Config file loading
//!
//! The file is read once. Its SHA-256 is taken over the exact text that is
//! parsed, command-line overrides are applied on top, seed entries are tidied
//! and only then is the result validated.

use crate::config::types::{Config, SeedEntry};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Settings that replace values from the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output: Option<PathBuf>,
    pub workers: Option<u32>,
    pub max_depth: Option<u32>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.output {
            config.output.path = path.display().to_string();
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(depth) = self.max_depth {
            config.crawler.max_depth = depth;
        }
    }
}

/// A validated configuration and the hash of the file text it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// Hex-encoded SHA-256 of the file content, before overrides
    pub hash: String,
}

/// Loads and validates a configuration file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use product_scout::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with_overrides(path, &ConfigOverrides::default()).map(|loaded| loaded.config)
}

/// Loads a configuration and returns it with the hash of the parsed text
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let loaded = load_config_with_overrides(path, &ConfigOverrides::default())?;
    Ok((loaded.config, loaded.hash))
}

/// Loads a configuration, applies `overrides` and validates the result
///
/// Validation runs after the overrides, so a flag can repair or break a
/// value from the file.
pub fn load_config_with_overrides(
    path: &Path,
    overrides: &ConfigOverrides,
) -> Result<LoadedConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let hash = config_hash(&content);

    let mut config: Config = toml::from_str(&content)?;
    overrides.apply(&mut config);
    tidy_seeds(&mut config.seeds);
    validate(&config)?;

    Ok(LoadedConfig { config, hash })
}

/// Hex-encoded SHA-256 of config text
pub fn config_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Trims seed URLs and drops repeated entries, keeping the first
fn tidy_seeds(seeds: &mut Vec<SeedEntry>) {
    let mut seen = HashSet::new();
    seeds.retain_mut(|seed| {
        let trimmed = seed.url.trim();
        if trimmed.len() != seed.url.len() {
            seed.url = trimmed.to_string();
        }
        if seen.insert(seed.url.clone()) {
            true
        } else {
            tracing::debug!(seed = %seed.url, "Ignoring repeated seed");
            false
        }
    });
}
