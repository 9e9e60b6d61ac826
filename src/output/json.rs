//! JSON file output
//!
//! Writes a pretty-printed object mapping each domain to the array of its
//! product-page URLs.

use crate::output::traits::{OutputError, OutputHandler, OutputResult, ProductUrls};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes results to a JSON file, creating parent directories as needed
#[derive(Debug, Clone)]
pub struct JsonOutput {
    path: PathBuf,
}

impl JsonOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: std::io::Error) -> OutputError {
        OutputError::Write {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl OutputHandler for JsonOutput {
    fn write_products(&self, products: &ProductUrls) -> OutputResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
            }
        }

        let json = serde_json::to_string_pretty(products)?;
        fs::write(&self.path, json).map_err(|e| self.write_error(e))?;

        tracing::info!(
            path = %self.path.display(),
            domains = products.len(),
            urls = products.values().map(Vec::len).sum::<usize>(),
            "Wrote product URLs"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
