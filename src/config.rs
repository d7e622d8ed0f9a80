//! Extraction configuration
//!
//! A small TOML file can override which test-type directories are harvested;
//! everything else about the pipeline is fixed by the wrk/dstat formats.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Test-type directories harvested when no config overrides them
const DEFAULT_TEST_TYPES: &[&str] = &["db", "fortune", "json", "plaintext", "query", "update"];

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Test-type directory names considered under each framework
    pub test_types: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            test_types: DEFAULT_TEST_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }
}
