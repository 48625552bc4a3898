//! `fbr-tax.toml` settings.
//!
//! ```toml
//! database_url = "fbr-tax.db"
//! default_tax_year = "2025-26"
//! default_filer_status = "filer"
//! log_level = "info"
//! log_file = "fbr-tax.log"
//! ```
//!
//! Every key is optional. Command-line flags override file values.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fbr_core::FilerStatus;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "fbr-tax.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub backend: String,
    pub database_url: String,
    pub default_tax_year: String,
    pub default_filer_status: FilerStatus,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            database_url: "fbr-tax.db".to_string(),
            default_tax_year: "2025-26".to_string(),
            default_filer_status: FilerStatus::Filer,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl CliConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid configuration")
    }

    /// Reads `path` when given (it must exist), otherwise `./fbr-tax.toml`
    /// if present, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))
    }
}
