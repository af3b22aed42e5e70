//! Migration configuration via `fedstore.toml`
//!
//! On first use the CLI writes a default `fedstore.toml` next to the store.
//! To change settings, edit the file and re-run.

use serde::{Deserialize, Serialize};
use std::path::Path;

use fedstore_core::{Error, Result};

/// Config file name placed next to the store file.
pub const CONFIG_FILE_NAME: &str = "fedstore.toml";

/// Migration settings loaded from `fedstore.toml`.
///
/// # Example
///
/// ```toml
/// page_size = 500
/// parallelism = 4
/// continue_on_not_found = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrateConfig {
    /// Keys fetched per enumeration page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Worker threads applying per-record updates. 1 = sequential.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Skip (and report) keys deleted between enumeration and update.
    /// When false such a key aborts the run.
    #[serde(default = "default_continue_on_not_found")]
    pub continue_on_not_found: bool,
}

fn default_page_size() -> usize {
    500
}

fn default_parallelism() -> usize {
    1
}

fn default_continue_on_not_found() -> bool {
    true
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            parallelism: default_parallelism(),
            continue_on_not_found: default_continue_on_not_found(),
        }
    }
}

impl MigrateConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `page_size` or `parallelism` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::config("page_size must be greater than 0"));
        }
        if self.parallelism == 0 {
            return Err(Error::config("parallelism must be greater than 0"));
        }
        Ok(())
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: MigrateConfig = toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# fedstore migration configuration
#
# Keys fetched per enumeration page (default: 500)
page_size = 500

# Worker threads applying per-record updates (default: 1 = sequential).
# Updates are independent, so any value converges to the same result.
parallelism = 1

# Skip keys deleted while a migration runs instead of aborting (default: true)
continue_on_not_found = true
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::config(format!("{} ({})", msg, path.display())),
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}
