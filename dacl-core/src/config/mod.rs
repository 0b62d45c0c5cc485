//! # DACL Configuration
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Environment Variables          │
//! │    DACL_ROOT=/data/device              │
//! ├─────────────────────────────────────────┤
//! │         Config File (dacl.toml)         │
//! │    [storage]                            │
//! │    root = "/data/device"                │
//! ├─────────────────────────────────────────┤
//! │         Default Values                  │
//! └─────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AclError, Result};

mod loader;

pub use loader::ConfigLoader;

/// Default device root, relative to the working directory
pub const DEFAULT_ROOT: &str = "acl";

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AclConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the device ACL lives
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding `acl.data`
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { root: default_root() }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(DEFAULT_ROOT)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl AclConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| AclError::configuration(format!("Invalid config: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.root.as_os_str().is_empty() {
            return Err(AclError::configuration("storage.root must not be empty"));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(AclError::configuration("logging.filter must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AclConfig::default();
        assert_eq!(config.storage.root, PathBuf::from("acl"));
        assert_eq!(config.logging.filter, "warn");
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AclConfig::from_toml("[storage]\nroot = \"/data/hdc\"\n").unwrap();
        assert_eq!(config.storage.root, PathBuf::from("/data/hdc"));
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_empty_root_rejected() {
        let config = AclConfig::from_toml("[storage]\nroot = \"\"\n").unwrap();
        assert!(matches!(config.validate(), Err(AclError::Configuration(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(AclConfig::from_toml("[storage\nroot = 1").is_err());
    }
}
