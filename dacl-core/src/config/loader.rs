//! # Configuration Loader
//!
//! Loads and merges configuration from multiple sources:
//! 1. Default values (lowest priority)
//! 2. Configuration file (middle priority)
//! 3. Environment variables (highest priority)

use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::AclConfig;
use crate::error::{AclError, Result};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "dacl.toml";

/// Configuration loader with support for file and environment variable overrides
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: PathBuf,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            config_path: Self::default_config_path(),
            env_prefix: "DACL".to_string(),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config loader with a specific config file path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::default()
        }
    }

    /// Use a different environment variable prefix
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn default_config_path() -> PathBuf {
        env::var_os("DACL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration with full hierarchy
    pub fn load(&self) -> Result<AclConfig> {
        let mut config = if self.config_path.exists() {
            debug!(path = %self.config_path.display(), "Loading config file");
            self.load_from_file()?
        } else {
            AclConfig::default()
        };

        self.merge_env(&mut config, |key| env::var(key).ok());

        config.validate().map_err(|e| {
            AclError::configuration(format!("Configuration validation failed: {}", e))
        })?;
        Ok(config)
    }

    fn load_from_file(&self) -> Result<AclConfig> {
        let content = std::fs::read_to_string(&self.config_path).map_err(|e| {
            AclError::configuration(format!(
                "Failed to read config file '{}': {}",
                self.config_path.display(),
                e
            ))
        })?;
        AclConfig::from_toml(&content)
    }

    fn merge_env<F>(&self, config: &mut AclConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(&format!("{}_ROOT", self.env_prefix)) {
            config.storage.root = PathBuf::from(root);
        }
        if let Some(filter) = lookup(&format!("{}_LOG", self.env_prefix)) {
            config.logging.filter = filter;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_path(dir.path().join("absent.toml"))
            .env_prefix("DACL_TEST_MISSING");
        assert_eq!(loader.load().unwrap(), AclConfig::default());
    }

    #[test]
    fn test_file_values_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dacl.toml");
        std::fs::write(&path, "[storage]\nroot = \"/data/hdc\"\n[logging]\nfilter = \"debug\"\n").unwrap();

        let config = ConfigLoader::with_path(&path)
            .env_prefix("DACL_TEST_FILE")
            .load()
            .unwrap();
        assert_eq!(config.storage.root, PathBuf::from("/data/hdc"));
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = AclConfig::default();
        let env: HashMap<&str, &str> =
            [("X_ROOT", "/override"), ("X_LOG", "dacl_core=trace")].into_iter().collect();

        ConfigLoader::new()
            .env_prefix("X")
            .merge_env(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.storage.root, PathBuf::from("/override"));
        assert_eq!(config.logging.filter, "dacl_core=trace");
    }

    #[test]
    fn test_invalid_file_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dacl.toml");
        std::fs::write(&path, "storage = 3").unwrap();

        let err = ConfigLoader::with_path(&path)
            .env_prefix("DACL_TEST_INVALID")
            .load()
            .unwrap_err();
        assert!(matches!(err, AclError::Configuration(_)));
    }
}
