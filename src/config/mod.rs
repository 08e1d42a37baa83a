//! Configuration management for minback
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//! 4. Command-line flags (highest priority, applied by the binary)
//!
//! # Usage
//!
//! ```no_run
//! use minback::config::Config;
//!
//! let mut config = Config::load_unvalidated(None).expect("Failed to load configuration");
//! config.cleanup.dry_run = true;
//! config.validate().expect("Invalid configuration");
//! println!("Cleaning bucket: {}", config.storage.bucket);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `MINBACK__<section>__<key>`
//!
//! Examples:
//! - `MINBACK__STORAGE__SERVER=https://minio.internal:9000`
//! - `MINBACK__STORAGE__BUCKET=nightly`
//! - `MINBACK__CLEANUP__DB=postgres`
//!
//! Credentials are read from `MINIO_ACCESS_KEY` / `MINIO_SECRET_KEY`
//! (or `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`).
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/minback.toml`.
//! This can be overridden using the `MINBACK_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

// Re-export public types
pub use models::{CleanupConfig, Config, LoggingConfig, StorageConfig, StorageProvider};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load file and environment layers without validating, so that
    /// command-line overrides can be applied first.
    ///
    /// Priority, highest first: `MINBACK__*` environment variables, the TOML
    /// file (`path`, else `MINBACK_CONFIG`, else `config/minback.toml`), defaults.
    pub fn load_unvalidated(path: Option<std::path::PathBuf>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(sources::default_path);
        Ok(sources::load(path)?)
    }

    /// Check the assembled configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_local_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[storage]
provider = "local"

[cleanup]
db = "postgres"
keep = ["@7d/1d"]
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.storage.provider, StorageProvider::Local);
        assert_eq!(config.cleanup.prefix(), "postgres-");
        assert_eq!(config.cleanup.keep.len(), 1);
    }

    #[test]
    fn test_validation_catches_missing_server() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[storage]
provider = "s3"
bucket = "backups"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::MissingServer)
        ));
    }

    #[test]
    fn test_malformed_tier_is_a_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[cleanup]\nkeep = [\"@1x\"]\n").unwrap();

        assert!(matches!(
            Config::load_from_path(config_path),
            Err(ConfigError::LoadError(_))
        ));
    }

    #[test]
    fn test_unvalidated_load_defers_checks() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[storage]\nprovider = \"s3\"\n").unwrap();

        let mut config = Config::load_unvalidated(Some(config_path)).unwrap();
        assert!(config.storage.server.is_none());

        config.storage.server = Some("http://minio:9000".to_string());
        config.storage.access_key = Some("minio".to_string());
        config.storage.secret_key = Some("minio123".to_string());
        assert!(config.validate().is_ok());
    }
}
