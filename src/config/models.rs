use crate::tier::Tier;
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage provider type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    #[default]
    S3,
    Local,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub provider: StorageProvider,
    /// S3-compatible endpoint URL, e.g. `https://minio.example.com:9000`
    pub server: Option<String>,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Access key (loaded from environment or CLI, not from config file)
    #[serde(skip)]
    pub access_key: Option<String>,
    /// Secret key (loaded from environment or CLI, not from config file)
    #[serde(skip)]
    pub secret_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: StorageProvider::default(),
            server: None,
            bucket: default_bucket(),
            region: default_region(),
            access_key: None,
            secret_key: None,
        }
    }
}

fn default_bucket() -> String {
    "backups".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Which backups to inspect and how to thin them out
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CleanupConfig {
    /// Backup name prefix (`my-db` for `my-db-2017-12-19.backup`)
    #[serde(default)]
    pub db: String,
    /// Retention tiers, e.g. `["@7d/1d", "@30d/1w"]`
    #[serde(default)]
    pub keep: Vec<Tier>,
    /// Log deletions without performing them
    #[serde(default)]
    pub dry_run: bool,
}

impl CleanupConfig {
    /// Object key prefix shared by this database's backups
    pub fn prefix(&self) -> String {
        if self.db.is_empty() {
            String::new()
        } else {
            format!("{}-", self.db)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// One of `debug`, `info`, `warn`, `error`
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
