use clap::{Parser, Subcommand};
use minback::config::Config;
use minback::tier::Tier;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "minback")]
#[command(about = "Thin out database backups stored in S3-compatible object storage", long_about = None)]
#[command(version)]
pub struct Cli {
    /// DEBUG|INFO|WARN|ERROR
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "MINBACK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Delete backups that fall outside the retention policy
    Cleanup(CleanupArgs),
}

#[derive(clap::Args, Debug)]
pub struct CleanupArgs {
    /// Object storage server URL
    #[arg(long, env = "MINIO_SERVER")]
    pub server: Option<String>,

    #[arg(long, env = "MINIO_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    #[arg(long, env = "MINIO_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    #[arg(long, env = "MINIO_BUCKET")]
    pub bucket: Option<String>,

    /// The name of the database backup files (my-db-2017-12-19.backup would use 'my-db')
    #[arg(long)]
    pub db: Option<String>,

    /// @7d/1d will keep a backup every 1d for all backups 7d old or older
    #[arg(short, long = "keep")]
    pub keep: Vec<Tier>,

    /// Report what would be removed without deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

impl CleanupArgs {
    /// Layer command-line values over the loaded configuration
    pub fn apply(self, config: &mut Config) {
        if let Some(server) = self.server {
            config.storage.server = Some(server);
        }
        if let Some(access_key) = self.access_key {
            config.storage.access_key = Some(access_key);
        }
        if let Some(secret_key) = self.secret_key {
            config.storage.secret_key = Some(secret_key);
        }
        if let Some(bucket) = self.bucket {
            config.storage.bucket = bucket;
        }
        if let Some(db) = self.db {
            config.cleanup.db = db;
        }
        if !self.keep.is_empty() {
            config.cleanup.keep = self.keep;
        }
        if self.dry_run {
            config.cleanup.dry_run = true;
        }
    }
}
