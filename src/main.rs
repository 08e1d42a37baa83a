mod cli;

use chrono::Utc;
use clap::Parser;
use cli::{Cli, Commands};
use minback::cleanup::{self, CleanupPlan};
use minback::config::Config;
use minback::observability::{self, CleanupMetrics};
use minback::storage::BackupStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    // Logging starts before the config file is read; its level is applied below
    let logging = observability::init_tracing(cli.log_level.as_deref().unwrap_or("info"));

    let mut config = match Config::load_unvalidated(cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    logging.set_level(&config.logging.level);

    match cli.command {
        Commands::Cleanup(args) => {
            args.apply(&mut config);
            if let Err(e) = config.validate() {
                tracing::error!(error = %e, "Invalid configuration");
                return Err(e.into());
            }

            let store = BackupStore::from_config(&config.storage)?;
            let plan = CleanupPlan::from(&config.cleanup);
            let metrics = CleanupMetrics::new();

            if let Err(e) = cleanup::run(&store, &plan, Utc::now(), &metrics).await {
                tracing::error!(
                    server = config.storage.server.as_deref().unwrap_or_default(),
                    bucket = %config.storage.bucket,
                    db = %config.cleanup.db,
                    error = %e,
                    "Cleanup failed"
                );
                return Err(e.into());
            }
        }
    }

    Ok(())
}
