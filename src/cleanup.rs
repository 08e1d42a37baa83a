//! Apply a retention policy to the backups in a bucket

use crate::config::CleanupConfig;
use crate::filename::parse_filename;
use crate::observability::CleanupMetrics;
use crate::selector;
use crate::storage::{BackupStore, Result};
use crate::tier::Tier;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// What to clean and how
#[derive(Debug, Clone, Default)]
pub struct CleanupPlan {
    /// Object key prefix, including the trailing `-`
    pub prefix: String,
    pub tiers: Vec<Tier>,
    pub dry_run: bool,
}

impl From<&CleanupConfig> for CleanupPlan {
    fn from(config: &CleanupConfig) -> Self {
        Self {
            prefix: config.prefix(),
            tiers: config.keep.clone(),
            dry_run: config.dry_run,
        }
    }
}

/// Keys by outcome
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub kept: Vec<String>,
    pub removed: Vec<String>,
    /// Names without a recognizable timestamp
    pub skipped: Vec<String>,
    /// Total size of the removed objects (would-be size on a dry run)
    pub removed_bytes: u64,
}

/// Walk every backup under the plan's prefix and delete those the policy rejects.
///
/// Stops at the first storage failure.
pub async fn run(
    store: &BackupStore,
    plan: &CleanupPlan,
    now: DateTime<Utc>,
    metrics: &CleanupMetrics,
) -> Result<CleanupReport> {
    if plan.tiers.is_empty() {
        warn!("No keep tiers configured, every backup will be kept");
    }

    let mut report = CleanupReport::default();
    let objects = store.list(&plan.prefix).await?;

    info!(
        bucket = %store.bucket,
        prefix = %plan.prefix,
        count = objects.len(),
        dry_run = plan.dry_run,
        "Evaluating backups"
    );

    for object in objects {
        debug!(
            key = %object.key,
            last_modified = %object.last_modified,
            size = object.size,
            "Enumerated bucket object"
        );

        let taken_at = match parse_filename(&object.key, &plan.prefix) {
            Ok(t) => t,
            Err(e) => {
                warn!(key = %object.key, error = %e, "Failed to parse filename, skipping");
                metrics.backup_skipped();
                report.skipped.push(object.key);
                continue;
            }
        };

        // No tier in window: keep
        let governing = selector::governing_tier(taken_at, now, &plan.tiers);
        let keep = governing.is_none_or(|t| t.matches(taken_at));
        let tier = governing.map(ToString::to_string).unwrap_or_default();

        if keep {
            info!(key = %object.key, taken_at = %taken_at, tier = %tier, "Keeping backup file");
            metrics.backup_kept();
            report.kept.push(object.key);
            continue;
        }

        if plan.dry_run {
            warn!(key = %object.key, taken_at = %taken_at, tier = %tier, size = object.size, "Would remove backup file");
        } else {
            warn!(key = %object.key, taken_at = %taken_at, tier = %tier, size = object.size, "Removing backup file");
            if let Err(e) = store.delete(&object.key).await {
                tracing::error!(key = %object.key, error = %e, "Failed to remove backup file");
                return Err(e);
            }
        }

        metrics.backup_removed();
        report.removed_bytes += object.size;
        report.removed.push(object.key);
    }

    let totals = metrics.snapshot();
    info!(
        kept = totals.kept,
        removed = totals.removed,
        skipped = totals.skipped,
        removed_bytes = report.removed_bytes,
        dry_run = plan.dry_run,
        "Cleanup complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_plan_from_config() {
        let config = CleanupConfig {
            db: "pg".to_string(),
            keep: vec!["@7d/1d".parse().unwrap()],
            dry_run: true,
        };

        let plan = CleanupPlan::from(&config);
        assert_eq!(plan.prefix, "pg-");
        assert_eq!(plan.tiers.len(), 1);
        assert!(plan.dry_run);
    }

    #[tokio::test]
    async fn test_no_tiers_keeps_everything() {
        let store = BackupStore::in_memory();
        store.upload("pg-2020-01-01.backup", vec![1]).await.unwrap();

        let plan = CleanupPlan {
            prefix: "pg-".to_string(),
            ..CleanupPlan::default()
        };
        let report = run(&store, &plan, now(), &CleanupMetrics::new())
            .await
            .unwrap();

        assert_eq!(report.kept, vec!["pg-2020-01-01.backup"]);
        assert!(report.removed.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_names_are_skipped() {
        let store = BackupStore::in_memory();
        store.upload("pg-latest.backup", vec![1]).await.unwrap();

        let plan = CleanupPlan {
            prefix: "pg-".to_string(),
            tiers: vec!["/1d".parse().unwrap()],
            dry_run: false,
        };
        let metrics = CleanupMetrics::new();
        let report = run(&store, &plan, now(), &metrics).await.unwrap();

        assert_eq!(report.skipped, vec!["pg-latest.backup"]);
        assert_eq!(metrics.snapshot().skipped, 1);
        assert!(store.exists("pg-latest.backup").await.unwrap());
    }

    #[tokio::test]
    async fn test_decisions_follow_selector() {
        let store = BackupStore::in_memory();
        let today = Utc.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap();
        for n in 0..60 {
            let day = today - Duration::days(n);
            let key = format!("pg-{}.backup", day.format("%Y-%m-%d"));
            store.upload(&key, vec![0; 4]).await.unwrap();
        }

        let tiers: Vec<Tier> = ["@1d/1d", "@7d/1w", "@30d/30d"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let plan = CleanupPlan {
            prefix: "pg-".to_string(),
            tiers: tiers.clone(),
            dry_run: true,
        };
        let report = run(&store, &plan, now(), &CleanupMetrics::new())
            .await
            .unwrap();

        for key in &report.kept {
            let taken_at = parse_filename(key, "pg-").unwrap();
            assert!(selector::keep(taken_at, now(), &tiers), "{key} was kept");
        }
        for key in &report.removed {
            let taken_at = parse_filename(key, "pg-").unwrap();
            assert!(!selector::keep(taken_at, now(), &tiers), "{key} was removed");
        }
        assert_eq!(report.kept.len() + report.removed.len(), 60);
        assert!(!report.removed.is_empty());
    }

    #[tokio::test]
    async fn test_removed_bytes() {
        let store = BackupStore::in_memory();
        store.upload("pg-2024-03-14.backup", vec![0; 10]).await.unwrap();
        store.upload("pg-2024-03-01.backup", vec![0; 300]).await.unwrap();
        store.upload("pg-2024-02-29.backup", vec![0; 200]).await.unwrap();

        let plan = CleanupPlan {
            prefix: "pg-".to_string(),
            tiers: vec!["@7d/520w".parse().unwrap()],
            dry_run: false,
        };
        let report = run(&store, &plan, now(), &CleanupMetrics::new())
            .await
            .unwrap();

        assert_eq!(report.kept, vec!["pg-2024-03-14.backup"]);
        assert_eq!(report.removed.len(), 2);
        assert_eq!(report.removed_bytes, 500);
    }
}
