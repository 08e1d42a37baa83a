//! Logging setup and cleanup counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

/// Map a configured level name to a tracing directive; unknown names fall back to `info`
pub fn level_directive(level: &str) -> &'static str {
    match level.to_ascii_uppercase().as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARN" => "warn",
        "ERROR" => "error",
        _ => "info",
    }
}

/// Changes the level of the installed subscriber once the configuration is known
pub struct LogLevelHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogLevelHandle {
    /// Switch to `level`. No-op when `RUST_LOG` chose the filter.
    pub fn set_level(&self, level: &str) {
        if self.from_env {
            return;
        }

        if let Err(e) = self.filter.reload(EnvFilter::new(level_directive(level))) {
            tracing::warn!(level, error = %e, "Failed to apply log level");
        }
    }

    /// Active filter directives
    pub fn directives(&self) -> Option<String> {
        self.filter.with_current(|filter| filter.to_string()).ok()
    }
}

/// Install the global tracing subscriber.
///
/// Called before configuration is loaded so that loading is logged; the
/// configured level is applied afterwards through the returned handle.
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_tracing(level: &str) -> LogLevelHandle {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(level_directive(level)), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    // A subscriber may already be installed (tests)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();

    LogLevelHandle {
        filter: handle,
        from_env,
    }
}

/// Counters for a cleanup run
#[derive(Debug, Default)]
pub struct CleanupMetrics {
    kept: AtomicU64,
    removed: AtomicU64,
    skipped: AtomicU64,
}

impl CleanupMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backup_kept(&self) {
        self.kept.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "backups_kept", "Metric incremented");
    }

    pub fn backup_removed(&self) {
        self.removed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "backups_removed", "Metric incremented");
    }

    pub fn backup_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "backups_skipped", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            kept: self.kept.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub kept: u64,
    pub removed: u64,
    pub skipped: u64,
}
