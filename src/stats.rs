//! Counters for the analyses a serving surface has handled.
//!
//! The analyzer itself is stateless; these counters live in the serving
//! layer and are shared across request handlers.

use crate::core::{HealthStatus, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Running totals of analyses served.
#[derive(Debug)]
pub struct AnalysisLog {
    /// Analyses that ended in a HEALTHY verdict
    healthy: AtomicU64,
    /// Analyses that ended in an ANOMALY verdict
    anomalies: AtomicU64,
    /// Failed analyses keyed by error code
    failures: Mutex<BTreeMap<String, u64>>,
    /// When counting started
    started_at: DateTime<Utc>,
}

impl AnalysisLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            healthy: AtomicU64::new(0),
            anomalies: AtomicU64::new(0),
            failures: Mutex::new(BTreeMap::new()),
            started_at: Utc::now(),
        }
    }

    /// Record a completed analysis.
    pub fn record_verdict(&self, verdict: &Verdict) {
        let counter = match verdict.status {
            HealthStatus::Healthy => &self.healthy,
            HealthStatus::Anomaly => &self.anomalies,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed analysis.
    pub fn record_failure(&self, code: &str) {
        let mut failures = self
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *failures.entry(code.to_string()).or_insert(0) += 1;
    }

    /// Get the current statistics.
    pub fn stats(&self) -> AnalysisStats {
        let failures = self
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        let healthy = self.healthy.load(Ordering::Relaxed);
        let anomalies = self.anomalies.load(Ordering::Relaxed);
        let failed: u64 = failures.values().sum();

        AnalysisStats {
            total: healthy + anomalies + failed,
            healthy,
            anomalies,
            failed,
            failures,
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        let mut summary = format!(
            "Analysis Statistics:\n\
             - Analyses served: {}\n\
             - Healthy: {}\n\
             - Anomalies: {}\n\
             - Failed: {}",
            stats.total, stats.healthy, stats.anomalies, stats.failed
        );
        for (code, count) in &stats.failures {
            summary.push_str(&format!("\n   - {code}: {count}"));
        }
        summary
    }
}

impl Default for AnalysisLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of analysis statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total: u64,
    pub healthy: u64,
    pub anomalies: u64,
    pub failed: u64,
    pub failures: BTreeMap<String, u64>,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

/// Thread-safe shared analysis log.
pub type SharedAnalysisLog = Arc<AnalysisLog>;

/// Create a new shared analysis log.
pub fn create_shared_log() -> SharedAnalysisLog {
    Arc::new(AnalysisLog::new())
}
