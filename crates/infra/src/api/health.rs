//! Health and account summaries.

use adflow_core::ExecutorStats;
use serde::{Deserialize, Serialize};

/// Result of a balance probe plus the executor's counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub balance: Option<f64>,
    pub requests: u64,
    pub errors: u64,
    /// Percent of terminal outcomes that failed.
    pub error_rate: f64,
    pub error: Option<String>,
}

impl HealthReport {
    pub(crate) fn healthy(balance: f64, stats: ExecutorStats) -> Self {
        Self {
            healthy: true,
            balance: Some(balance),
            requests: stats.requests,
            errors: stats.errors,
            error_rate: stats.error_rate(),
            error: None,
        }
    }

    pub(crate) fn unhealthy(error: impl Into<String>, stats: ExecutorStats) -> Self {
        Self {
            healthy: false,
            balance: None,
            requests: stats.requests,
            errors: stats.errors,
            error_rate: stats.error_rate(),
            error: Some(error.into()),
        }
    }
}

/// Best-effort account overview; parts the upstream refused are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub balance: Option<f64>,
    pub total_campaigns: Option<u64>,
    pub requests: u64,
    pub errors: u64,
    /// Rounded to two decimals.
    pub error_rate: f64,
}

impl AccountInfo {
    pub(crate) fn new(
        balance: Option<f64>,
        total_campaigns: Option<u64>,
        stats: ExecutorStats,
    ) -> Self {
        Self {
            balance,
            total_campaigns,
            requests: stats.requests,
            errors: stats.errors,
            error_rate: (stats.error_rate() * 100.0).round() / 100.0,
        }
    }
}
