//! Refresh orchestration: historical quotes for many securities.
//!
//! Securities are refreshed on the rayon pool. Each refresh is one blocking
//! ingestion call; the feeds' shared page cache is the only state they share.

use crate::feed::{FeedRegistry, Security};
use crate::result::FeedResult;
use rayon::prelude::*;
use tracing::{info, warn};

/// Progress callbacks. Called from worker threads.
pub trait RefreshProgress: Send + Sync {
    fn on_start(&self, security: &str, index: usize, total: usize);

    fn on_complete(&self, security: &str, index: usize, total: usize, result: &FeedResult);
}

/// Progress reporter that only logs.
pub struct LogProgress;

impl RefreshProgress for LogProgress {
    fn on_start(&self, security: &str, index: usize, total: usize) {
        info!(security, "[{}/{}] refreshing", index + 1, total);
    }

    fn on_complete(&self, security: &str, _index: usize, _total: usize, result: &FeedResult) {
        if result.series.is_empty() {
            warn!(security, errors = result.errors.len(), "no quotes");
        } else {
            info!(
                security,
                records = result.series.len(),
                errors = result.errors.len(),
                "refreshed"
            );
        }
    }
}

/// Outcome for one security.
#[derive(Debug, Clone)]
pub struct SecurityRefresh {
    pub security: String,
    pub result: FeedResult,
}

impl SecurityRefresh {
    pub fn succeeded(&self) -> bool {
        !self.result.series.is_empty()
    }
}

/// Outcome of a batch refresh, in input order.
#[derive(Debug, Clone, Default)]
pub struct RefreshSummary {
    pub refreshes: Vec<SecurityRefresh>,
}

impl RefreshSummary {
    pub fn total(&self) -> usize {
        self.refreshes.len()
    }

    /// Securities for which at least one record was obtained.
    pub fn succeeded(&self) -> usize {
        self.refreshes.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// Refresh the historical quotes of all `securities`.
pub fn refresh_all(
    registry: &FeedRegistry,
    securities: &[Security],
    parallel: bool,
    progress: &dyn RefreshProgress,
) -> RefreshSummary {
    let total = securities.len();

    let refresh_one = |(index, security): (usize, &Security)| {
        progress.on_start(&security.name, index, total);
        let result = registry.historical_quotes(security, false);
        progress.on_complete(&security.name, index, total, &result);
        SecurityRefresh {
            security: security.name.clone(),
            result,
        }
    };

    let refreshes: Vec<SecurityRefresh> = if parallel {
        securities.par_iter().enumerate().map(refresh_one).collect()
    } else {
        securities.iter().enumerate().map(refresh_one).collect()
    };

    let summary = RefreshSummary { refreshes };
    info!(
        total,
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        "refresh complete"
    );
    summary
}
