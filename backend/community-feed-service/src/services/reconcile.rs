use std::sync::Arc;

use crate::error::ServiceResult;
use crate::metrics::COUNTER_RECONCILE_FIXED_TOTAL;
use crate::repository::CounterStore;

/// Summary of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub drifted: usize,
    pub repaired: usize,
    pub failed: usize,
}

/// Repairs `like_count` values that diverged from the like ledger, e.g.
/// after a counter adjustment failed or a toggle was cancelled between the
/// ledger commit and the counter update.
#[derive(Clone)]
pub struct CounterReconciler {
    counters: Arc<dyn CounterStore>,
    batch_size: i64,
}

impl CounterReconciler {
    pub fn new(counters: Arc<dyn CounterStore>, batch_size: i64) -> Self {
        Self {
            counters,
            batch_size: batch_size.max(1),
        }
    }

    /// Reconcile one batch of drifted posts
    pub async fn run_once(&self) -> ServiceResult<ReconcileReport> {
        let drifted = self.counters.find_drifted(self.batch_size).await?;

        let mut report = ReconcileReport {
            drifted: drifted.len(),
            ..Default::default()
        };

        for post_id in drifted {
            match self.counters.reconcile(post_id).await {
                Ok(like_count) => {
                    report.repaired += 1;
                    COUNTER_RECONCILE_FIXED_TOTAL.inc();
                    tracing::debug!(%post_id, like_count, "Reconciled like_count");
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(%post_id, error = %e, "Failed to reconcile like_count");
                }
            }
        }

        if report.drifted > 0 {
            tracing::info!(
                drifted = report.drifted,
                repaired = report.repaired,
                failed = report.failed,
                "Reconciled like counters from the like ledger"
            );
        }

        Ok(report)
    }
}
