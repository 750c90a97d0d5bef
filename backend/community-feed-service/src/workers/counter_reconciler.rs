//! Like Counter Reconciliation Background Job
//!
//! `like_count` is a best-effort cache of the like ledger. A counter
//! adjustment that fails after the ledger commit, or a request cancelled in
//! between, leaves the two apart. This job periodically rewrites drifted
//! counters from the ledger so the divergence is never permanent.

use crate::config::ReconcilerConfig;
use crate::services::CounterReconciler;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Consecutive failed passes before logging at error level
const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Start the counter reconciliation background job
pub async fn start_counter_reconciler(reconciler: Arc<CounterReconciler>, config: ReconcilerConfig) {
    if !config.enabled {
        tracing::info!("Counter reconciliation disabled by configuration");
        return;
    }

    tracing::info!(
        interval_secs = config.interval().as_secs(),
        batch_size = config.batch_size,
        "Starting like counter reconciliation job"
    );

    // Initial delay to let services start up
    sleep(Duration::from_secs(10)).await;

    let mut consecutive_failures = 0;

    loop {
        match reconciler.run_once().await {
            Ok(report) => {
                if consecutive_failures > 0 {
                    tracing::info!(
                        previous_failures = consecutive_failures,
                        "Counter reconciliation recovered"
                    );
                }
                consecutive_failures = 0;
                tracing::debug!(
                    drifted = report.drifted,
                    repaired = report.repaired,
                    "Counter reconciliation pass complete"
                );
            }
            Err(e) => {
                consecutive_failures += 1;
                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    tracing::error!(
                        consecutive_failures,
                        error = %e,
                        "Counter reconciliation: CRITICAL - multiple consecutive failures"
                    );
                } else {
                    tracing::warn!(
                        consecutive_failures,
                        error = %e,
                        "Counter reconciliation: FAILED"
                    );
                }
            }
        }

        sleep(config.interval()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;

    #[tokio::test]
    async fn test_disabled_job_returns_immediately() {
        let store = Arc::new(MemoryStore::new());
        let reconciler = Arc::new(CounterReconciler::new(store, 10));
        let config = ReconcilerConfig {
            enabled: false,
            ..Default::default()
        };

        tokio::time::timeout(
            Duration::from_secs(1),
            start_counter_reconciler(reconciler, config),
        )
        .await
        .expect("disabled reconciler should not loop");
    }
}
