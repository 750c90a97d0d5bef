//! Like toggle state machine.
//!
//! Per (post, user) pair the state is either liked or not liked, and
//! `toggle_like` is the only transition. The ledger is written first and is
//! authoritative; the counter adjustment that follows is best-effort and its
//! failure never fails the call.
//!
//! Races are resolved by converging on the ledger: an insert that hits an
//! existing row means someone else already liked (result: liked, no
//! increment); a delete that finds nothing means someone else already
//! unliked (result: not liked, no decrement).

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::metrics::{ENGAGEMENT_COUNTER_WARNING_TOTAL, ENGAGEMENT_TOGGLE_TOTAL};
use crate::repository::{CounterStore, LedgerError, LikeLedger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterAdjustment {
    Increment,
    Decrement,
}

impl CounterAdjustment {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterAdjustment::Increment => "increment",
            CounterAdjustment::Decrement => "decrement",
        }
    }
}

/// A `like_count` adjustment failed after the ledger committed.
///
/// The ledger state is correct; only the displayed count is stale until the
/// reconciler repairs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterAdjustmentWarning {
    pub post_id: Uuid,
    pub adjustment: CounterAdjustment,
    pub reason: String,
}

impl fmt::Display for CounterAdjustmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "like_count {} failed for post {}: {}",
            self.adjustment.as_str(),
            self.post_id,
            self.reason
        )
    }
}

/// Result of a toggle, to be merged into the caller's view state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    /// Ledger state after the call: true = liked
    pub liked: bool,
    /// Counter value after the call, when it could be determined
    pub like_count: Option<i64>,
    /// True when a concurrent toggle already produced this state
    pub converged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<CounterAdjustmentWarning>,
}

#[derive(Clone)]
pub struct EngagementService {
    ledger: Arc<dyn LikeLedger>,
    counters: Arc<dyn CounterStore>,
}

impl EngagementService {
    pub fn new(ledger: Arc<dyn LikeLedger>, counters: Arc<dyn CounterStore>) -> Self {
        Self { ledger, counters }
    }

    /// Flip the like state of `(post_id, user_id)`.
    ///
    /// Fails with `ToggleFailed` only when the ledger itself could not be
    /// read or mutated; in that case nothing was applied.
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> ServiceResult<ToggleOutcome> {
        let result = self.toggle_inner(post_id, user_id).await;

        let label = match &result {
            Ok(outcome) if outcome.converged => "converged",
            Ok(outcome) if outcome.liked => "liked",
            Ok(_) => "unliked",
            Err(_) => "failed",
        };
        ENGAGEMENT_TOGGLE_TOTAL.with_label_values(&[label]).inc();

        result
    }

    async fn toggle_inner(&self, post_id: Uuid, user_id: Uuid) -> ServiceResult<ToggleOutcome> {
        let currently_liked = self
            .ledger
            .exists(post_id, user_id)
            .await
            .map_err(|e| ledger_failure(post_id, user_id, e))?;

        if currently_liked {
            self.unlike(post_id, user_id).await
        } else {
            self.like(post_id, user_id).await
        }
    }

    async fn like(&self, post_id: Uuid, user_id: Uuid) -> ServiceResult<ToggleOutcome> {
        match self.ledger.insert(post_id, user_id).await {
            Ok(_) => Ok(self.adjust(post_id, CounterAdjustment::Increment).await),
            Err(LedgerError::Conflict { .. }) => {
                tracing::debug!(%post_id, %user_id, "Like already present, converging to liked");
                Ok(self.converged(post_id, true).await)
            }
            Err(e) => Err(ledger_failure(post_id, user_id, e)),
        }
    }

    async fn unlike(&self, post_id: Uuid, user_id: Uuid) -> ServiceResult<ToggleOutcome> {
        match self.ledger.delete(post_id, user_id).await {
            Ok(()) => Ok(self.adjust(post_id, CounterAdjustment::Decrement).await),
            Err(LedgerError::NotFound { .. }) => {
                tracing::debug!(%post_id, %user_id, "Like already removed, converging to unliked");
                Ok(self.converged(post_id, false).await)
            }
            Err(e) => Err(ledger_failure(post_id, user_id, e)),
        }
    }

    /// Apply the counter delta matching a committed ledger mutation.
    async fn adjust(&self, post_id: Uuid, adjustment: CounterAdjustment) -> ToggleOutcome {
        let liked = adjustment == CounterAdjustment::Increment;
        let result = match adjustment {
            CounterAdjustment::Increment => self.counters.increment(post_id).await,
            CounterAdjustment::Decrement => self.counters.decrement(post_id).await,
        };

        match result {
            Ok(count) => ToggleOutcome {
                liked,
                like_count: Some(count),
                converged: false,
                warning: None,
            },
            Err(e) => {
                let warning = CounterAdjustmentWarning {
                    post_id,
                    adjustment,
                    reason: e.to_string(),
                };
                tracing::warn!(
                    %post_id,
                    op = adjustment.as_str(),
                    error = %e,
                    "Counter adjustment failed after ledger commit; like_count is stale until reconciled"
                );
                ENGAGEMENT_COUNTER_WARNING_TOTAL
                    .with_label_values(&[adjustment.as_str()])
                    .inc();

                ToggleOutcome {
                    liked,
                    like_count: self.current_count(post_id).await,
                    converged: false,
                    warning: Some(warning),
                }
            }
        }
    }

    async fn converged(&self, post_id: Uuid, liked: bool) -> ToggleOutcome {
        ToggleOutcome {
            liked,
            like_count: self.current_count(post_id).await,
            converged: true,
            warning: None,
        }
    }

    async fn current_count(&self, post_id: Uuid) -> Option<i64> {
        match self.counters.like_count(post_id).await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::debug!(%post_id, error = %e, "Could not read like_count");
                None
            }
        }
    }
}

fn ledger_failure(post_id: Uuid, user_id: Uuid, err: LedgerError) -> ServiceError {
    tracing::error!(%post_id, %user_id, error = %err, "Like toggle failed at the ledger");
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Like;
    use crate::repository::traits::{MockCounterStore, MockLikeLedger};
    use crate::repository::CounterError;
    use chrono::Utc;
    use mockall::predicate::eq;

    fn like_row(post_id: Uuid, user_id: Uuid) -> Like {
        Like {
            id: Uuid::new_v4(),
            post_id,
            user_id,
            created_at: Utc::now(),
        }
    }

    fn service(ledger: MockLikeLedger, counters: MockCounterStore) -> EngagementService {
        EngagementService::new(Arc::new(ledger), Arc::new(counters))
    }

    #[tokio::test]
    async fn test_like_when_not_liked() {
        let post_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut ledger = MockLikeLedger::new();
        ledger
            .expect_exists()
            .with(eq(post_id), eq(user_id))
            .times(1)
            .returning(|_, _| Ok(false));
        ledger
            .expect_insert()
            .with(eq(post_id), eq(user_id))
            .times(1)
            .returning(|p, u| Ok(like_row(p, u)));

        let mut counters = MockCounterStore::new();
        counters
            .expect_increment()
            .with(eq(post_id))
            .times(1)
            .returning(|_| Ok(1));

        let outcome = service(ledger, counters)
            .toggle_like(post_id, user_id)
            .await
            .unwrap();

        assert!(outcome.liked);
        assert_eq!(outcome.like_count, Some(1));
        assert!(!outcome.converged);
        assert!(outcome.warning.is_none());
    }

    #[tokio::test]
    async fn test_unlike_when_liked() {
        let post_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut ledger = MockLikeLedger::new();
        ledger.expect_exists().returning(|_, _| Ok(true));
        ledger.expect_delete().times(1).returning(|_, _| Ok(()));
        ledger.expect_insert().never();

        let mut counters = MockCounterStore::new();
        counters
            .expect_decrement()
            .with(eq(post_id))
            .times(1)
            .returning(|_| Ok(0));
        counters.expect_increment().never();

        let outcome = service(ledger, counters)
            .toggle_like(post_id, user_id)
            .await
            .unwrap();

        assert!(!outcome.liked);
        assert_eq!(outcome.like_count, Some(0));
    }

    #[tokio::test]
    async fn test_insert_conflict_converges_without_increment() {
        let post_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut ledger = MockLikeLedger::new();
        ledger.expect_exists().returning(|_, _| Ok(false));
        ledger
            .expect_insert()
            .returning(|post_id, user_id| Err(LedgerError::Conflict { post_id, user_id }));

        let mut counters = MockCounterStore::new();
        counters.expect_increment().never();
        counters.expect_like_count().returning(|_| Ok(1));

        let outcome = service(ledger, counters)
            .toggle_like(post_id, user_id)
            .await
            .unwrap();

        assert!(outcome.liked);
        assert!(outcome.converged);
        assert_eq!(outcome.like_count, Some(1));
    }

    #[tokio::test]
    async fn test_delete_not_found_converges_without_decrement() {
        let post_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut ledger = MockLikeLedger::new();
        ledger.expect_exists().returning(|_, _| Ok(true));
        ledger
            .expect_delete()
            .returning(|post_id, user_id| Err(LedgerError::NotFound { post_id, user_id }));

        let mut counters = MockCounterStore::new();
        counters.expect_decrement().never();
        counters.expect_like_count().returning(|_| Ok(0));

        let outcome = service(ledger, counters)
            .toggle_like(post_id, user_id)
            .await
            .unwrap();

        assert!(!outcome.liked);
        assert!(outcome.converged);
    }

    #[tokio::test]
    async fn test_increment_failure_is_a_warning() {
        let post_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut ledger = MockLikeLedger::new();
        ledger.expect_exists().returning(|_, _| Ok(false));
        ledger.expect_insert().returning(|p, u| Ok(like_row(p, u)));

        let mut counters = MockCounterStore::new();
        counters
            .expect_increment()
            .returning(|_| Err(CounterError::Unavailable("connection reset".into())));
        counters.expect_like_count().returning(|_| Ok(4));

        let outcome = service(ledger, counters)
            .toggle_like(post_id, user_id)
            .await
            .unwrap();

        assert!(outcome.liked);
        assert_eq!(outcome.like_count, Some(4));
        let warning = outcome.warning.expect("warning expected");
        assert_eq!(warning.post_id, post_id);
        assert_eq!(warning.adjustment, CounterAdjustment::Increment);
    }

    #[tokio::test]
    async fn test_decrement_failure_without_readable_count() {
        let mut ledger = MockLikeLedger::new();
        ledger.expect_exists().returning(|_, _| Ok(true));
        ledger.expect_delete().returning(|_, _| Ok(()));

        let mut counters = MockCounterStore::new();
        counters
            .expect_decrement()
            .returning(|_| Err(CounterError::Unavailable("timeout".into())));
        counters
            .expect_like_count()
            .returning(|_| Err(CounterError::Unavailable("timeout".into())));

        let outcome = service(ledger, counters)
            .toggle_like(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();

        assert!(!outcome.liked);
        assert_eq!(outcome.like_count, None);
        assert_eq!(
            outcome.warning.map(|w| w.adjustment),
            Some(CounterAdjustment::Decrement)
        );
    }

    #[tokio::test]
    async fn test_ledger_unavailable_on_read_fails_toggle() {
        let mut ledger = MockLikeLedger::new();
        ledger
            .expect_exists()
            .returning(|_, _| Err(LedgerError::Unavailable("pool timed out".into())));
        ledger.expect_insert().never();
        ledger.expect_delete().never();

        let mut counters = MockCounterStore::new();
        counters.expect_increment().never();
        counters.expect_decrement().never();

        let err = service(ledger, counters)
            .toggle_like(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::ToggleFailed(_)));
    }

    #[tokio::test]
    async fn test_ledger_unavailable_on_insert_fails_toggle() {
        let mut ledger = MockLikeLedger::new();
        ledger.expect_exists().returning(|_, _| Ok(false));
        ledger
            .expect_insert()
            .returning(|_, _| Err(LedgerError::Unavailable("connection refused".into())));

        let mut counters = MockCounterStore::new();
        counters.expect_increment().never();

        let err = service(ledger, counters)
            .toggle_like(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::ToggleFailed(_)));
    }

    #[tokio::test]
    async fn test_unknown_post_is_not_found() {
        let mut ledger = MockLikeLedger::new();
        ledger.expect_exists().returning(|_, _| Ok(false));
        ledger
            .expect_insert()
            .returning(|post_id, _| Err(LedgerError::UnknownPost(post_id)));

        let mut counters = MockCounterStore::new();
        counters.expect_increment().never();

        let err = service(ledger, counters)
            .toggle_like(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
