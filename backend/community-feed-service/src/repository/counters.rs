use std::future::Future;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::{CounterError, CounterStore};

/// PostgreSQL counter store for `posts.like_count`
///
/// Architecture:
/// - Increment/Decrement: single `UPDATE ... SET like_count = like_count + $delta`
/// - Fallback: guarded read-modify-write when the delta statement is rejected
/// - Reconciliation: recompute from `post_likes` in one statement
#[derive(Clone)]
pub struct PgCounterStore {
    pool: PgPool,
}

impl PgCounterStore {
    /// Attempts for the compare-and-swap fallback before giving up
    const MAX_CAS_ATTEMPTS: u32 = 5;

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn apply_delta(&self, post_id: Uuid, delta: i64) -> Result<i64, CounterError> {
        let result: Result<Option<i64>, sqlx::Error> = sqlx::query_scalar(
            r#"
            UPDATE posts
            SET like_count = GREATEST(like_count + $2, 0)
            WHERE id = $1
            RETURNING like_count
            "#,
        )
        .bind(post_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(count)) => Ok(count),
            Ok(None) => Err(CounterError::MissingPost(post_id)),
            Err(sqlx::Error::Database(db_err)) => {
                tracing::warn!(
                    %post_id,
                    delta,
                    error = %db_err,
                    "Atomic like_count update rejected, using compare-and-swap fallback"
                );
                self.apply_delta_cas(post_id, delta).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fallback path: read the latest value right before writing and only
    /// write if nobody changed it in between.
    async fn apply_delta_cas(&self, post_id: Uuid, delta: i64) -> Result<i64, CounterError> {
        compare_and_swap(post_id, Self::MAX_CAS_ATTEMPTS, || {
            self.cas_attempt(post_id, delta)
        })
        .await
    }

    /// One read plus one guarded write
    async fn cas_attempt(&self, post_id: Uuid, delta: i64) -> Result<CasAttempt, CounterError> {
        let current: Option<i64> = sqlx::query_scalar("SELECT like_count FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        let current = current.ok_or(CounterError::MissingPost(post_id))?;
        let next = next_like_count(current, delta);

        let result = sqlx::query(
            r#"
            UPDATE posts
            SET like_count = $2
            WHERE id = $1 AND like_count = $3
            "#,
        )
        .bind(post_id)
        .bind(next)
        .bind(current)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(CasAttempt::Applied(next))
        } else {
            Ok(CasAttempt::Stale)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CasAttempt {
    /// The guarded write landed with this value
    Applied(i64),
    /// Someone changed `like_count` between the read and the write
    Stale,
}

/// Counter value after applying `delta`, floored at zero
fn next_like_count(current: i64, delta: i64) -> i64 {
    current.saturating_add(delta).max(0)
}

/// Retry `attempt` until it applies, up to `max_attempts` times
async fn compare_and_swap<F, Fut>(
    post_id: Uuid,
    max_attempts: u32,
    mut attempt: F,
) -> Result<i64, CounterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<CasAttempt, CounterError>>,
{
    for n in 1..=max_attempts {
        match attempt().await? {
            CasAttempt::Applied(count) => return Ok(count),
            CasAttempt::Stale => {
                tracing::debug!(%post_id, attempt = n, "like_count changed underneath CAS, retrying");
            }
        }
    }

    Err(CounterError::Contended {
        post_id,
        attempts: max_attempts,
    })
}

#[async_trait]
impl CounterStore for PgCounterStore {
    async fn increment(&self, post_id: Uuid) -> Result<i64, CounterError> {
        self.apply_delta(post_id, 1).await
    }

    async fn decrement(&self, post_id: Uuid) -> Result<i64, CounterError> {
        self.apply_delta(post_id, -1).await
    }

    async fn like_count(&self, post_id: Uuid) -> Result<i64, CounterError> {
        let count: Option<i64> = sqlx::query_scalar("SELECT like_count FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        count.ok_or(CounterError::MissingPost(post_id))
    }

    async fn reconcile(&self, post_id: Uuid) -> Result<i64, CounterError> {
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE posts p
            SET like_count = (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id)
            WHERE p.id = $1
            RETURNING p.like_count
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        count.ok_or(CounterError::MissingPost(post_id))
    }

    async fn find_drifted(&self, limit: i64) -> Result<Vec<Uuid>, CounterError> {
        let post_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT p.id
            FROM posts p
            LEFT JOIN (
                SELECT post_id, COUNT(*) AS like_rows
                FROM post_likes
                GROUP BY post_id
            ) l ON l.post_id = p.id
            WHERE p.like_count <> COALESCE(l.like_rows, 0)
            ORDER BY p.id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(post_ids)
    }
}
