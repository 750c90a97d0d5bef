use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::{LedgerError, LikeLedger};
use crate::domain::models::Like;

/// PostgreSQL-backed like ledger over the `post_likes` table
///
/// The `UNIQUE (post_id, user_id)` constraint is what turns concurrent
/// double-inserts into a `Conflict` for the loser.
#[derive(Clone)]
pub struct PgLikeLedger {
    pool: PgPool,
}

impl PgLikeLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeLedger for PgLikeLedger {
    async fn exists(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, LedgerError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM post_likes
                WHERE post_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, post_id: Uuid, user_id: Uuid) -> Result<Like, LedgerError> {
        let result = sqlx::query_as::<_, Like>(
            r#"
            INSERT INTO post_likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            RETURNING id, post_id, user_id, created_at
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(like)) => Ok(like),
            Ok(None) => Err(LedgerError::Conflict { post_id, user_id }),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(LedgerError::UnknownPost(post_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, post_id: Uuid, user_id: Uuid) -> Result<(), LedgerError> {
        let result = sqlx::query(
            r#"
            DELETE FROM post_likes
            WHERE post_id = $1 AND user_id = $2
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound { post_id, user_id });
        }

        Ok(())
    }

    async fn existing_likes_for(
        &self,
        post_ids: &[Uuid],
        user_id: Uuid,
    ) -> Result<HashSet<Uuid>, LedgerError> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let liked_posts: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT post_id
            FROM post_likes
            WHERE user_id = $1 AND post_id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(liked_posts.into_iter().collect())
    }

    async fn count_for_post(&self, post_id: Uuid) -> Result<i64, LedgerError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM post_likes
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::pg_test_support::{insert_post, test_pool};

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_insert_twice_conflicts() {
        let pool = test_pool().await;
        let post_id = insert_post(&pool).await;
        let ledger = PgLikeLedger::new(pool);
        let user_id = Uuid::new_v4();

        let like = ledger.insert(post_id, user_id).await.unwrap();
        assert_eq!(like.post_id, post_id);
        assert_eq!(like.user_id, user_id);

        assert_eq!(
            ledger.insert(post_id, user_id).await.unwrap_err(),
            LedgerError::Conflict { post_id, user_id }
        );
        assert!(ledger.exists(post_id, user_id).await.unwrap());
        assert_eq!(ledger.count_for_post(post_id).await.unwrap(), 1);
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_insert_on_unknown_post() {
        let ledger = PgLikeLedger::new(test_pool().await);
        let post_id = Uuid::new_v4();

        assert_eq!(
            ledger.insert(post_id, Uuid::new_v4()).await.unwrap_err(),
            LedgerError::UnknownPost(post_id)
        );
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_delete_then_delete_again() {
        let pool = test_pool().await;
        let post_id = insert_post(&pool).await;
        let ledger = PgLikeLedger::new(pool);
        let user_id = Uuid::new_v4();

        ledger.insert(post_id, user_id).await.unwrap();
        ledger.delete(post_id, user_id).await.unwrap();

        assert_eq!(
            ledger.delete(post_id, user_id).await.unwrap_err(),
            LedgerError::NotFound { post_id, user_id }
        );
        assert!(!ledger.exists(post_id, user_id).await.unwrap());
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_existing_likes_for_batch() {
        let pool = test_pool().await;
        let liked = insert_post(&pool).await;
        let not_liked = insert_post(&pool).await;
        let ledger = PgLikeLedger::new(pool);
        let viewer = Uuid::new_v4();

        ledger.insert(liked, viewer).await.unwrap();
        ledger.insert(not_liked, Uuid::new_v4()).await.unwrap();

        let found = ledger
            .existing_likes_for(&[liked, not_liked], viewer)
            .await
            .unwrap();
        assert_eq!(found, HashSet::from([liked]));
        assert!(ledger.existing_likes_for(&[], viewer).await.unwrap().is_empty());
    }
}
