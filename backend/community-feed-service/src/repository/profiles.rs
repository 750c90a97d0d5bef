use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::{ProfileDirectory, StoreError};
use crate::domain::models::AuthorProfile;

/// Reads author display fields from the `profiles` table owned by the
/// identity service.
#[derive(Clone)]
pub struct PgProfileDirectory {
    pool: PgPool,
}

impl PgProfileDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileDirectory for PgProfileDirectory {
    async fn resolve_profiles(
        &self,
        user_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, AuthorProfile>, StoreError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let profiles = sqlx::query_as::<_, AuthorProfile>(
            r#"
            SELECT id AS user_id, full_name AS display_name, username, avatar_url
            FROM profiles
            WHERE id = ANY($1)
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles
            .into_iter()
            .map(|profile| (profile.user_id, profile))
            .collect())
    }
}
