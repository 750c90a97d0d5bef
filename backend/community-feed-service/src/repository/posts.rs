use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::{PostRepository, StoreError};
use crate::domain::models::{NewPost, Post};

/// Repository for community posts
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create_post(&self, new_post: NewPost) -> Result<Post, StoreError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (community_id, author_id, title, content, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, community_id, author_id, title, content, category, is_pinned,
                      like_count, comment_count, created_at, updated_at
            "#,
        )
        .bind(new_post.community_id)
        .bind(new_post.author_id)
        .bind(new_post.title)
        .bind(new_post.content)
        .bind(new_post.category)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>, StoreError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, community_id, author_id, title, content, category, is_pinned,
                   like_count, comment_count, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn list_community_posts(
        &self,
        community_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, community_id, author_id, title, content, category, is_pinned,
                   like_count, comment_count, created_at, updated_at
            FROM posts
            WHERE community_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(community_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }
}
