/// Post service - the creation path for community posts
use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::models::{NewPost, PostView, DEFAULT_CATEGORY};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{PostRepository, ProfileDirectory};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostInput {
    pub community_id: Uuid,
    pub author_id: Uuid,
    #[validate(length(max = 10000), custom(function = "validate_not_blank"))]
    pub content: String,
    #[validate(length(max = 300))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, profiles: Arc<dyn ProfileDirectory>) -> Self {
        Self { posts, profiles }
    }

    /// Create a new post
    ///
    /// Input is validated before anything is written. The returned view
    /// carries a fresh read of the author's profile and is never pre-liked.
    pub async fn create_post(&self, input: CreatePostInput) -> ServiceResult<PostView> {
        input
            .validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let new_post = NewPost {
            community_id: input.community_id,
            author_id: input.author_id,
            title: input.title,
            content: input.content,
            category: input
                .category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        };

        let post = self.posts.create_post(new_post).await?;
        tracing::info!(
            post_id = %post.id,
            community_id = %post.community_id,
            author_id = %post.author_id,
            "Post created"
        );

        // The post is committed at this point; a profile miss only degrades display.
        let author = match self.profiles.resolve_profiles(&[post.author_id]).await {
            Ok(mut profiles) => profiles.remove(&post.author_id),
            Err(e) => {
                tracing::warn!(post_id = %post.id, error = %e, "Author profile lookup failed");
                None
            }
        };

        Ok(PostView::new(post, author, false))
    }
}
