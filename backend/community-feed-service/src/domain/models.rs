use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category assigned when the author does not pick one.
pub const DEFAULT_CATEGORY: &str = "discussion";

/// Post entity - a community post with its denormalized engagement counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub community_id: Uuid,
    pub author_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub category: String,
    pub is_pinned: bool,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Like entity - represents a user liking a post
///
/// `(post_id, user_id)` is the natural key; at most one row per pair exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Author display fields resolved from the identity collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthorProfile {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// Input for the post creation path
#[derive(Debug, Clone)]
pub struct NewPost {
    pub community_id: Uuid,
    pub author_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub category: String,
}

/// A post as rendered for one viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<AuthorProfile>,
    pub user_has_liked: bool,
}

impl PostView {
    pub fn new(post: Post, author: Option<AuthorProfile>, user_has_liked: bool) -> Self {
        Self {
            post,
            author,
            user_has_liked,
        }
    }

    pub fn id(&self) -> Uuid {
        self.post.id
    }
}
