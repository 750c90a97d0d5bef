use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::{AuthorProfile, Like, NewPost, Post};

/// Errors raised by the like ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A like row already exists for the pair (lost an insert race)
    #[error("like already exists for post {post_id} and user {user_id}")]
    Conflict { post_id: Uuid, user_id: Uuid },

    /// No like row exists for the pair (lost a delete race)
    #[error("no like exists for post {post_id} and user {user_id}")]
    NotFound { post_id: Uuid, user_id: Uuid },

    #[error("post {0} does not exist")]
    UnknownPost(Uuid),

    #[error("like ledger unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Unavailable(err.to_string())
    }
}

/// Errors raised by the counter store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CounterError {
    #[error("post {0} has no counter row")]
    MissingPost(Uuid),

    /// The compare-and-swap fallback kept losing to concurrent writers
    #[error("counter for post {post_id} still contended after {attempts} attempts")]
    Contended { post_id: Uuid, attempts: u32 },

    #[error("counter store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for CounterError {
    fn from(err: sqlx::Error) -> Self {
        CounterError::Unavailable(err.to_string())
    }
}

/// Errors raised by the post and profile stores
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Source of truth for "user X liked post Y".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LikeLedger: Send + Sync {
    /// True iff a like row currently exists for the pair
    async fn exists(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, LedgerError>;

    /// Insert a like row; `Conflict` if the pair already has one
    async fn insert(&self, post_id: Uuid, user_id: Uuid) -> Result<Like, LedgerError>;

    /// Remove a like row; `NotFound` if the pair has none
    async fn delete(&self, post_id: Uuid, user_id: Uuid) -> Result<(), LedgerError>;

    /// Batch existence check: which of `post_ids` has `user_id` liked
    async fn existing_likes_for(
        &self,
        post_ids: &[Uuid],
        user_id: Uuid,
    ) -> Result<HashSet<Uuid>, LedgerError>;

    /// Number of like rows referencing a post
    async fn count_for_post(&self, post_id: Uuid) -> Result<i64, LedgerError>;
}

/// Denormalized `like_count` on posts.
///
/// Every mutation is a storage-side delta; implementations never write a
/// value computed from an earlier read except in the guarded fallback path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Add one to `like_count`, returning the new value
    async fn increment(&self, post_id: Uuid) -> Result<i64, CounterError>;

    /// Subtract one from `like_count`, clamped at zero, returning the new value
    async fn decrement(&self, post_id: Uuid) -> Result<i64, CounterError>;

    async fn like_count(&self, post_id: Uuid) -> Result<i64, CounterError>;

    /// Recompute `like_count` from the ledger in a single statement
    async fn reconcile(&self, post_id: Uuid) -> Result<i64, CounterError>;

    /// Posts whose `like_count` differs from their ledger row count
    async fn find_drifted(&self, limit: i64) -> Result<Vec<Uuid>, CounterError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, new_post: NewPost) -> Result<Post, StoreError>;

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>, StoreError>;

    /// Posts of a community, newest first
    async fn list_community_posts(
        &self,
        community_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, StoreError>;
}

/// Identity collaborator: resolves author display fields
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Unknown ids are simply absent from the returned map
    async fn resolve_profiles(
        &self,
        user_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, AuthorProfile>, StoreError>;
}
