use std::sync::Arc;

use sqlx::PgPool;

use crate::config::FeedConfig;
use crate::repository::{
    MemoryStore, PgCounterStore, PgLikeLedger, PgPostRepository, PgProfileDirectory,
};
use crate::services::{EngagementService, FeedService, PostService};

/// App state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub engagement: EngagementService,
    pub feed: FeedService,
    pub posts: PostService,
}

impl AppState {
    pub fn new(engagement: EngagementService, feed: FeedService, posts: PostService) -> Self {
        Self {
            engagement,
            feed,
            posts,
        }
    }

    /// Wire every service to PostgreSQL-backed stores
    pub fn with_postgres(pool: PgPool, feed_config: FeedConfig) -> Self {
        let ledger = Arc::new(PgLikeLedger::new(pool.clone()));
        let counters = Arc::new(PgCounterStore::new(pool.clone()));
        let posts = Arc::new(PgPostRepository::new(pool.clone()));
        let profiles = Arc::new(PgProfileDirectory::new(pool));

        Self::new(
            EngagementService::new(ledger.clone(), counters),
            FeedService::new(posts.clone(), profiles.clone(), ledger, feed_config),
            PostService::new(posts, profiles),
        )
    }

    /// Wire every service to one in-process store
    pub fn with_memory_store(store: Arc<MemoryStore>, feed_config: FeedConfig) -> Self {
        Self::new(
            EngagementService::new(store.clone(), store.clone()),
            FeedService::new(store.clone(), store.clone(), store.clone(), feed_config),
            PostService::new(store.clone(), store),
        )
    }
}
