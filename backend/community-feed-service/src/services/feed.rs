/// Feed assembly: community posts joined with authors and viewer like state
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::config::FeedConfig;
use crate::domain::models::{Post, PostView};
use crate::error::{ServiceError, ServiceResult};
use crate::metrics::{FEED_REQUEST_DURATION_SECONDS, FEED_REQUEST_TOTAL};
use crate::repository::{LikeLedger, PostRepository, ProfileDirectory};

/// Offset paging requested by the caller; unset fields fall back to config
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedPage {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostRepository>,
    profiles: Arc<dyn ProfileDirectory>,
    ledger: Arc<dyn LikeLedger>,
    config: FeedConfig,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        profiles: Arc<dyn ProfileDirectory>,
        ledger: Arc<dyn LikeLedger>,
        config: FeedConfig,
    ) -> Self {
        Self {
            posts,
            profiles,
            ledger,
            config,
        }
    }

    /// Assemble the feed of a community, newest first.
    ///
    /// Every call re-runs the full assembly. Either the whole page is
    /// returned or `FetchFailed`; never a partially decorated page.
    pub async fn get_feed(
        &self,
        community_id: Uuid,
        viewer_id: Option<Uuid>,
        page: FeedPage,
    ) -> ServiceResult<Vec<PostView>> {
        let start = Instant::now();
        let limit = sanitize_limit(
            page.limit,
            1,
            self.config.max_limit,
            self.config.default_limit,
        );
        let offset = page.offset.unwrap_or(0).max(0);

        let result = self
            .assemble(community_id, viewer_id, limit, offset)
            .await;

        let outcome = if result.is_ok() { "ok" } else { "error" };
        FEED_REQUEST_DURATION_SECONDS
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());
        FEED_REQUEST_TOTAL.with_label_values(&[outcome]).inc();

        match &result {
            Ok(views) => tracing::debug!(
                %community_id,
                viewer_id = ?viewer_id,
                limit,
                offset,
                returned = views.len(),
                "Feed assembled"
            ),
            Err(e) => tracing::warn!(%community_id, error = %e, "Feed assembly failed"),
        }

        result
    }

    /// Single-post variant of the feed assembly
    pub async fn get_post(&self, post_id: Uuid, viewer_id: Option<Uuid>) -> ServiceResult<PostView> {
        let post = self
            .posts
            .find_post(post_id)
            .await
            .map_err(ServiceError::fetch)?
            .ok_or_else(|| ServiceError::NotFound(format!("post {}", post_id)))?;

        self.decorate(vec![post], viewer_id)
            .await?
            .pop()
            .ok_or_else(|| ServiceError::Internal("post vanished during assembly".to_string()))
    }

    async fn assemble(
        &self,
        community_id: Uuid,
        viewer_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<PostView>> {
        let posts = self
            .posts
            .list_community_posts(community_id, limit, offset)
            .await
            .map_err(ServiceError::fetch)?;

        self.decorate(posts, viewer_id).await
    }

    /// Join authors and viewer like state with one batch call each.
    async fn decorate(
        &self,
        posts: Vec<Post>,
        viewer_id: Option<Uuid>,
    ) -> ServiceResult<Vec<PostView>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let mut author_ids: Vec<Uuid> = posts.iter().map(|p| p.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let profiles = async {
            self.profiles
                .resolve_profiles(&author_ids)
                .await
                .map_err(ServiceError::fetch)
        };
        let liked = async {
            match viewer_id {
                Some(viewer_id) => self
                    .ledger
                    .existing_likes_for(&post_ids, viewer_id)
                    .await
                    .map_err(ServiceError::fetch),
                None => Ok(HashSet::new()),
            }
        };

        let (profiles, liked) = tokio::try_join!(profiles, liked)?;

        Ok(posts
            .into_iter()
            .map(|post| {
                let author = profiles.get(&post.author_id).cloned();
                let user_has_liked = liked.contains(&post.id);
                PostView::new(post, author, user_has_liked)
            })
            .collect())
    }
}

fn sanitize_limit(value: Option<i64>, min: i64, max: i64, default: i64) -> i64 {
    match value {
        Some(v) if v < min => min,
        Some(v) if v > max => max,
        Some(v) => v,
        None => default,
    }
}
