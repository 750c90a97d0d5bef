//! In-process store implementing every storage trait.
//!
//! Each operation takes the state lock exactly once, so ledger inserts and
//! deletes are atomic with respect to each other and counter deltas never
//! interleave. Used by the test suites and by local runs without PostgreSQL.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::traits::{
    CounterError, CounterStore, LedgerError, LikeLedger, PostRepository, ProfileDirectory,
    StoreError,
};
use crate::domain::models::{AuthorProfile, Like, NewPost, Post};

#[derive(Default)]
struct MemoryState {
    posts: HashMap<Uuid, Post>,
    likes: HashMap<(Uuid, Uuid), Like>,
    profiles: HashMap<Uuid, AuthorProfile>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl MemoryState {
    /// Strictly increasing so that creation order is preserved in feeds
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    fn like_rows(&self, post_id: Uuid) -> i64 {
        self.likes.keys().filter(|(p, _)| *p == post_id).count() as i64
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register author display fields, standing in for the identity service
    pub async fn upsert_profile(&self, profile: AuthorProfile) {
        let mut state = self.state.write().await;
        state.profiles.insert(profile.user_id, profile);
    }

    pub async fn post_count(&self) -> usize {
        self.state.read().await.posts.len()
    }
}

#[async_trait]
impl LikeLedger for MemoryStore {
    async fn exists(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, LedgerError> {
        let state = self.state.read().await;
        Ok(state.likes.contains_key(&(post_id, user_id)))
    }

    async fn insert(&self, post_id: Uuid, user_id: Uuid) -> Result<Like, LedgerError> {
        let mut state = self.state.write().await;
        if !state.posts.contains_key(&post_id) {
            return Err(LedgerError::UnknownPost(post_id));
        }
        if state.likes.contains_key(&(post_id, user_id)) {
            return Err(LedgerError::Conflict { post_id, user_id });
        }

        let like = Like {
            id: Uuid::new_v4(),
            post_id,
            user_id,
            created_at: state.next_timestamp(),
        };
        state.likes.insert((post_id, user_id), like.clone());
        Ok(like)
    }

    async fn delete(&self, post_id: Uuid, user_id: Uuid) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        match state.likes.remove(&(post_id, user_id)) {
            Some(_) => Ok(()),
            None => Err(LedgerError::NotFound { post_id, user_id }),
        }
    }

    async fn existing_likes_for(
        &self,
        post_ids: &[Uuid],
        user_id: Uuid,
    ) -> Result<HashSet<Uuid>, LedgerError> {
        let state = self.state.read().await;
        Ok(post_ids
            .iter()
            .copied()
            .filter(|post_id| state.likes.contains_key(&(*post_id, user_id)))
            .collect())
    }

    async fn count_for_post(&self, post_id: Uuid) -> Result<i64, LedgerError> {
        Ok(self.state.read().await.like_rows(post_id))
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, post_id: Uuid) -> Result<i64, CounterError> {
        let mut state = self.state.write().await;
        let post = state
            .posts
            .get_mut(&post_id)
            .ok_or(CounterError::MissingPost(post_id))?;
        post.like_count += 1;
        Ok(post.like_count)
    }

    async fn decrement(&self, post_id: Uuid) -> Result<i64, CounterError> {
        let mut state = self.state.write().await;
        let post = state
            .posts
            .get_mut(&post_id)
            .ok_or(CounterError::MissingPost(post_id))?;
        post.like_count = (post.like_count - 1).max(0);
        Ok(post.like_count)
    }

    async fn like_count(&self, post_id: Uuid) -> Result<i64, CounterError> {
        let state = self.state.read().await;
        state
            .posts
            .get(&post_id)
            .map(|post| post.like_count)
            .ok_or(CounterError::MissingPost(post_id))
    }

    async fn reconcile(&self, post_id: Uuid) -> Result<i64, CounterError> {
        let mut state = self.state.write().await;
        let rows = state.like_rows(post_id);
        let post = state
            .posts
            .get_mut(&post_id)
            .ok_or(CounterError::MissingPost(post_id))?;
        post.like_count = rows;
        Ok(rows)
    }

    async fn find_drifted(&self, limit: i64) -> Result<Vec<Uuid>, CounterError> {
        let state = self.state.read().await;

        let mut rows_by_post: HashMap<Uuid, i64> = HashMap::new();
        for (post_id, _) in state.likes.keys() {
            *rows_by_post.entry(*post_id).or_default() += 1;
        }

        let mut drifted: Vec<Uuid> = state
            .posts
            .values()
            .filter(|post| post.like_count != rows_by_post.get(&post.id).copied().unwrap_or(0))
            .map(|post| post.id)
            .collect();
        drifted.sort();
        drifted.truncate(limit.max(0) as usize);
        Ok(drifted)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create_post(&self, new_post: NewPost) -> Result<Post, StoreError> {
        let mut state = self.state.write().await;
        let now = state.next_timestamp();
        let post = Post {
            id: Uuid::new_v4(),
            community_id: new_post.community_id,
            author_id: new_post.author_id,
            title: new_post.title,
            content: new_post.content,
            category: new_post.category,
            is_pinned: false,
            like_count: 0,
            comment_count: 0,
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>, StoreError> {
        Ok(self.state.read().await.posts.get(&post_id).cloned())
    }

    async fn list_community_posts(
        &self,
        community_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, StoreError> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|post| post.community_id == community_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

#[async_trait]
impl ProfileDirectory for MemoryStore {
    async fn resolve_profiles(
        &self,
        user_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, AuthorProfile>, StoreError> {
        let state = self.state.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| state.profiles.get(id).map(|p| (*id, p.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::DEFAULT_CATEGORY;

    fn new_post(community_id: Uuid) -> NewPost {
        NewPost {
            community_id,
            author_id: Uuid::new_v4(),
            title: None,
            content: "hello".to_string(),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_twice_conflicts() {
        let store = MemoryStore::new();
        let post = store.create_post(new_post(Uuid::new_v4())).await.unwrap();
        let user_id = Uuid::new_v4();

        store.insert(post.id, user_id).await.unwrap();
        let err = store.insert(post.id, user_id).await.unwrap_err();

        assert_eq!(
            err,
            LedgerError::Conflict {
                post_id: post.id,
                user_id
            }
        );
        assert_eq!(store.count_for_post(post.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_like_is_not_found() {
        let store = MemoryStore::new();
        let post = store.create_post(new_post(Uuid::new_v4())).await.unwrap();

        let err = store.delete(post.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_insert_on_unknown_post() {
        let store = MemoryStore::new();
        let post_id = Uuid::new_v4();

        let err = store.insert(post_id, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err, LedgerError::UnknownPost(post_id));
    }

    #[tokio::test]
    async fn test_decrement_floors_at_zero() {
        let store = MemoryStore::new();
        let post = store.create_post(new_post(Uuid::new_v4())).await.unwrap();

        for _ in 0..3 {
            assert_eq!(store.decrement(post.id).await.unwrap(), 0);
        }
        assert_eq!(store.like_count(post.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_paged() {
        let store = MemoryStore::new();
        let community_id = Uuid::new_v4();
        let first = store.create_post(new_post(community_id)).await.unwrap();
        let second = store.create_post(new_post(community_id)).await.unwrap();
        let third = store.create_post(new_post(community_id)).await.unwrap();
        store.create_post(new_post(Uuid::new_v4())).await.unwrap();

        let all = store
            .list_community_posts(community_id, 10, 0)
            .await
            .unwrap();
        let ids: Vec<Uuid> = all.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);

        let page = store
            .list_community_posts(community_id, 1, 1)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, second.id);
    }

    #[tokio::test]
    async fn test_find_drifted_and_reconcile() {
        let store = MemoryStore::new();
        let post = store.create_post(new_post(Uuid::new_v4())).await.unwrap();
        store.insert(post.id, Uuid::new_v4()).await.unwrap();

        assert_eq!(store.find_drifted(10).await.unwrap(), vec![post.id]);
        assert_eq!(store.reconcile(post.id).await.unwrap(), 1);
        assert!(store.find_drifted(10).await.unwrap().is_empty());
    }
}
