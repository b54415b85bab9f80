// src/store/mod.rs
//! Post persistence with strict URL dedup. The uniqueness check and the
//! write happen inside one lock, so concurrent tasks discovering the same
//! URL via different sources produce exactly one Post — the store, not the
//! caller, is the source of truth for dedup.

pub mod url_norm;

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::enrich::sentiment::SentimentLabel;
use crate::enrich::EnrichedItem;
use crate::sources::Engagement;

/// A persisted, enriched mention. `url` is the normalized form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: u64,
    pub source: String,
    pub author: Option<String>,
    pub content: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub engagement: Engagement,
    pub sentiment_score: f32,
    pub sentiment_label: SentimentLabel,
    pub language: String,
    pub country: String,
    pub relevance_score: f32,
    pub inserted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(Post),
    /// A Post with the same normalized URL already exists. Normal skip,
    /// not an error.
    Duplicate,
}

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Atomic insert-unless-exists keyed by normalized URL. Errors only on
    /// unusable input (e.g. a URL that cannot be normalized).
    async fn insert(&self, item: &EnrichedItem) -> Result<InsertOutcome>;

    async fn get(&self, id: u64) -> Option<Post>;

    /// Posts inserted within `window` that no trigger has claimed yet.
    async fn recent_unnotified(&self, window: Duration) -> Vec<Post>;

    async fn mark_notified(&self, ids: &[u64]);

    async fn count(&self) -> usize;
}

#[derive(Default)]
struct Inner {
    by_url: HashMap<String, u64>,
    posts: HashMap<u64, Post>,
    notified: std::collections::HashSet<u64>,
    next_id: u64,
}

/// In-memory store. The single mutex is the storage boundary: check and
/// write are one critical section, which is what makes concurrent
/// same-URL inserts yield exactly one row.
#[derive(Default)]
pub struct InMemoryPostStore {
    inner: Mutex<Inner>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn insert(&self, item: &EnrichedItem) -> Result<InsertOutcome> {
        let url = url_norm::normalize_url(&item.item.url)
            .ok_or_else(|| anyhow!("unusable url: {}", item.item.url))?;

        let mut inner = self.inner.lock().expect("post store lock poisoned");
        if inner.by_url.contains_key(&url) {
            return Ok(InsertOutcome::Duplicate);
        }
        inner.next_id += 1;
        let id = inner.next_id;
        let post = Post {
            id,
            source: item.item.source.clone(),
            author: item.item.author.clone(),
            content: item.item.content.clone(),
            url: url.clone(),
            created_at: item.item.created_at,
            engagement: item.item.engagement,
            sentiment_score: item.sentiment_score,
            sentiment_label: item.sentiment_label,
            language: item.language.clone(),
            country: item.country.clone(),
            relevance_score: item.relevance_score,
            inserted_at: Utc::now(),
        };
        inner.by_url.insert(url, id);
        inner.posts.insert(id, post.clone());
        Ok(InsertOutcome::Inserted(post))
    }

    async fn get(&self, id: u64) -> Option<Post> {
        self.inner
            .lock()
            .expect("post store lock poisoned")
            .posts
            .get(&id)
            .cloned()
    }

    async fn recent_unnotified(&self, window: Duration) -> Vec<Post> {
        let cutoff = Utc::now() - window;
        let inner = self.inner.lock().expect("post store lock poisoned");
        let mut out: Vec<Post> = inner
            .posts
            .values()
            .filter(|p| p.inserted_at >= cutoff && !inner.notified.contains(&p.id))
            .cloned()
            .collect();
        out.sort_by_key(|p| p.id);
        out
    }

    async fn mark_notified(&self, ids: &[u64]) {
        let mut inner = self.inner.lock().expect("post store lock poisoned");
        inner.notified.extend(ids.iter().copied());
    }

    async fn count(&self) -> usize {
        self.inner.lock().expect("post store lock poisoned").posts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::RawItem;

    fn enriched(url: &str) -> EnrichedItem {
        EnrichedItem {
            item: RawItem {
                source: "test".into(),
                author: Some("a".into()),
                content: "Acme outage".into(),
                url: url.into(),
                created_at: Utc::now(),
                engagement: Engagement::default(),
            },
            sentiment_score: -0.5,
            sentiment_label: SentimentLabel::Negative,
            language: "en".into(),
            country: String::new(),
            relevance_score: 0.4,
        }
    }

    #[tokio::test]
    async fn second_insert_of_same_normalized_url_is_a_duplicate() {
        let store = InMemoryPostStore::new();
        let first = store.insert(&enriched("https://e.test/p?utm_source=x")).await.unwrap();
        assert!(matches!(first, InsertOutcome::Inserted(_)));
        let second = store.insert(&enriched("HTTPS://E.TEST/p")).await.unwrap();
        assert_eq!(second, InsertOutcome::Duplicate);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn unusable_url_is_an_error_not_a_row() {
        let store = InMemoryPostStore::new();
        assert!(store.insert(&enriched("not a url")).await.is_err());
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn notified_posts_leave_the_recent_window() {
        let store = InMemoryPostStore::new();
        let InsertOutcome::Inserted(post) =
            store.insert(&enriched("https://e.test/a")).await.unwrap()
        else {
            panic!("expected insert");
        };
        assert_eq!(store.recent_unnotified(Duration::minutes(15)).await.len(), 1);
        store.mark_notified(&[post.id]).await;
        assert!(store.recent_unnotified(Duration::minutes(15)).await.is_empty());
    }
}
