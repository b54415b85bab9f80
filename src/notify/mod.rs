// src/notify/mod.rs
//! Alerting: triggers are matched against freshly persisted posts, rate
//! limited per trigger by a cooldown, and delivered as one batched email.
//! The insert path hands posts to the dispatcher over a bounded channel
//! and moves on; delivery never blocks or fails a scrape job.

pub mod dispatch;
pub mod email;
pub mod log;

use serde::{Deserialize, Serialize};

use crate::enrich::sentiment::SentimentLabel;
use crate::store::Post;

fn default_true() -> bool {
    true
}

fn default_max_posts() -> usize {
    10
}

/// One alert rule. Owned by configuration; the dispatcher only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationTrigger {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Sentiment labels that match; empty means any.
    #[serde(default)]
    pub sentiments: Vec<SentimentLabel>,
    #[serde(default)]
    pub min_relevance: f32,
    /// Source allow-list; empty means any.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Exact language match when set.
    #[serde(default)]
    pub language: Option<String>,
    pub recipients: Vec<String>,
    pub cooldown_secs: u64,
    #[serde(default = "default_max_posts")]
    pub max_posts_per_email: usize,
}

impl NotificationTrigger {
    pub fn matches(&self, post: &Post) -> bool {
        if !self.sentiments.is_empty() && !self.sentiments.contains(&post.sentiment_label) {
            return false;
        }
        if post.relevance_score < self.min_relevance {
            return false;
        }
        if !self.sources.is_empty() && !self.sources.iter().any(|s| *s == post.source) {
            return false;
        }
        if let Some(lang) = &self.language {
            if !lang.eq_ignore_ascii_case(&post.language) {
                return false;
            }
        }
        true
    }
}
