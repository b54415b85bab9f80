// src/sources/mod.rs
//! Source adapters: the uniform fetch capability behind every scraping
//! task. Each source resolves, at startup, to an ordered list of
//! [`FetchStrategy`] tiers; the fallback executor tries them in order.

pub mod api_tier;
pub mod feed;
pub mod search;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Settings;

/// One scraped mention before enrichment. Never persisted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub source: String,
    pub author: Option<String>,
    pub content: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub engagement: Engagement,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: Option<u32>,
    pub comments: Option<u32>,
}

/// One tier of a source's fallback chain. Implementations must be safe to
/// call from multiple workers concurrently and honor `limit` as an upper
/// bound, not a guarantee.
#[async_trait::async_trait]
pub trait FetchStrategy: Send + Sync {
    async fn fetch(&self, keyword: &str, limit: usize) -> Result<Vec<RawItem>>;
    fn name(&self) -> &'static str;
}

/// A source id bound to its ordered strategy tiers.
pub struct SourceAdapter {
    pub id: String,
    pub strategies: Vec<Box<dyn FetchStrategy>>,
}

/// Source id → adapter, resolved once at startup. Unknown ids are rejected
/// at job creation, never looked up lazily at dispatch time.
#[derive(Default)]
pub struct SourceRegistry {
    adapters: HashMap<String, Arc<SourceAdapter>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: SourceAdapter) {
        self.adapters
            .insert(adapter.id.clone(), Arc::new(adapter));
    }

    pub fn get(&self, id: &str) -> Option<Arc<SourceAdapter>> {
        self.adapters.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.adapters.contains_key(id)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.adapters.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Build the production registry from configuration. Tier order per
    /// source: native API (when we have one for the id), site-restricted
    /// web search, feed fetch. The empty-result terminal tier is implicit
    /// in the executor.
    pub fn from_settings(settings: &Settings, client: reqwest::Client) -> Self {
        let mut registry = Self::new();
        for src in &settings.sources {
            let mut strategies: Vec<Box<dyn FetchStrategy>> = Vec::new();

            match src.id.as_str() {
                "github" => {
                    strategies.push(Box::new(api_tier::GithubIssueSearch::new(client.clone())))
                }
                "reddit" => {
                    strategies.push(Box::new(api_tier::RedditSearch::new(client.clone())))
                }
                "hackernews" => {
                    strategies.push(Box::new(api_tier::HackerNewsSearch::new(client.clone())))
                }
                _ => {}
            }

            if let (Some(endpoint), Some(site)) = (&settings.search.endpoint, &src.site) {
                strategies.push(Box::new(search::SiteSearch::new(
                    client.clone(),
                    endpoint.clone(),
                    site.clone(),
                    src.id.clone(),
                )));
            }

            if let Some(feed) = &src.feed {
                strategies.push(Box::new(feed::FeedFetch::new(
                    client.clone(),
                    src.id.clone(),
                    feed.clone(),
                )));
            }

            if strategies.is_empty() {
                tracing::warn!(source = %src.id, "source has no usable strategy tier, skipping");
                continue;
            }
            registry.register(SourceAdapter {
                id: src.id.clone(),
                strategies,
            });
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_configured_sources() {
        let toml = r#"
[search]
endpoint = "https://searx.example.test/search"

[[sources]]
id = "reddit"
site = "reddit.com"

[[sources]]
id = "blog"
feed = "https://blog.example.test/rss?q={keyword}"

[[sources]]
id = "nothing-configured"
"#;
        let settings = Settings::from_toml_str(toml).expect("settings");
        let registry = SourceRegistry::from_settings(&settings, reqwest::Client::new());

        // reddit: native API + site search
        let reddit = registry.get("reddit").expect("reddit registered");
        assert_eq!(reddit.strategies.len(), 2);
        assert_eq!(reddit.strategies[0].name(), "reddit-api");

        // blog: feed only
        let blog = registry.get("blog").expect("blog registered");
        assert_eq!(blog.strategies.len(), 1);

        // no tiers at all → not registered
        assert!(!registry.contains("nothing-configured"));
        assert_eq!(registry.ids(), vec!["blog".to_string(), "reddit".to_string()]);
    }
}
