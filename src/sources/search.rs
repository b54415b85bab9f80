// src/sources/search.rs
//! Site-restricted web-search tier. Queries a SearXNG-style JSON endpoint
//! with `site:<host> <keyword>` so a source outage degrades to whatever a
//! general search index still has, instead of failing the task.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Deserialize;

use super::{Engagement, FetchStrategy, RawItem};
use crate::enrich::normalize_text;

pub struct SiteSearch {
    client: reqwest::Client,
    endpoint: String,
    site: String,
    source: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    title: Option<String>,
    content: Option<String>,
    url: String,
    #[serde(rename = "publishedDate")]
    published_date: Option<String>,
}

impl SiteSearch {
    pub fn new(client: reqwest::Client, endpoint: String, site: String, source: String) -> Self {
        Self {
            client,
            endpoint,
            site,
            source,
        }
    }
}

#[async_trait]
impl FetchStrategy for SiteSearch {
    async fn fetch(&self, keyword: &str, limit: usize) -> Result<Vec<RawItem>> {
        let query = format!("site:{} {}", self.site, keyword);
        let resp: SearchResponse = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query.as_str()), ("format", "json")])
            .send()
            .await
            .context("site search request")?
            .error_for_status()
            .context("site search status")?
            .json()
            .await
            .context("site search body")?;

        let mut out = Vec::new();
        for r in resp.results.into_iter().take(limit) {
            let text_raw = format!(
                "{}. {}",
                r.title.as_deref().unwrap_or_default(),
                r.content.as_deref().unwrap_or_default()
            );
            let content = normalize_text(&text_raw);
            if content.is_empty() {
                continue;
            }
            out.push(RawItem {
                source: self.source.clone(),
                author: None,
                content,
                url: r.url,
                created_at: r
                    .published_date
                    .as_deref()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(Utc::now),
                engagement: Engagement::default(),
            });
        }
        counter!("fetch_items_total", "tier" => "site-search").increment(out.len() as u64);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "site-search"
    }
}
