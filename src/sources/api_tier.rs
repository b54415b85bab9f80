// src/sources/api_tier.rs
//! Native-API tiers: sources that expose a public JSON search endpoint.
//! These are the primary tier of their fallback chain; the executor only
//! consults search/feed tiers when these fail or come back empty.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use metrics::counter;
use serde::Deserialize;

use super::{Engagement, FetchStrategy, RawItem};
use crate::enrich::normalize_text;

const GITHUB_SEARCH_URL: &str = "https://api.github.com/search/issues";
const REDDIT_SEARCH_URL: &str = "https://www.reddit.com/search.json";
const HN_SEARCH_URL: &str = "https://hn.algolia.com/api/v1/search";

fn clamp_page_size(limit: usize) -> usize {
    limit.clamp(1, 100)
}

// --- GitHub issue/PR search ---

pub struct GithubIssueSearch {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GhSearchResponse {
    #[serde(default)]
    items: Vec<GhIssue>,
}

#[derive(Debug, Deserialize)]
struct GhIssue {
    title: Option<String>,
    body: Option<String>,
    html_url: String,
    user: Option<GhUser>,
    created_at: Option<String>,
    comments: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GhUser {
    login: String,
}

impl GithubIssueSearch {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetchStrategy for GithubIssueSearch {
    async fn fetch(&self, keyword: &str, limit: usize) -> Result<Vec<RawItem>> {
        let resp: GhSearchResponse = self
            .client
            .get(GITHUB_SEARCH_URL)
            .query(&[
                ("q", keyword),
                ("per_page", &clamp_page_size(limit).to_string()),
            ])
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .context("github search request")?
            .error_for_status()
            .context("github search status")?
            .json()
            .await
            .context("github search body")?;

        let mut out = Vec::with_capacity(resp.items.len().min(limit));
        for issue in resp.items.into_iter().take(limit) {
            let text_raw = format!(
                "{}. {}",
                issue.title.as_deref().unwrap_or_default(),
                issue.body.as_deref().unwrap_or_default()
            );
            let content = normalize_text(&text_raw);
            if content.is_empty() {
                continue;
            }
            out.push(RawItem {
                source: "github".to_string(),
                author: issue.user.map(|u| u.login),
                content,
                url: issue.html_url,
                created_at: parse_rfc3339(issue.created_at.as_deref()),
                engagement: Engagement {
                    likes: None,
                    comments: issue.comments,
                },
            });
        }
        counter!("fetch_items_total", "tier" => "github-api").increment(out.len() as u64);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "github-api"
    }
}

// --- Reddit search ---

pub struct RedditSearch {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RedditListing {
    data: RedditListingData,
}

#[derive(Debug, Deserialize)]
struct RedditListingData {
    #[serde(default)]
    children: Vec<RedditChild>,
}

#[derive(Debug, Deserialize)]
struct RedditChild {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    title: Option<String>,
    selftext: Option<String>,
    permalink: String,
    author: Option<String>,
    created_utc: Option<f64>,
    ups: Option<u32>,
    num_comments: Option<u32>,
}

impl RedditSearch {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetchStrategy for RedditSearch {
    async fn fetch(&self, keyword: &str, limit: usize) -> Result<Vec<RawItem>> {
        let listing: RedditListing = self
            .client
            .get(REDDIT_SEARCH_URL)
            .query(&[
                ("q", keyword),
                ("limit", &clamp_page_size(limit).to_string()),
                ("sort", "new"),
            ])
            .send()
            .await
            .context("reddit search request")?
            .error_for_status()
            .context("reddit search status")?
            .json()
            .await
            .context("reddit search body")?;

        let mut out = Vec::new();
        for child in listing.data.children.into_iter().take(limit) {
            let p = child.data;
            let text_raw = format!(
                "{}. {}",
                p.title.as_deref().unwrap_or_default(),
                p.selftext.as_deref().unwrap_or_default()
            );
            let content = normalize_text(&text_raw);
            if content.is_empty() {
                continue;
            }
            out.push(RawItem {
                source: "reddit".to_string(),
                author: p.author,
                content,
                url: format!("https://www.reddit.com{}", p.permalink),
                created_at: p
                    .created_utc
                    .and_then(|ts| Utc.timestamp_opt(ts as i64, 0).single())
                    .unwrap_or_else(Utc::now),
                engagement: Engagement {
                    likes: p.ups,
                    comments: p.num_comments,
                },
            });
        }
        counter!("fetch_items_total", "tier" => "reddit-api").increment(out.len() as u64);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "reddit-api"
    }
}

// --- Hacker News (Algolia) search ---

pub struct HackerNewsSearch {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct HnSearchResponse {
    #[serde(default)]
    hits: Vec<HnHit>,
}

#[derive(Debug, Deserialize)]
struct HnHit {
    title: Option<String>,
    story_text: Option<String>,
    comment_text: Option<String>,
    url: Option<String>,
    #[serde(rename = "objectID")]
    object_id: String,
    author: Option<String>,
    created_at: Option<String>,
    points: Option<u32>,
    num_comments: Option<u32>,
}

impl HackerNewsSearch {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetchStrategy for HackerNewsSearch {
    async fn fetch(&self, keyword: &str, limit: usize) -> Result<Vec<RawItem>> {
        let resp: HnSearchResponse = self
            .client
            .get(HN_SEARCH_URL)
            .query(&[
                ("query", keyword),
                ("hitsPerPage", &clamp_page_size(limit).to_string()),
            ])
            .send()
            .await
            .context("hn search request")?
            .error_for_status()
            .context("hn search status")?
            .json()
            .await
            .context("hn search body")?;

        let mut out = Vec::new();
        for hit in resp.hits.into_iter().take(limit) {
            let text_raw = format!(
                "{}. {}",
                hit.title.as_deref().unwrap_or_default(),
                hit.story_text
                    .as_deref()
                    .or(hit.comment_text.as_deref())
                    .unwrap_or_default()
            );
            let content = normalize_text(&text_raw);
            if content.is_empty() {
                continue;
            }
            let url = hit.url.unwrap_or_else(|| {
                format!("https://news.ycombinator.com/item?id={}", hit.object_id)
            });
            out.push(RawItem {
                source: "hackernews".to_string(),
                author: hit.author,
                content,
                url,
                created_at: parse_rfc3339(hit.created_at.as_deref()),
                engagement: Engagement {
                    likes: hit.points,
                    comments: hit.num_comments,
                },
            });
        }
        counter!("fetch_items_total", "tier" => "hackernews-api").increment(out.len() as u64);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "hackernews-api"
    }
}

fn parse_rfc3339(ts: Option<&str>) -> DateTime<Utc> {
    ts.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}
