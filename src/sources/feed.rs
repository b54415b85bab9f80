// src/sources/feed.rs
//! RSS feed tier: last resort before the implicit empty result. Fetches a
//! per-source feed URL template and keeps only entries mentioning the
//! keyword.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};
use url::form_urlencoded;

use super::{Engagement, FetchStrategy, RawItem};
use crate::enrich::normalize_text;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    author: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|unix| Utc.timestamp_opt(unix, 0).single())
}

pub struct FeedFetch {
    client: reqwest::Client,
    source: String,
    /// URL template with a `{keyword}` placeholder. Templates without the
    /// placeholder are fetched as-is (a plain feed, filtered client-side).
    template: String,
}

impl FeedFetch {
    pub fn new(client: reqwest::Client, source: String, template: String) -> Self {
        Self {
            client,
            source,
            template,
        }
    }

    fn feed_url(&self, keyword: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(keyword.as_bytes()).collect();
        self.template.replace("{keyword}", &encoded)
    }

    fn parse_items(&self, xml: &str, keyword: &str, limit: usize) -> Result<Vec<RawItem>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

        let keyword_lower = keyword.to_lowercase();
        let mut out = Vec::new();
        for it in rss.channel.item {
            if out.len() >= limit {
                break;
            }
            // Dedup key is the URL; entries without a link are unusable.
            let Some(link) = it.link else { continue };
            let text_raw = format!(
                "{}. {}",
                it.title.as_deref().unwrap_or_default(),
                it.description.as_deref().unwrap_or_default()
            );
            let content = normalize_text(&text_raw);
            if content.is_empty() || !content.to_lowercase().contains(&keyword_lower) {
                continue;
            }
            out.push(RawItem {
                source: self.source.clone(),
                author: it.author,
                content,
                url: link,
                created_at: it
                    .pub_date
                    .as_deref()
                    .and_then(parse_rfc2822)
                    .unwrap_or_else(Utc::now),
                engagement: Engagement::default(),
            });
        }

        histogram!("feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("fetch_items_total", "tier" => "feed").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl FetchStrategy for FeedFetch {
    async fn fetch(&self, keyword: &str, limit: usize) -> Result<Vec<RawItem>> {
        let url = self.feed_url(keyword);
        let body = self
            .client
            .get(&url)
            .send()
            .await
            .context("feed request")?
            .error_for_status()
            .context("feed status")?
            .text()
            .await
            .context("feed body")?;
        self.parse_items(&body, keyword, limit)
    }

    fn name(&self) -> &'static str {
        "feed"
    }
}

/// quick-xml rejects HTML named entities; replace the handful that show up
/// in real-world feeds before deserializing.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example feed</title>
    <item>
      <title>Acme launches new VPS line</title>
      <link>https://news.example.test/acme-vps</link>
      <pubDate>Mon, 02 Jun 2025 08:30:00 GMT</pubDate>
      <description>Acme&nbsp;announced a refreshed VPS offer.</description>
    </item>
    <item>
      <title>Unrelated story</title>
      <link>https://news.example.test/other</link>
      <pubDate>Mon, 02 Jun 2025 09:00:00 GMT</pubDate>
      <description>Nothing to see here.</description>
    </item>
    <item>
      <title>Acme without a link is dropped</title>
      <description>Acme again.</description>
    </item>
  </channel>
</rss>"#;

    fn fetcher() -> FeedFetch {
        FeedFetch::new(
            reqwest::Client::new(),
            "news".to_string(),
            "https://news.example.test/rss?q={keyword}".to_string(),
        )
    }

    #[test]
    fn keyword_is_percent_encoded_into_template() {
        let f = fetcher();
        assert_eq!(
            f.feed_url("acme cloud"),
            "https://news.example.test/rss?q=acme+cloud"
        );
    }

    #[test]
    fn parses_and_filters_by_keyword() {
        let f = fetcher();
        let items = f.parse_items(SAMPLE_RSS, "acme", 10).expect("parse");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://news.example.test/acme-vps");
        assert_eq!(items[0].source, "news");
        assert!(items[0].content.contains("refreshed VPS offer"));
        assert_eq!(
            items[0].created_at,
            Utc.with_ymd_and_hms(2025, 6, 2, 8, 30, 0).unwrap()
        );
    }

    #[test]
    fn respects_limit() {
        let f = fetcher();
        let items = f.parse_items(SAMPLE_RSS, "", 1).expect("parse");
        assert_eq!(items.len(), 1);
    }
}
