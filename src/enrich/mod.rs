// src/enrich/mod.rs
//! Enrichment pipeline: raw scraped items gain sentiment, language,
//! country, and a brand relevance score. Enrichment itself is pure and
//! total — malformed input gets neutral defaults, never an error — while
//! the batch-level `process` applies near-duplicate collapse and the
//! relevance gate before anything reaches persistence.

pub mod language;
pub mod relevance;
pub mod sentiment;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use strsim::normalized_levenshtein;

use crate::config::Settings;
use crate::sources::RawItem;
use relevance::RelevanceScorer;
use sentiment::{SentimentAnalyzer, SentimentLabel};

/// Texts at least this similar (normalized Levenshtein) within one batch
/// collapse to the first occurrence.
const NEAR_DUP_SIMILARITY: f64 = 0.92;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("enrich_items_total", "Items entering the enrichment pipeline.");
        describe_counter!("enrich_gated_total", "Items dropped by the relevance gate.");
        describe_counter!("enrich_near_dup_total", "Items collapsed as near-duplicate text.");
    });
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedItem {
    #[serde(flatten)]
    pub item: RawItem,
    pub sentiment_score: f32,
    pub sentiment_label: SentimentLabel,
    pub language: String,
    pub country: String,
    pub relevance_score: f32,
}

pub struct EnrichmentPipeline {
    analyzer: SentimentAnalyzer,
    scorer: RelevanceScorer,
}

impl EnrichmentPipeline {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            analyzer: SentimentAnalyzer::new(),
            scorer: RelevanceScorer::new(&settings.brand, &settings.relevance),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.scorer.threshold()
    }

    /// Pure per-item enrichment. Empty content yields neutral defaults
    /// (score 0, neutral label, undetermined language); rejection is the
    /// gate's job, not this function's.
    pub fn enrich(&self, mut raw: RawItem) -> EnrichedItem {
        raw.content = normalize_text(&raw.content);
        let (sentiment_score, sentiment_label) = if raw.content.is_empty() {
            (0.0, SentimentLabel::Neutral)
        } else {
            self.analyzer.score_and_label(&raw.content)
        };
        let language = language::detect_language(&raw.content).to_string();
        let country = language::country_from_url(&raw.url);
        let relevance_score = self.scorer.score(&raw.content, &raw.url);
        EnrichedItem {
            item: raw,
            sentiment_score,
            sentiment_label,
            language,
            country,
            relevance_score,
        }
    }

    /// Batch path used by workers: enrich, collapse near-duplicate texts,
    /// then drop everything under the relevance threshold. Gated items
    /// never reach persistence or a task's `added` count.
    pub fn process(&self, items: Vec<RawItem>) -> Vec<EnrichedItem> {
        ensure_metrics_described();
        counter!("enrich_items_total").increment(items.len() as u64);

        let mut kept: Vec<EnrichedItem> = Vec::with_capacity(items.len());
        let mut near_dups = 0u64;
        let mut gated = 0u64;

        'items: for raw in items {
            let enriched = self.enrich(raw);
            for prior in &kept {
                if normalized_levenshtein(&prior.item.content, &enriched.item.content)
                    >= NEAR_DUP_SIMILARITY
                {
                    near_dups += 1;
                    continue 'items;
                }
            }
            if enriched.relevance_score < self.scorer.threshold() {
                gated += 1;
                continue;
            }
            kept.push(enriched);
        }

        counter!("enrich_near_dup_total").increment(near_dups);
        counter!("enrich_gated_total").increment(gated);
        kept
    }
}

/// Normalize text: entity-decode, strip tags, straighten quotes, collapse
/// whitespace, trim trailing sentence punctuation, cap length.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize curly quotes and guillemets to ASCII
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Strip trailing sentence punctuation (keep quotes)
    while let Some(last) = out.chars().last() {
        if matches!(last, '!' | '?' | '.' | ',') {
            out.pop();
        } else {
            break;
        }
    }

    // 6) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}
