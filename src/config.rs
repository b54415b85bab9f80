// src/config.rs
//! Process configuration: brand profile, relevance weights, job bounds,
//! source table, and notification triggers. One TOML file, optionally
//! pointed at via `MONITOR_CONFIG_PATH`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::notify::NotificationTrigger;

pub const ENV_CONFIG_PATH: &str = "MONITOR_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/monitor.toml";

/// Relevance gate cutoff applied when the config does not say otherwise.
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.30;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub brand: BrandConfig,
    pub relevance: RelevanceConfig,
    pub jobs: JobsConfig,
    pub search: SearchConfig,
    pub sources: Vec<SourceConfig>,
    pub notify: NotifyConfig,
}

/// The tracked brand: everything the relevance scorer matches against.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrandConfig {
    pub name: String,
    /// Alternate spellings and product-line names counted as brand mentions.
    pub aliases: Vec<String>,
    /// Domains owned by the brand; a link into one of them is a strong signal.
    pub domains: Vec<String>,
    /// Named executives/founders.
    pub leadership: Vec<String>,
    /// Product keywords.
    pub products: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    pub threshold: f32,
    pub weights: RelevanceWeights,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_RELEVANCE_THRESHOLD,
            weights: RelevanceWeights::default(),
        }
    }
}

/// Additive signal weights. The score is normalized by the weight sum, so
/// only the ratios matter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelevanceWeights {
    pub brand_mention: u32,
    pub domain_match: u32,
    pub leadership_mention: u32,
    pub product_mention: u32,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            brand_mention: 4,
            domain_match: 3,
            leadership_mention: 2,
            product_mention: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Process-wide cap on a single job's worker pool.
    pub max_concurrency: usize,
    /// Per-strategy-tier timeout. A hung fetch must never pin a worker.
    pub tier_timeout_secs: u64,
    /// Default per-task item limit when the request omits one.
    pub default_limit: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            tier_timeout_secs: 20,
            default_limit: 25,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// SearXNG-style JSON search endpoint used by the site-restricted
    /// fallback tier. Absent endpoint disables that tier for all sources.
    pub endpoint: Option<String>,
}

/// One scrapeable source. The adapter registry turns each entry into an
/// ordered strategy list at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    /// Site restriction for the web-search fallback tier, e.g. "reddit.com".
    #[serde(default)]
    pub site: Option<String>,
    /// RSS feed URL template with a `{keyword}` placeholder.
    #[serde(default)]
    pub feed: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Bound on the insert→dispatcher channel; a full queue drops events.
    pub queue_capacity: usize,
    /// How far back the dispatcher looks for batch-mates of a fresh match.
    pub batch_window_secs: u64,
    pub triggers: Vec<NotificationTrigger>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            batch_window_secs: 900,
            triggers: Vec::new(),
        }
    }
}

impl Settings {
    /// Load using env var + fallbacks:
    /// 1) $MONITOR_CONFIG_PATH (error if it points nowhere)
    /// 2) config/monitor.toml
    /// 3) built-in defaults
    pub fn load() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            let content = fs::read_to_string(&pb)
                .with_context(|| format!("reading config from {}", pb.display()))?;
            return Self::from_toml_str(&content);
        }
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default.exists() {
            let content = fs::read_to_string(&default)
                .with_context(|| format!("reading config from {}", default.display()))?;
            return Self::from_toml_str(&content);
        }
        Ok(Self::default())
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: Settings = toml::from_str(s).context("parsing monitor config")?;
        if !cfg.relevance.threshold.is_finite() {
            cfg.relevance.threshold = DEFAULT_RELEVANCE_THRESHOLD;
        }
        cfg.relevance.threshold = cfg.relevance.threshold.clamp(0.0, 1.0);
        Ok(cfg)
    }
}
