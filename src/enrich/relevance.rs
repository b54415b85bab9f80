// src/enrich/relevance.rs
//! Brand relevance scoring: a weighted additive combination of independent
//! signals (brand mention, owned-domain link, leadership mention, product
//! keyword), normalized so the maximum attainable score is 1.0. Weights
//! come from configuration; the scorer itself is deterministic and
//! order-independent — the same item scores the same no matter which task
//! discovered it.

use regex::Regex;
use url::Url;

use crate::config::{BrandConfig, RelevanceConfig, RelevanceWeights};

/// Per-signal breakdown, useful in tests and debug logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelevanceSignals {
    pub brand_mention: bool,
    pub domain_match: bool,
    pub leadership_mention: bool,
    pub product_mention: bool,
}

#[derive(Debug)]
pub struct RelevanceScorer {
    weights: RelevanceWeights,
    threshold: f32,
    domains: Vec<String>,
    brand_re: Option<Regex>,
    leadership_re: Option<Regex>,
    product_re: Option<Regex>,
}

/// Compile a case-insensitive word-boundary alternation over `terms`.
/// Empty term lists compile to `None` (signal always absent).
fn compile_terms(terms: &[String]) -> Option<Regex> {
    let escaped: Vec<String> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        return None;
    }
    let pattern = format!(r"(?i)\b(?:{})\b", escaped.join("|"));
    // Terms are escaped above, so the pattern is always valid.
    Regex::new(&pattern).ok()
}

impl RelevanceScorer {
    pub fn new(brand: &BrandConfig, relevance: &RelevanceConfig) -> Self {
        let mut brand_terms = brand.aliases.clone();
        if !brand.name.trim().is_empty() {
            brand_terms.push(brand.name.clone());
        }
        Self {
            weights: relevance.weights.clone(),
            threshold: relevance.threshold,
            domains: brand
                .domains
                .iter()
                .map(|d| d.trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
            brand_re: compile_terms(&brand_terms),
            leadership_re: compile_terms(&brand.leadership),
            product_re: compile_terms(&brand.products),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    fn host_matches(&self, url: &str) -> bool {
        let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        else {
            return false;
        };
        self.domains
            .iter()
            .any(|d| host == *d || host.ends_with(&format!(".{d}")))
    }

    pub fn signals(&self, content: &str, url: &str) -> RelevanceSignals {
        RelevanceSignals {
            brand_mention: self
                .brand_re
                .as_ref()
                .is_some_and(|re| re.is_match(content)),
            domain_match: self.host_matches(url),
            leadership_mention: self
                .leadership_re
                .as_ref()
                .is_some_and(|re| re.is_match(content)),
            product_mention: self
                .product_re
                .as_ref()
                .is_some_and(|re| re.is_match(content)),
        }
    }

    /// Normalized score in [0, 1]: sum of the triggered signal weights over
    /// the total weight.
    pub fn score(&self, content: &str, url: &str) -> f32 {
        let s = self.signals(content, url);
        let total = self.weights.brand_mention
            + self.weights.domain_match
            + self.weights.leadership_mention
            + self.weights.product_mention;
        if total == 0 {
            return 0.0;
        }
        let mut hit = 0u32;
        if s.brand_mention {
            hit += self.weights.brand_mention;
        }
        if s.domain_match {
            hit += self.weights.domain_match;
        }
        if s.leadership_mention {
            hit += self.weights.leadership_mention;
        }
        if s.product_mention {
            hit += self.weights.product_mention;
        }
        hit as f32 / total as f32
    }
}
