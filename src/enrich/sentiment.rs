// src/enrich/sentiment.rs
//! Lexicon polarity scorer. Valences are AFINN-style integers in −4..=4,
//! embedded at build time; the public score is normalized to [−1, 1] and
//! mapped to a three-way label with fixed ±0.05 thresholds.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// Maximum absolute valence in the lexicon; normalization divisor.
const MAX_VALENCE: f32 = 4.0;

pub const POSITIVE_THRESHOLD: f32 = 0.05;
pub const NEGATIVE_THRESHOLD: f32 = -0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "positive"),
            SentimentLabel::Neutral => write!(f, "neutral"),
            SentimentLabel::Negative => write!(f, "negative"),
        }
    }
}

pub fn label_for(score: f32) -> SentimentLabel {
    if score >= POSITIVE_THRESHOLD {
        SentimentLabel::Positive
    } else if score <= NEGATIVE_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_valence(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }

    /// Normalized polarity in [−1, 1]. Text with no lexicon hits scores 0.
    /// Negation: a negator within the preceding 1..=3 tokens inverts the
    /// sign of a word's valence.
    pub fn score_text(&self, text: &str) -> f32 {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut sum: i32 = 0;
        let mut hits: u32 = 0;

        for i in 0..tokens.len() {
            let base = self.word_valence(tokens[i].as_str());
            if base == 0 {
                continue;
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            sum += if negated { -base } else { base };
            hits += 1;
        }

        if hits == 0 {
            return 0.0;
        }
        (sum as f32 / (hits as f32 * MAX_VALENCE)).clamp(-1.0, 1.0)
    }

    pub fn score_and_label(&self, text: &str) -> (f32, SentimentLabel) {
        let score = self.score_text(text);
        (score, label_for(score))
    }
}

/// Alphanumeric tokens, lower-cased. Apostrophes stay inside a token so
/// contractions like "isn't" survive as one word; quoting apostrophes at
/// the edges are trimmed.
pub(crate) fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "without"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_negative_and_neutral_text() {
        let a = SentimentAnalyzer::new();
        assert!(a.score_text("excellent service, reliable and fast") > 0.0);
        assert!(a.score_text("terrible outage, everything is broken") < 0.0);
        assert_eq!(a.score_text("the quarterly report was published"), 0.0);
    }

    #[test]
    fn negation_flips_polarity() {
        let a = SentimentAnalyzer::new();
        let plain = a.score_text("the support team is great");
        let negated = a.score_text("the support team is not great");
        assert!(plain > 0.0);
        assert!(negated < 0.0);
        assert!((plain + negated).abs() < 1e-6, "clean sign flip expected");
    }

    #[test]
    fn contractions_negate_too() {
        let a = SentimentAnalyzer::new();
        assert!(a.score_text("the dashboard is reliable") > 0.0);
        assert!(a.score_text("the dashboard isn't reliable") < 0.0);
        assert!(a.score_text("the migration wasn't smooth at all") < 0.0);
    }

    #[test]
    fn tokenizer_keeps_interior_apostrophes_and_trims_quoting_ones() {
        let tokens: Vec<String> = tokenize("they said 'it isn't great'").collect();
        assert_eq!(tokens, vec!["they", "said", "it", "isn't", "great"]);
    }

    #[test]
    fn score_is_bounded() {
        let a = SentimentAnalyzer::new();
        let s = a.score_text("awesome awesome awesome awesome awesome");
        assert!((-1.0..=1.0).contains(&s));
    }

    #[test]
    fn labels_use_fixed_thresholds() {
        assert_eq!(label_for(0.05), SentimentLabel::Positive);
        assert_eq!(label_for(0.049), SentimentLabel::Neutral);
        assert_eq!(label_for(0.0), SentimentLabel::Neutral);
        assert_eq!(label_for(-0.049), SentimentLabel::Neutral);
        assert_eq!(label_for(-0.05), SentimentLabel::Negative);
    }
}
