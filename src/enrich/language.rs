// src/enrich/language.rs
//! Cheap, deterministic language and country heuristics. Language is the
//! stop-word set with the most hits; country comes from the URL's
//! country-code TLD. Both default to "unknown-ish" values rather than
//! guessing: "und" (BCP-47 undetermined) and an empty country.

use super::sentiment::tokenize;

const EN: &[&str] = &[
    "the", "and", "is", "are", "was", "for", "with", "that", "this", "have", "has", "not", "but",
    "they", "from",
];
const FR: &[&str] = &[
    "le", "la", "les", "des", "une", "est", "sont", "pas", "avec", "pour", "dans", "mais", "nous",
    "vous", "sur",
];
const DE: &[&str] = &[
    "der", "die", "das", "und", "ist", "nicht", "ein", "eine", "mit", "für", "auf", "aber", "wir",
    "sie", "von",
];
const ES: &[&str] = &[
    "el", "la", "los", "las", "una", "es", "son", "no", "con", "para", "pero", "como", "más",
    "este", "por",
];

const LANGS: &[(&str, &[&str])] = &[("en", EN), ("fr", FR), ("de", DE), ("es", ES)];

/// Best stop-word match, "und" when nothing matches (e.g. empty content).
pub fn detect_language(text: &str) -> &'static str {
    let tokens: Vec<String> = tokenize(text).collect();
    if tokens.is_empty() {
        return "und";
    }
    let mut best = ("und", 0usize);
    for (lang, stopwords) in LANGS {
        let hits = tokens
            .iter()
            .filter(|t| stopwords.contains(&t.as_str()))
            .count();
        if hits > best.1 {
            best = (lang, hits);
        }
    }
    best.0
}

/// ISO 3166-1 alpha-2 country from a country-code TLD; empty for generic
/// TLDs or unparseable URLs.
pub fn country_from_url(url: &str) -> String {
    let Some(host) = url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
    else {
        return String::new();
    };
    let tld = host.rsplit('.').next().unwrap_or_default();
    match tld {
        "uk" => "GB",
        "fr" => "FR",
        "de" => "DE",
        "es" => "ES",
        "it" => "IT",
        "nl" => "NL",
        "pl" => "PL",
        "be" => "BE",
        "ch" => "CH",
        "at" => "AT",
        "ca" => "CA",
        "au" => "AU",
        "us" => "US",
        "jp" => "JP",
        "br" => "BR",
        "in" => "IN",
        _ => "",
    }
    .to_string()
}
