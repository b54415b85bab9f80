// src/store/url_norm.rs
//! URL normalization: the dedup key. Cosmetically different URLs to the
//! same content must collapse to one key — lowercase scheme/host, no
//! fragment, no default port, no tracking parameters, no trailing slash
//! on non-root paths.

use url::Url;

/// Query parameters that identify campaigns, not content.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "igshid", "mc_cid", "mc_eid", "ref_src", "spm", "utm_campaign",
    "utm_content", "utm_medium", "utm_source", "utm_term",
];

fn is_tracking_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("utm_") || TRACKING_PARAMS.contains(&lower.as_str())
}

/// Normalize an http(s) URL to its dedup key. Returns `None` for anything
/// unparseable or non-web.
pub fn normalize_url(raw: &str) -> Option<String> {
    // Url::parse already lowercases scheme and host and drops default ports.
    let mut u = Url::parse(raw.trim()).ok()?;
    if !matches!(u.scheme(), "http" | "https") {
        return None;
    }
    u.set_fragment(None);

    let kept: Vec<(String, String)> = u
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        u.set_query(None);
    } else {
        let mut qs = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &kept {
            qs.append_pair(k, v);
        }
        u.set_query(Some(&qs.finish()));
    }

    if u.path().len() > 1 && u.path().ends_with('/') {
        let trimmed = u.path().trim_end_matches('/').to_string();
        u.set_path(&trimmed);
    }

    Some(u.to_string())
}
