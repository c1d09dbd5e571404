//! Discovery adapters (C6): anchor extraction, regex harvest, and the
//! external discovery provider interface, plus seed-file config structs.

mod provider;
mod seed;

pub use provider::{Candidate, DiscoveryProvider, NullProvider, NullRssProvider, RssEntry, RssProvider};
pub use seed::{Seed, Source};

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

static ASSET_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(js|mjs|css|png|jpe?g|gif|svg|ico|json|map|woff2?|ttf|eot|mp4|webm)(\?|$)")
        .unwrap()
});

static URL_SHAPED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).unwrap());

/// Is `url` a document URL: `http(s)` and not asset-shaped (GLOSSARY
/// "Document URL").
pub fn is_document_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    matches!(parsed.scheme(), "http" | "https") && !ASSET_EXTENSION.is_match(parsed.path())
}

pub(crate) fn host_is_allowed(url: &str, allowed_hosts: &[String]) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    allowed_hosts
        .iter()
        .any(|allowed| host == allowed || host.ends_with(&format!(".{allowed}")))
}

/// Collect every `<a href>` on a list page, resolved against `base_url`,
/// filtered to document URLs on allow-listed hosts, deduped preserving
/// first-seen order (spec.md §4.6 "Anchor extraction").
pub fn anchors(base_url: &str, html: &str, allowed_hosts: &[String]) -> Vec<String> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse("a[href]").unwrap();
    let base = Url::parse(base_url).ok();

    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for element in doc.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }

        let resolved = match &base {
            Some(base) => base.join(href).ok().map(|u| u.to_string()),
            None => Some(href.to_string()),
        };
        let Some(resolved) = resolved else { continue };

        if !is_document_url(&resolved) || !host_is_allowed(&resolved, allowed_hosts) {
            continue;
        }
        if seen.insert(resolved.clone()) {
            out.push(resolved);
        }
    }

    out
}

/// Scan raw body text for URL-shaped substrings restricted to allow-listed
/// hosts (spec.md §4.6 "Regex harvest"). Same filters as `anchors`.
pub fn regex_harvest(body: &str, allowed_hosts: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for m in URL_SHAPED.find_iter(body) {
        let candidate = m.as_str().trim_end_matches(|c: char| ",.;)\"'".contains(c));
        if !is_document_url(candidate) || !host_is_allowed(candidate, allowed_hosts) {
            continue;
        }
        if seen.insert(candidate.to_string()) {
            out.push(candidate.to_string());
        }
    }

    out
}

/// Concatenate anchors + regex-harvest + external-discovery candidates,
/// dedupe by URL (first-seen order), cap per host at `max_per_domain`, then
/// truncate to `max_new` (spec.md §4.6).
pub fn merge_candidates(
    lists: [Vec<String>; 3],
    max_per_domain: usize,
    max_new: usize,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut per_host: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut out = Vec::new();

    for list in lists {
        for url in list {
            if !seen.insert(url.clone()) {
                continue;
            }
            let host = Url::parse(&url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_default();
            let count = per_host.entry(host).or_insert(0);
            if *count >= max_per_domain {
                continue;
            }
            *count += 1;
            out.push(url);
            if out.len() >= max_new {
                return out;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts() -> Vec<String> {
        vec!["allowed.example".to_string()]
    }

    #[test]
    fn document_url_rejects_asset_extensions() {
        assert!(is_document_url("https://allowed.example/a.html"));
        assert!(!is_document_url("https://allowed.example/a.png"));
        assert!(!is_document_url("https://allowed.example/a.js?v=2"));
    }

    #[test]
    fn anchors_resolves_relative_links_and_drops_fragments() {
        let html = r#"<a href="/p/1">one</a><a href="#top">skip</a><a href="https://other.example/x">skip host</a>"#;
        let found = anchors("https://allowed.example/l", html, &hosts());
        assert_eq!(found, vec!["https://allowed.example/p/1"]);
    }

    #[test]
    fn anchors_dedupe_preserving_first_seen_order() {
        let html = r#"<a href="/a">1</a><a href="/b">2</a><a href="/a">again</a>"#;
        let found = anchors("https://allowed.example/l", html, &hosts());
        assert_eq!(found, vec!["https://allowed.example/a", "https://allowed.example/b"]);
    }

    #[test]
    fn regex_harvest_only_keeps_allowed_hosts() {
        let body = "see https://allowed.example/doc and https://other.example/doc.";
        let found = regex_harvest(body, &hosts());
        assert_eq!(found, vec!["https://allowed.example/doc"]);
    }

    #[test]
    fn merge_candidates_caps_per_host_and_truncates() {
        let a: Vec<String> = (0..5).map(|i| format!("https://allowed.example/{i}")).collect();
        let merged = merge_candidates([a, vec![], vec![]], 3, 10);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn merge_candidates_respects_max_new_across_sources() {
        let a = vec!["https://allowed.example/1".to_string()];
        let b = vec!["https://allowed.example/2".to_string(), "https://allowed.example/3".to_string()];
        let merged = merge_candidates([a, b, vec![]], 10, 2);
        assert_eq!(merged.len(), 2);
    }
}
