//! External discovery provider interface (spec.md §9 "abstract behind a
//! single interface"), grounded on
//! `original_source/lanes/lane_search_vertex.py`'s graceful-empty-on-error
//! shape.

use async_trait::async_trait;

/// A candidate URL surfaced by an external discovery provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub url: String,
    pub title: Option<String>,
}

/// Either or both of `discover`/`fetch_text` may be backed by a real API;
/// code paths must degrade gracefully when they aren't (spec.md §9).
#[async_trait]
pub trait DiscoveryProvider: Send + Sync {
    /// Search for candidates matching `query`. Returns an empty list on
    /// any provider error — callers never see a discovery-provider error
    /// type (spec.md §4.6 "On any error, return empty").
    async fn discover(&self, query: &str) -> Vec<Candidate>;

    /// Fetch readable main text for `url`, clipped to `max_chars`. `None`
    /// when the provider can't produce text (unset, error, empty result).
    async fn fetch_text(&self, url: &str, max_chars: usize) -> Option<String>;
}

/// No-op provider used when no discovery API keys are configured.
pub struct NullProvider;

#[async_trait]
impl DiscoveryProvider for NullProvider {
    async fn discover(&self, _query: &str) -> Vec<Candidate> {
        Vec::new()
    }

    async fn fetch_text(&self, _url: &str, _max_chars: usize) -> Option<String> {
        None
    }
}

/// One RSS feed entry, already reduced to the fields the RSS lane upserts
/// (spec.md §4.8 step 2: "title, summary, url").
#[derive(Debug, Clone, PartialEq)]
pub struct RssEntry {
    pub url: String,
    pub title: String,
    pub summary: String,
}

/// The RSS feed parser is named only by its interface (spec.md §1: "the
/// core only specifies what it requests from them") — parsing the feed
/// format itself is an external collaborator's job.
#[async_trait]
pub trait RssProvider: Send + Sync {
    /// Fetch and parse one feed, returning its entries. Returns an empty
    /// list on any error, mirroring `DiscoveryProvider::discover`'s
    /// graceful-empty-on-error contract.
    async fn fetch_feed(&self, feed_url: &str) -> Vec<RssEntry>;
}

/// No-op provider used when no feed reader is configured.
pub struct NullRssProvider;

#[async_trait]
impl RssProvider for NullRssProvider {
    async fn fetch_feed(&self, _feed_url: &str) -> Vec<RssEntry> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_provider_discovers_nothing() {
        let provider = NullProvider;
        assert!(provider.discover("anything").await.is_empty());
    }

    #[tokio::test]
    async fn null_provider_fetches_no_text() {
        let provider = NullProvider;
        assert_eq!(provider.fetch_text("https://x", 100).await, None);
    }

    #[tokio::test]
    async fn null_rss_provider_yields_no_entries() {
        let provider = NullRssProvider;
        assert!(provider.fetch_feed("https://example.com/feed.xml").await.is_empty());
    }
}
