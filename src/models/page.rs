//! The canonical `Page` record (`pages` table).

use crate::norm::{content_hash, HashedFields};

/// Default title used when an extractor cannot find one (spec: "(無題)").
pub const DEFAULT_TITLE: &str = "(無題)";

/// A fetched document, normalised into the shape every extractor produces
/// and every upsert consumes. Mirrors spec.md §3 "Page" exactly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub rate: Option<String>,
    pub cap: Option<String>,
    pub target: Option<String>,
    pub cost_items: Option<String>,
    pub deadline: Option<String>,
    pub fiscal_year: Option<String>,
    pub call_no: Option<String>,
    pub scheme_type: Option<String>,
    pub period_from: Option<String>,
    pub period_to: Option<String>,
}

impl Page {
    /// A minimal record with just url/title/summary, as produced by the
    /// RSS ingestion lane.
    pub fn minimal(url: impl Into<String>, title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            summary: summary.into(),
            ..Default::default()
        }
    }

    /// Compute the MD5 content hash over the seven hashed fields.
    pub fn content_hash(&self) -> String {
        content_hash(&HashedFields {
            title: Some(self.title.as_str()),
            summary: Some(self.summary.as_str()),
            rate: self.rate.as_deref(),
            cap: self.cap.as_deref(),
            target: self.target.as_deref(),
            cost_items: self.cost_items.as_deref(),
            deadline: self.deadline.as_deref(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_page_defaults_optional_fields_to_none() {
        let page = Page::minimal("https://example.com/a", "t", "s");
        assert_eq!(page.title, "t");
        assert!(page.rate.is_none());
        assert!(page.fiscal_year.is_none());
    }

    #[test]
    fn content_hash_is_stable_across_clones() {
        let page = Page {
            url: "https://example.com/a".into(),
            title: "t".into(),
            summary: "s".into(),
            rate: Some("2/3".into()),
            ..Default::default()
        };
        assert_eq!(page.content_hash(), page.clone().content_hash());
    }
}
