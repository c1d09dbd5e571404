//! Seed file (YAML) config structs (spec.md §6 "Seed file").

use serde::Deserialize;

/// Top-level seed file: `allowed_hosts` plus the list of crawl sources.
#[derive(Debug, Clone, Deserialize)]
pub struct Seed {
    pub allowed_hosts: Vec<String>,
    pub sources: Vec<Source>,
    /// RSS feeds for the RSS lane (spec.md §4.8 step 2). Not named in
    /// spec.md's seed-file schema, which enumerates only `allowed_hosts`
    /// and `sources` — added here since "fetch each configured feed"
    /// needs the feed list to live somewhere, and the seed file is where
    /// every other piece of run-scoped config already lives.
    #[serde(default)]
    pub feed_urls: Vec<String>,
}

/// One seed-file source: a list page plus per-source link-selection and
/// caps.
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    pub url: String,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub max_new: Option<usize>,
    #[serde(default)]
    pub discover: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

impl Seed {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_seed_file() {
        let yaml = r#"
allowed_hosts:
  - allowed.example
sources:
  - url: https://allowed.example/list
"#;
        let seed = Seed::from_yaml(yaml).unwrap();
        assert_eq!(seed.allowed_hosts, vec!["allowed.example"]);
        assert_eq!(seed.sources.len(), 1);
        assert!(seed.sources[0].include.is_empty());
        assert_eq!(seed.sources[0].max_new, None);
        assert!(seed.feed_urls.is_empty());
    }

    #[test]
    fn parses_feed_urls_when_present() {
        let yaml = r#"
allowed_hosts: [allowed.example]
sources: []
feed_urls:
  - https://allowed.example/rss.xml
"#;
        let seed = Seed::from_yaml(yaml).unwrap();
        assert_eq!(seed.feed_urls, vec!["https://allowed.example/rss.xml"]);
    }

    #[test]
    fn parses_source_with_optional_fields() {
        let yaml = r#"
allowed_hosts: [allowed.example]
sources:
  - url: https://allowed.example/list
    include: ["補助金"]
    exclude: ["archive"]
    max_new: 20
    discover: tavily
    query: "subsidy programs"
"#;
        let seed = Seed::from_yaml(yaml).unwrap();
        let source = &seed.sources[0];
        assert_eq!(source.max_new, Some(20));
        assert_eq!(source.discover.as_deref(), Some("tavily"));
        assert_eq!(source.query.as_deref(), Some("subsidy programs"));
    }
}
