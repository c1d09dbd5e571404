//! Canonical record types shared by extractors, persistence, and the query
//! adapter: one plain struct per entity, `FromStr`/`as_str` pairs for
//! DB-stored enums.

mod fetch_log;
pub mod page;

pub use fetch_log::FetchStatus;
pub use page::Page;

use chrono::{DateTime, Utc};

/// Freshness metadata for a single URL (`http_cache` table).
#[derive(Debug, Clone, PartialEq)]
pub struct HttpCacheEntry {
    pub url: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub last_status: i32,
    pub last_checked_at: DateTime<Utc>,
    pub last_changed_at: DateTime<Utc>,
}

/// Monthly API usage counter (`api_quota` table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiQuota {
    pub used: i32,
    pub quota_limit: i32,
}

impl ApiQuota {
    pub const fn empty() -> Self {
        Self {
            used: 0,
            quota_limit: 0,
        }
    }
}
