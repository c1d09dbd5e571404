//! Query adapter (C11, contract only): the read path the external
//! recommend endpoint consumes (spec.md §4.11). No HTTP server lives
//! here — only the repository-level contract.

use crate::models::Page;
use crate::repository::{Repository, Result};

/// Default page-size cap for an unspecified `limit` in the (external)
/// recommend API's request shape.
pub const DEFAULT_LIMIT: i64 = 20;

#[async_trait::async_trait]
pub trait PageRepository {
    /// `q = Some(..)` filters via full-text match on `pages.tokens`
    /// (`simple` dictionary); `q = None` returns the most recently fetched
    /// pages unfiltered. Both orders by `last_fetched` desc, capped at
    /// `limit`.
    async fn search(&self, q: Option<&str>, limit: i64) -> Result<Vec<Page>>;
}

#[async_trait::async_trait]
impl PageRepository for Repository {
    async fn search(&self, q: Option<&str>, limit: i64) -> Result<Vec<Page>> {
        self.search_pages(q, limit).await
    }
}
