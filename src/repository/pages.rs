//! `pages` table: content-hash-driven upsert and the read-path search used
//! by the query adapter contract (spec.md §4.2, §4.11).

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use super::{Repository, Result};
use crate::models::page::DEFAULT_TITLE;
use crate::models::Page;
use crate::schema::pages;

/// Sentinel URL reserved for ops tooling — excluded from counts and search
/// (spec.md GLOSSARY "Sentinel URL").
pub const SENTINEL_URL: &str = "sentinel://foia-ops";

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = pages)]
struct NewPage<'a> {
    url: &'a str,
    title: &'a str,
    summary: &'a str,
    rate: Option<&'a str>,
    cap: Option<&'a str>,
    target: Option<&'a str>,
    cost_items: Option<&'a str>,
    deadline: Option<&'a str>,
    fiscal_year: Option<&'a str>,
    call_no: Option<&'a str>,
    scheme_type: Option<&'a str>,
    period_from: Option<&'a str>,
    period_to: Option<&'a str>,
    content_hash: &'a str,
    last_fetched: DateTime<Utc>,
}

#[derive(Queryable, QueryableByName)]
#[diesel(table_name = pages)]
struct PageRow {
    url: String,
    title: String,
    summary: String,
    rate: Option<String>,
    cap: Option<String>,
    target: Option<String>,
    cost_items: Option<String>,
    deadline: Option<String>,
    fiscal_year: Option<String>,
    call_no: Option<String>,
    scheme_type: Option<String>,
    period_from: Option<String>,
    period_to: Option<String>,
    content_hash: String,
    last_fetched: DateTime<Utc>,
}

impl From<PageRow> for Page {
    fn from(r: PageRow) -> Self {
        Page {
            url: r.url,
            title: r.title,
            summary: r.summary,
            rate: r.rate,
            cap: r.cap,
            target: r.target,
            cost_items: r.cost_items,
            deadline: r.deadline,
            fiscal_year: r.fiscal_year,
            call_no: r.call_no,
            scheme_type: r.scheme_type,
            period_from: r.period_from,
            period_to: r.period_to,
        }
    }
}

impl Repository {
    /// Upsert a page, returning `true` if the content actually changed
    /// (and `last_fetched` was advanced), `false` if the row was already
    /// up to date (content-hash match, a no-op — spec.md §3 "Content-hash
    /// stability").
    pub async fn upsert_page(&self, record: &Page) -> Result<bool> {
        let mut conn = self.pool().get().await?;

        let new_hash = record.content_hash();

        let existing_hash: Option<String> = pages::table
            .select(pages::content_hash)
            .filter(pages::url.eq(&record.url))
            .first(&mut conn)
            .await
            .optional()?;

        if existing_hash.as_deref() == Some(new_hash.as_str()) {
            return Ok(false);
        }

        let new_row = NewPage {
            url: &record.url,
            title: &record.title,
            summary: &record.summary,
            rate: record.rate.as_deref(),
            cap: record.cap.as_deref(),
            target: record.target.as_deref(),
            cost_items: record.cost_items.as_deref(),
            deadline: record.deadline.as_deref(),
            fiscal_year: record.fiscal_year.as_deref(),
            call_no: record.call_no.as_deref(),
            scheme_type: record.scheme_type.as_deref(),
            period_from: record.period_from.as_deref(),
            period_to: record.period_to.as_deref(),
            content_hash: &new_hash,
            last_fetched: Utc::now(),
        };

        diesel::insert_into(pages::table)
            .values(&new_row)
            .on_conflict(pages::url)
            .do_update()
            .set((
                pages::title.eq(excluded(pages::title)),
                pages::summary.eq(excluded(pages::summary)),
                pages::rate.eq(excluded(pages::rate)),
                pages::cap.eq(excluded(pages::cap)),
                pages::target.eq(excluded(pages::target)),
                pages::cost_items.eq(excluded(pages::cost_items)),
                pages::deadline.eq(excluded(pages::deadline)),
                pages::fiscal_year.eq(excluded(pages::fiscal_year)),
                pages::call_no.eq(excluded(pages::call_no)),
                pages::scheme_type.eq(excluded(pages::scheme_type)),
                pages::period_from.eq(excluded(pages::period_from)),
                pages::period_to.eq(excluded(pages::period_to)),
                pages::content_hash.eq(excluded(pages::content_hash)),
                pages::last_fetched.eq(excluded(pages::last_fetched)),
            ))
            .execute(&mut conn)
            .await?;

        Ok(true)
    }

    /// Count non-sentinel rows in `pages` (used by the run summary).
    pub async fn count_pages_non_sentinel(&self) -> Result<i64> {
        use diesel::dsl::count_star;
        let mut conn = self.pool().get().await?;
        let count = pages::table
            .filter(pages::url.ne(SENTINEL_URL))
            .select(count_star())
            .first(&mut conn)
            .await?;
        Ok(count)
    }

    /// URLs with an empty title or summary, oldest `last_fetched` first —
    /// the backfill lane's candidate source (spec.md §4.8 step 4).
    pub async fn deficient_pages(&self, limit: i64) -> Result<Vec<String>> {
        let mut conn = self.pool().get().await?;
        let rows = pages::table
            .filter(pages::title.eq(DEFAULT_TITLE).or(pages::summary.eq("")))
            .order(pages::last_fetched.asc())
            .limit(limit)
            .select(pages::url)
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    /// Read-path search backing the (external) recommend API, per spec.md
    /// §4.11: full-text filter when `q` is present, otherwise unfiltered,
    /// both ordered by `last_fetched desc` and capped at `limit`.
    pub async fn search_pages(&self, q: Option<&str>, limit: i64) -> Result<Vec<Page>> {
        let mut conn = self.pool().get().await?;

        let rows: Vec<PageRow> = if let Some(q) = q {
            diesel::sql_query(
                "SELECT url, title, summary, rate, cap, target, cost_items, deadline, \
                 fiscal_year, call_no, scheme_type, period_from, period_to, content_hash, last_fetched \
                 FROM pages WHERE tokens @@ plainto_tsquery('simple', $1) \
                 ORDER BY last_fetched DESC LIMIT $2",
            )
            .bind::<diesel::sql_types::Text, _>(q)
            .bind::<diesel::sql_types::BigInt, _>(limit)
            .load(&mut conn)
            .await?
        } else {
            pages::table
                .order(pages::last_fetched.desc())
                .limit(limit)
                .load(&mut conn)
                .await?
        };

        Ok(rows.into_iter().map(Page::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_url_is_a_constant_string() {
        assert_eq!(SENTINEL_URL, "sentinel://foia-ops");
    }
}
