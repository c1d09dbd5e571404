//! `http_cache`: ETag/Last-Modified bookkeeping for conditional GET, with
//! `last_changed_at` advancing only when the validators actually differ
//! from what was stored — grounded on
//! `original_source/lib/db.py::upsert_http_meta`.

use diesel::sql_types::{Integer, Nullable, Text};
use diesel::OptionalExtension;
use diesel_async::RunQueryDsl;

use super::{Repository, Result};

impl Repository {
    /// Record the validators returned by a fetch. `last_checked_at` always
    /// advances to `now()`; `last_changed_at` only advances when `etag` or
    /// `last_modified` differ from the row already on file (or there is no
    /// row yet), kept as a single `CASE WHEN` rather than a read-then-write
    /// round trip. `etag`/`last_modified` are stored as real `NULL` when
    /// absent; the `CASE WHEN` comparison uses a second, `""`-coalesced
    /// copy of each so a transition from `None` to `None` doesn't look like
    /// a change.
    pub async fn upsert_http_meta(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
        status: i32,
    ) -> Result<()> {
        let mut conn = self.pool().get().await?;

        diesel::sql_query(
            r#"
            INSERT INTO http_cache(url, etag, last_modified, last_status, last_checked_at, last_changed_at)
            VALUES ($1, $2, $3, $4, now(),
                case when $5 <> coalesce((select etag from http_cache where url = $1), '')
                       or $6 <> coalesce((select last_modified from http_cache where url = $1), '')
                     then now()
                     else coalesce((select last_changed_at from http_cache where url = $1), now())
                end)
            ON CONFLICT(url) DO UPDATE SET
                etag = excluded.etag,
                last_modified = excluded.last_modified,
                last_status = excluded.last_status,
                last_checked_at = now()
            "#,
        )
        .bind::<Text, _>(url)
        .bind::<Nullable<Text>, _>(etag)
        .bind::<Nullable<Text>, _>(last_modified)
        .bind::<Integer, _>(status)
        .bind::<Text, _>(etag.unwrap_or(""))
        .bind::<Text, _>(last_modified.unwrap_or(""))
        .execute(&mut conn)
        .await?;

        Ok(())
    }

    /// Fetch the stored validators for a URL, used to build conditional GET
    /// request headers (spec.md §4.3).
    pub async fn get_http_meta(&self, url: &str) -> Result<Option<HttpMeta>> {
        let mut conn = self.pool().get().await?;

        let row: Option<HttpMetaRow> = diesel::sql_query(
            "SELECT etag, last_modified FROM http_cache WHERE url = $1",
        )
        .bind::<Text, _>(url)
        .get_result(&mut conn)
        .await
        .optional()?;

        Ok(row.map(|r| HttpMeta {
            etag: r.etag,
            last_modified: r.last_modified,
        }))
    }
}

#[derive(diesel::QueryableByName)]
struct HttpMetaRow {
    #[diesel(sql_type = Nullable<Text>)]
    etag: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    last_modified: Option<String>,
}

/// Stored conditional-GET validators for one URL.
pub struct HttpMeta {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_meta_holds_optional_validators() {
        let meta = HttpMeta {
            etag: Some("\"abc\"".to_string()),
            last_modified: None,
        };
        assert_eq!(meta.etag.as_deref(), Some("\"abc\""));
        assert_eq!(meta.last_modified, None);
    }
}
