//! Persistence layer: schema bootstrap plus the four tables named in
//! spec.md §3 (`pages`, `http_cache`, `fetch_log`, `api_quota`), on a single
//! PostgreSQL backend.

mod fetch_log;
mod http_cache;
mod pages;
mod pool;
mod quota;

pub use pool::DbPool;

use thiserror::Error;

/// Errors surfaced by the persistence layer. DB errors are fatal for the
/// affected operation; callers (the orchestrator) translate them into an
/// `ng` fetch-log row rather than aborting the run (spec.md §4.2).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Handle to the persistence layer. Cheap to clone — wraps a pooled
/// connection manager.
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    pub fn connect(database_url: &str) -> Result<Self> {
        Ok(Self {
            pool: DbPool::connect(database_url)?,
        })
    }

    /// Idempotent schema bootstrap, safe to call every run (spec.md §4.2).
    ///
    /// Also applies the historical `limit -> quota_limit` rename on
    /// `api_quota` (spec.md §9 "Schema drift"), guarded so it only runs
    /// once against a pre-rename table.
    pub async fn ensure_schema(&self) -> Result<()> {
        use diesel_async::RunQueryDsl;

        let mut conn = self.pool.get().await?;

        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS pages (
                url text PRIMARY KEY,
                title text NOT NULL DEFAULT '(無題)',
                summary text NOT NULL DEFAULT '',
                rate text,
                cap text,
                target text,
                cost_items text,
                deadline text,
                fiscal_year text,
                call_no text,
                scheme_type text,
                period_from text,
                period_to text,
                content_hash text NOT NULL DEFAULT '',
                last_fetched timestamptz NOT NULL DEFAULT now(),
                tokens tsvector GENERATED ALWAYS AS (
                    to_tsvector('simple',
                        coalesce(title, '') || ' ' || coalesce(summary, '') || ' ' ||
                        coalesce(target, '') || ' ' || coalesce(cost_items, ''))
                ) STORED
            );

            CREATE INDEX IF NOT EXISTS pages_tokens_idx ON pages USING gin (tokens);

            CREATE TABLE IF NOT EXISTS http_cache (
                url text PRIMARY KEY,
                etag text,
                last_modified text,
                last_status integer NOT NULL,
                last_checked_at timestamptz NOT NULL DEFAULT now(),
                last_changed_at timestamptz NOT NULL DEFAULT now()
            );

            CREATE TABLE IF NOT EXISTS fetch_log (
                id bigserial PRIMARY KEY,
                url text NOT NULL,
                status text NOT NULL,
                took_ms integer NOT NULL DEFAULT 0,
                error text,
                created_at timestamptz NOT NULL DEFAULT now()
            );

            CREATE INDEX IF NOT EXISTS fetch_log_error_idx ON fetch_log (error);

            CREATE TABLE IF NOT EXISTS api_quota (
                month text NOT NULL,
                api text NOT NULL,
                used integer NOT NULL DEFAULT 0,
                quota_limit integer NOT NULL DEFAULT 0,
                PRIMARY KEY (month, api)
            );
            "#,
        )
        .execute(&mut conn)
        .await?;

        // Historical rename: some production schemas still have a column
        // literally named `limit`, which is a reserved word once quoted.
        diesel::sql_query(
            r#"
            DO $$
            BEGIN
                IF EXISTS (
                    SELECT 1 FROM information_schema.columns
                    WHERE table_name = 'api_quota' AND column_name = 'limit'
                ) THEN
                    ALTER TABLE api_quota RENAME COLUMN "limit" TO quota_limit;
                END IF;
            END
            $$;
            "#,
        )
        .execute(&mut conn)
        .await?;

        Ok(())
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}
