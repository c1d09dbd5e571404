//! `fetch_log`: an append-only ledger of every fetch attempt, grounded on
//! `original_source/lib/db.py::log_fetch`. Every row's `error` column is
//! expected to already carry the `run=<id>; ` prefix (spec.md §3) — that
//! prefixing happens once, in the run-scoped logger wrapper
//! ([`crate::run_id::RunLogger`]), not here.

use diesel::sql_types::{BigInt, Text};
use diesel_async::RunQueryDsl;

use super::{Repository, Result};
use crate::models::FetchStatus;
use crate::schema::fetch_log;

impl Repository {
    /// Append one row. `error` carries the run prefix plus, for `list`
    /// rows, the structured counters described in spec.md §3
    /// (`anchors=N, regex=M, candidates=K`).
    pub async fn log_fetch(
        &self,
        url: &str,
        status: FetchStatus,
        took_ms: i32,
        error: Option<&str>,
    ) -> Result<()> {
        let mut conn = self.pool().get().await?;

        diesel::insert_into(fetch_log::table)
            .values((
                fetch_log::url.eq(url),
                fetch_log::status.eq(status.as_str()),
                fetch_log::took_ms.eq(took_ms),
                fetch_log::error.eq(error),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Per-status counts for one run, matched by the `run=<id>; ` prefix on
    /// `error` (spec.md §10 run summary format). Statuses with zero rows
    /// are omitted, not zero-filled — the caller fills in the gaps.
    pub async fn run_status_counts(&self, run_id: &str) -> Result<Vec<(String, i64)>> {
        let mut conn = self.pool().get().await?;

        let pattern = format!("run={run_id};%");

        #[derive(diesel::QueryableByName)]
        struct Row {
            #[diesel(sql_type = Text)]
            status: String,
            #[diesel(sql_type = BigInt)]
            n: i64,
        }

        let rows: Vec<Row> = diesel::sql_query(
            "SELECT status, count(*) AS n FROM fetch_log WHERE error LIKE $1 GROUP BY status",
        )
        .bind::<Text, _>(pattern)
        .load(&mut conn)
        .await?;

        Ok(rows.into_iter().map(|r| (r.status, r.n)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_status_as_str_matches_ledger_enum() {
        assert_eq!(FetchStatus::Ok.as_str(), "ok");
        assert_eq!(FetchStatus::NotModified.as_str(), "304");
    }
}
