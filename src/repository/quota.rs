//! `api_quota`: the Budget Gate's persistence, grounded on
//! `original_source/lib/budget.py`. Month keys are `YYYY-MM` in UTC.

use chrono::Utc;
use diesel::sql_types::{Integer, Text};
use diesel::OptionalExtension;
use diesel_async::RunQueryDsl;

use super::{Repository, Result};

fn current_month() -> String {
    Utc::now().format("%Y-%m").to_string()
}

impl Repository {
    /// Set the current month's quota ceiling for `api`, leaving `used`
    /// untouched (spec.md §4.7).
    pub async fn set_monthly_limit(&self, api: &str, limit: i32) -> Result<()> {
        let mut conn = self.pool().get().await?;

        diesel::sql_query(
            r#"
            INSERT INTO api_quota(month, api, used, quota_limit)
            VALUES ($1, $2, 0, $3)
            ON CONFLICT(month, api) DO UPDATE SET quota_limit = excluded.quota_limit
            "#,
        )
        .bind::<Text, _>(current_month())
        .bind::<Text, _>(api)
        .bind::<Integer, _>(limit)
        .execute(&mut conn)
        .await?;

        Ok(())
    }

    /// `(used, quota_limit)` for the current month; `(0, 0)` if the API has
    /// never been configured.
    pub async fn get_usage(&self, api: &str) -> Result<(i32, i32)> {
        let mut conn = self.pool().get().await?;

        #[derive(diesel::QueryableByName)]
        struct Row {
            #[diesel(sql_type = Integer)]
            used: i32,
            #[diesel(sql_type = Integer)]
            quota_limit: i32,
        }

        let row: Option<Row> = diesel::sql_query(
            "SELECT used, quota_limit FROM api_quota WHERE month = $1 AND api = $2",
        )
        .bind::<Text, _>(current_month())
        .bind::<Text, _>(api)
        .get_result(&mut conn)
        .await
        .optional()?;

        Ok(row.map(|r| (r.used, r.quota_limit)).unwrap_or((0, 0)))
    }

    /// `false` if the quota is unconfigured (`quota_limit == 0`, denied
    /// conservatively) or spending `n` more would exceed it.
    pub async fn can_spend(&self, api: &str, n: i32) -> Result<bool> {
        let (used, limit) = self.get_usage(api).await?;
        if limit == 0 {
            return Ok(false);
        }
        Ok(used + n <= limit)
    }

    /// Record `inc` units of consumption against the current month,
    /// creating the row (with `quota_limit = 0`, i.e. still denying new
    /// spend until a limit is set) if it doesn't exist yet.
    pub async fn add_usage(&self, api: &str, inc: i32) -> Result<()> {
        let mut conn = self.pool().get().await?;

        diesel::sql_query(
            r#"
            INSERT INTO api_quota(month, api, used, quota_limit)
            VALUES ($1, $2, $3, 0)
            ON CONFLICT(month, api) DO UPDATE SET used = api_quota.used + excluded.used
            "#,
        )
        .bind::<Text, _>(current_month())
        .bind::<Text, _>(api)
        .bind::<Integer, _>(inc)
        .execute(&mut conn)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::current_month;

    #[test]
    fn current_month_has_yyyy_mm_shape() {
        let m = current_month();
        assert_eq!(m.len(), 7);
        assert_eq!(m.as_bytes()[4], b'-');
    }
}
