//! Run summary (C10): aggregate `fetch_log` by status for the current run
//! and emit the single contractual stdout line (spec.md §4.10, §6 "Stdout
//! contract").

use std::fmt;

use crate::repository::{Repository, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ok: i64,
    pub not_modified: i64,
    pub skip: i64,
    pub ng: i64,
    pub list: i64,
    pub seed: i64,
    pub pages_non_sentinel: i64,
}

impl RunSummary {
    pub async fn collect(repo: &Repository, run_id: &str) -> Result<Self> {
        let counts = repo.run_status_counts(run_id).await?;
        let pages_non_sentinel = repo.count_pages_non_sentinel().await?;

        let mut summary = RunSummary {
            pages_non_sentinel,
            ..Default::default()
        };

        for (status, n) in counts {
            match status.as_str() {
                "ok" => summary.ok = n,
                "304" => summary.not_modified = n,
                "skip" => summary.skip = n,
                "ng" => summary.ng = n,
                "list" => summary.list = n,
                "seed" => summary.seed = n,
                _ => {}
            }
        }

        Ok(summary)
    }

    /// Render the literal `SUMMARY run=<id>: ...` line (spec.md §4.10).
    pub fn line(&self, run_id: &str) -> String {
        format!(
            "SUMMARY run={run_id}: ok={}, 304={}, skip={}, ng={}, list={}, seed={}, pages_non_sentinel={}",
            self.ok, self.not_modified, self.skip, self.ng, self.list, self.seed, self.pages_non_sentinel
        )
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ok={}, 304={}, skip={}, ng={}, list={}, seed={}, pages_non_sentinel={}",
            self.ok, self.not_modified, self.skip, self.ng, self.list, self.seed, self.pages_non_sentinel
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_matches_the_contractual_format() {
        let summary = RunSummary {
            ok: 3,
            not_modified: 1,
            skip: 2,
            ng: 0,
            list: 4,
            seed: 5,
            pages_non_sentinel: 10,
        };
        assert_eq!(
            summary.line("42"),
            "SUMMARY run=42: ok=3, 304=1, skip=2, ng=0, list=4, seed=5, pages_non_sentinel=10"
        );
    }
}
