//! Run identity + run-scoped logging wrapper (spec.md §3 "Run identity",
//! §9 "Run-scoped logging").

use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::FetchStatus;
use crate::repository::{Repository, Result};

/// Resolve the run id from `RUN_ID`, falling back to current epoch
/// seconds when unset (spec.md §6).
pub fn resolve_run_id() -> String {
    std::env::var("RUN_ID").unwrap_or_else(|_| {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        secs.to_string()
    })
}

/// Wraps [`Repository::log_fetch`], prepending `run=<id>; ` to the `error`
/// text once so call sites never have to thread the run id through every
/// log call. The unwrapped `Repository::log_fetch` stays public for direct
/// testing (spec.md §9).
#[derive(Clone)]
pub struct RunLogger {
    repo: Repository,
    run_id: String,
}

impl RunLogger {
    pub fn new(repo: Repository, run_id: impl Into<String>) -> Self {
        Self {
            repo,
            run_id: run_id.into(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Append a fetch_log row with `error` prefixed `run=<id>; `, even when
    /// the caller passed no error text (spec.md §3: "Every row emitted
    /// during a given run is prefixed").
    pub async fn log(&self, url: &str, status: FetchStatus, took_ms: i32, detail: Option<&str>) -> Result<()> {
        let error = format!("run={}; {}", self.run_id, detail.unwrap_or(""));
        self.repo.log_fetch(url, status, took_ms, Some(&error)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_run_id_prefers_env_var() {
        std::env::set_var("RUN_ID", "12345");
        assert_eq!(resolve_run_id(), "12345");
        std::env::remove_var("RUN_ID");
    }

    #[test]
    fn resolve_run_id_falls_back_to_epoch_seconds() {
        std::env::remove_var("RUN_ID");
        let id = resolve_run_id();
        assert!(id.parse::<u64>().is_ok());
    }
}
