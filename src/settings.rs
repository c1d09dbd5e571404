//! Environment configuration (spec.md §6 "Environment configuration"):
//! collects every `std::env::var` read into one struct.

use std::time::Duration;

/// Every environment-configurable knob named in spec.md §6.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub time_budget_sec: u64,
    pub hard_kill_sec: u64,
    pub max_pages_per_run: u32,
    pub max_per_domain: usize,
    pub parallel_workers: usize,
    pub per_host_limit: usize,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub force_refresh: bool,
    pub single_backfill_one: bool,
    pub single_stage1_read_timeout: Duration,
    pub single_large_bytes: u64,
    pub head_connect_timeout: Duration,
    pub head_read_timeout: Duration,
    pub fail_on_seed_zero: bool,
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => v == "1" || v.eq_ignore_ascii_case("true"),
        Err(_) => default,
    }
}

impl Settings {
    /// Load from the process environment, applying spec.md §6's defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL is required"))?;

        Ok(Self {
            database_url,
            time_budget_sec: env_u64("TIME_BUDGET_SEC", 360),
            hard_kill_sec: env_u64("HARD_KILL_SEC", 600),
            max_pages_per_run: env_u64("MAX_PAGES_PER_RUN", 90) as u32,
            max_per_domain: env_u64("MAX_PER_DOMAIN", 35) as usize,
            parallel_workers: env_u64("PARALLEL_WORKERS", 6) as usize,
            per_host_limit: env_u64("PER_HOST_LIMIT", 2) as usize,
            connect_timeout: Duration::from_secs(env_u64("CONNECT_TIMEOUT", 11)),
            read_timeout: Duration::from_secs(env_u64("READ_TIMEOUT", 40)),
            force_refresh: env_bool("FORCE_REFRESH", false),
            single_backfill_one: env_bool("SINGLE_BACKFILL_ONE", false),
            single_stage1_read_timeout: Duration::from_secs(env_u64(
                "SINGLE_STAGE1_READ_TIMEOUT",
                180,
            )),
            single_large_bytes: env_u64("SINGLE_LARGE_BYTES", 25_000_000),
            head_connect_timeout: Duration::from_secs(env_u64("HEAD_CONNECT_TIMEOUT", 8)),
            head_read_timeout: Duration::from_secs(env_u64("HEAD_READ_TIMEOUT", 15)),
            fail_on_seed_zero: env_bool("FAIL_ON_SEED_ZERO", false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_u64_falls_back_to_default_on_missing_or_bad_value() {
        std::env::remove_var("SUBSIDY_TEST_U64");
        assert_eq!(env_u64("SUBSIDY_TEST_U64", 7), 7);
        std::env::set_var("SUBSIDY_TEST_U64", "not a number");
        assert_eq!(env_u64("SUBSIDY_TEST_U64", 7), 7);
        std::env::remove_var("SUBSIDY_TEST_U64");
    }

    #[test]
    fn env_bool_accepts_1_and_true_case_insensitively() {
        std::env::set_var("SUBSIDY_TEST_BOOL", "1");
        assert!(env_bool("SUBSIDY_TEST_BOOL", false));
        std::env::set_var("SUBSIDY_TEST_BOOL", "TRUE");
        assert!(env_bool("SUBSIDY_TEST_BOOL", false));
        std::env::set_var("SUBSIDY_TEST_BOOL", "0");
        assert!(!env_bool("SUBSIDY_TEST_BOOL", true));
        std::env::remove_var("SUBSIDY_TEST_BOOL");
    }
}
