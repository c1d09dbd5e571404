//! Budget Gate (C7): a thin repository-backed wrapper, mirroring
//! `original_source/lib/budget.py` semantics exactly (spec.md §4.7).

use crate::models::ApiQuota;
use crate::repository::{Repository, Result};

/// Monthly quota gate for named external APIs (e.g. `"vertex"`, `"tavily"`).
#[derive(Clone)]
pub struct BudgetGate {
    repo: Repository,
}

impl BudgetGate {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn set_monthly_limit(&self, api: &str, limit: i32) -> Result<()> {
        self.repo.set_monthly_limit(api, limit).await
    }

    pub async fn usage(&self, api: &str) -> Result<ApiQuota> {
        let (used, quota_limit) = self.repo.get_usage(api).await?;
        Ok(ApiQuota { used, quota_limit })
    }

    /// `false` when the quota is unconfigured (`quota_limit == 0`, denied
    /// conservatively) or spending `n` more would exceed it.
    pub async fn can_spend(&self, api: &str, n: i32) -> Result<bool> {
        self.repo.can_spend(api, n).await
    }

    pub async fn add_usage(&self, api: &str, n: i32) -> Result<()> {
        self.repo.add_usage(api, n).await
    }
}
