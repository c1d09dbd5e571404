//! Crawl Orchestrator (C8): run-scoped lane sequencer (spec.md §4.8).
//!
//! Sequences five lanes in order — RSS, crawl, backfill, discovery, summary
//! — each gated by a shared deadline, with no interactive surface beyond
//! the one run summary line.

mod deadline;

pub use deadline::{Deadline, GRACE};

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tokio::sync::Mutex;

use crate::backfill::run_ladder;
use crate::budget::BudgetGate;
use crate::discovery::{
    anchors, host_is_allowed, is_document_url, merge_candidates, regex_harvest, DiscoveryProvider,
    RssProvider, Seed, Source,
};
use crate::extract::{extract_from_html, pdf_row};
use crate::fetcher::{FetchOutcome, Fetcher, HostTimeouts, KNOWN_SLOW_HOSTS};
use crate::models::page::DEFAULT_TITLE;
use crate::models::{FetchStatus, Page};
use crate::repository::Repository;
use crate::run_id::RunLogger;
use crate::scheduler::HostScheduler;
use crate::settings::Settings;
use crate::summary::RunSummary;

/// Backfill-lane batch size when `SINGLE_BACKFILL_ONE` is unset — a plain
/// source-of-truth constant, not itself spec-named.
const BACKFILL_BATCH_SIZE: i64 = 20;

/// How many discovery-lane candidates get a full fetch+extract rather than
/// just a minimal title/url upsert (spec.md §4.8 step 5: "optionally
/// prefetch a small number").
const DISCOVERY_PREFETCH_COUNT: usize = 5;

/// Owns every collaborator a run needs and sequences the five lanes of
/// spec.md §4.8. Cheap to clone — every field is itself a handle
/// (`Repository`/`Fetcher`/`HostScheduler` wrap pools/clients behind `Arc`,
/// `Seed` is plain data cloned once per spawned task).
#[derive(Clone)]
pub struct CrawlOrchestrator {
    repo: Repository,
    logger: RunLogger,
    fetcher: Fetcher,
    scheduler: HostScheduler,
    budget: BudgetGate,
    discovery: Arc<dyn DiscoveryProvider>,
    rss: Arc<dyn RssProvider>,
    seed: Seed,
    max_pages_per_run: u32,
    max_per_domain: usize,
    hard_kill: Duration,
    single_backfill_one: bool,
    single_stage1_read_timeout: Duration,
    single_large_bytes: u64,
    head_connect_timeout: Duration,
    head_read_timeout: Duration,
    fail_on_seed_zero: bool,
    saved: Arc<Mutex<u32>>,
}

impl CrawlOrchestrator {
    pub fn new(
        settings: &Settings,
        repo: Repository,
        seed: Seed,
        discovery: Arc<dyn DiscoveryProvider>,
        rss: Arc<dyn RssProvider>,
        run_id: impl Into<String>,
    ) -> Self {
        let fetcher = Fetcher::with_timeouts(
            settings.connect_timeout,
            HostTimeouts::from_env(settings.read_timeout, KNOWN_SLOW_HOSTS),
            settings.force_refresh,
        );
        let scheduler = HostScheduler::new(settings.per_host_limit, settings.parallel_workers);
        let budget = BudgetGate::new(repo.clone());
        let logger = RunLogger::new(repo.clone(), run_id);

        Self {
            repo,
            logger,
            fetcher,
            scheduler,
            budget,
            discovery,
            rss,
            seed,
            max_pages_per_run: settings.max_pages_per_run,
            max_per_domain: settings.max_per_domain,
            hard_kill: Duration::from_secs(settings.hard_kill_sec),
            single_backfill_one: settings.single_backfill_one,
            single_stage1_read_timeout: settings.single_stage1_read_timeout,
            single_large_bytes: settings.single_large_bytes,
            head_connect_timeout: settings.head_connect_timeout,
            head_read_timeout: settings.head_read_timeout,
            fail_on_seed_zero: settings.fail_on_seed_zero,
            saved: Arc::new(Mutex::new(0)),
        }
    }

    /// Run all five lanes in order, each gated by the shared deadline
    /// (spec.md §4.8), and emit the run summary line.
    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        let deadline = Deadline::starting_now(self.hard_kill);

        self.repo.ensure_schema().await?;

        if self.fail_on_seed_zero && self.seed.sources.is_empty() {
            anyhow::bail!("seed file has zero sources and FAIL_ON_SEED_ZERO is set");
        }

        if !deadline.expired() {
            self.run_rss_lane(&deadline).await;
        } else {
            self.log_deadline_skip("rss-lane").await;
        }

        if !deadline.expired() {
            self.run_crawl_lane(&deadline).await;
        } else {
            self.log_deadline_skip("crawl-lane").await;
        }

        if !deadline.expired() {
            self.run_backfill_lane(&deadline).await;
        } else {
            self.log_deadline_skip("backfill-lane").await;
        }

        if !deadline.expired() {
            self.run_discovery_lane(&deadline).await;
        } else {
            self.log_deadline_skip("discovery-lane").await;
        }

        let summary = RunSummary::collect(&self.repo, self.logger.run_id()).await?;
        println!("{}", summary.line(self.logger.run_id()));
        Ok(summary)
    }

    async fn has_budget(&self) -> bool {
        *self.saved.lock().await < self.max_pages_per_run
    }

    async fn record_saved(&self) {
        *self.saved.lock().await += 1;
    }

    async fn log_deadline_skip(&self, lane: &str) {
        let _ = self
            .logger
            .log(lane, FetchStatus::Skip, 0, Some("reason=deadline"))
            .await;
    }

    // ---- RSS lane (spec.md §4.8 step 2) ----

    async fn run_rss_lane(&self, deadline: &Deadline) {
        for feed_url in &self.seed.feed_urls {
            if deadline.expired() {
                break;
            }
            for entry in self.rss.fetch_feed(feed_url).await {
                if deadline.expired() {
                    break;
                }
                let page = Page::minimal(&entry.url, &entry.title, &entry.summary);
                self.upsert_and_log(&entry.url, page, 0).await;
            }
        }
    }

    // ---- Crawl lane (spec.md §4.8 step 3, C5-C6) ----

    async fn run_crawl_lane(&self, deadline: &Deadline) {
        for source in self.seed.sources.clone() {
            if deadline.expired() || !self.has_budget().await {
                break;
            }
            self.crawl_source(&source, deadline).await;
        }
    }

    async fn crawl_source(&self, source: &Source, deadline: &Deadline) {
        let cached = self.repo.get_http_meta(&source.url).await.ok().flatten();
        let (etag, last_modified) = cached
            .map(|m| (m.etag, m.last_modified))
            .unwrap_or((None, None));

        let outcome = match self
            .fetcher
            .get(&source.url, etag.as_deref(), last_modified.as_deref())
            .await
        {
            Ok(o) => o,
            Err(e) => {
                let _ = self
                    .logger
                    .log(&source.url, FetchStatus::Ng, 0, Some(&format!("list fetch error: {e}")))
                    .await;
                return;
            }
        };

        let _ = self
            .repo
            .upsert_http_meta(
                &source.url,
                outcome.etag.as_deref(),
                outcome.last_modified.as_deref(),
                outcome.status as i32,
            )
            .await;

        if outcome.status == 304 {
            let _ = self
                .logger
                .log(&source.url, FetchStatus::NotModified, outcome.elapsed_ms as i32, None)
                .await;
            return;
        }

        let is_document_ctype = matches!(
            outcome.content_type.as_deref(),
            Some("text/html") | Some("application/xhtml+xml")
        );
        let Some(body) = outcome.body.filter(|_| is_document_ctype) else {
            let _ = self
                .logger
                .log(
                    &source.url,
                    FetchStatus::Skip,
                    outcome.elapsed_ms as i32,
                    Some(&format!("list skip ctype={:?}", outcome.content_type)),
                )
                .await;
            return;
        };

        let anchor_candidates = anchors(&source.url, &body, &self.seed.allowed_hosts);
        let regex_candidates = regex_harvest(&body, &self.seed.allowed_hosts);
        let mut discovery_candidates = Vec::new();
        if let (Some(_api), Some(query)) = (&source.discover, &source.query) {
            for candidate in self.discovery.discover(query).await {
                if is_document_url(&candidate.url) && host_is_allowed(&candidate.url, &self.seed.allowed_hosts) {
                    discovery_candidates.push(candidate.url);
                }
            }
        }

        let anchors_n = anchor_candidates.len();
        let regex_n = regex_candidates.len();

        let include: Vec<Regex> = source.include.iter().filter_map(|p| Regex::new(p).ok()).collect();
        let exclude: Vec<Regex> = source.exclude.iter().filter_map(|p| Regex::new(p).ok()).collect();
        let passes_filters = |url: &str| -> bool {
            if !include.is_empty() && !include.iter().any(|r| r.is_match(url)) {
                return false;
            }
            !exclude.iter().any(|r| r.is_match(url))
        };

        let lists = [
            anchor_candidates.into_iter().filter(|u| passes_filters(u)).collect(),
            regex_candidates.into_iter().filter(|u| passes_filters(u)).collect(),
            discovery_candidates.into_iter().filter(|u| passes_filters(u)).collect(),
        ];

        let max_new = source.max_new.unwrap_or(self.max_per_domain);
        let candidates = merge_candidates(lists, self.max_per_domain, max_new);

        let _ = self
            .logger
            .log(
                &source.url,
                FetchStatus::List,
                outcome.elapsed_ms as i32,
                Some(&format!(
                    "list anchors={anchors_n}, regex={regex_n}, candidates={}",
                    candidates.len()
                )),
            )
            .await;

        let mut handles = Vec::new();
        for url in candidates {
            if deadline.expired() || !self.has_budget().await {
                break;
            }
            let orchestrator = self.clone();
            let deadline = *deadline;
            handles.push(tokio::spawn(async move {
                orchestrator.process_candidate(&url, &deadline).await;
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Dispatch a single candidate through the scheduler: conditional
    /// fetch, then route by content-type, falling back to the recovery
    /// ladder on a fetch exception (spec.md §4.8 step 3e-f).
    async fn process_candidate(&self, url: &str, deadline: &Deadline) {
        if deadline.expired() {
            let _ = self.logger.log(url, FetchStatus::Skip, 0, Some("reason=deadline")).await;
            return;
        }

        let _permit = self.scheduler.acquire(url).await;

        let cached = self.repo.get_http_meta(url).await.ok().flatten();
        let (etag, last_modified) = cached
            .map(|m| (m.etag, m.last_modified))
            .unwrap_or((None, None));

        match self.fetcher.get(url, etag.as_deref(), last_modified.as_deref()).await {
            Ok(outcome) => {
                let _ = self
                    .repo
                    .upsert_http_meta(url, outcome.etag.as_deref(), outcome.last_modified.as_deref(), outcome.status as i32)
                    .await;
                self.route_outcome(url, outcome).await;
            }
            Err(_) => {
                let repaired = run_ladder(
                    &self.fetcher,
                    &self.discovery,
                    url,
                    false,
                    self.single_large_bytes,
                    self.single_stage1_read_timeout,
                    self.head_connect_timeout,
                    self.head_read_timeout,
                )
                .await;
                self.apply_repair(url, repaired).await;
            }
        }
    }

    async fn route_outcome(&self, url: &str, outcome: FetchOutcome) {
        if outcome.status == 304 {
            let _ = self
                .logger
                .log(url, FetchStatus::NotModified, outcome.elapsed_ms as i32, None)
                .await;
            return;
        }

        let ctype = outcome.content_type.as_deref().unwrap_or("");
        let page = match ctype {
            "text/html" | "application/xhtml+xml" => {
                outcome.body.as_deref().map(|body| extract_from_html(url, body))
            }
            "application/pdf" => Some(pdf_row(url)),
            _ => None,
        };

        match page {
            Some(page) => self.upsert_and_log(url, page, outcome.elapsed_ms as i32).await,
            None => {
                let _ = self
                    .logger
                    .log(url, FetchStatus::Skip, outcome.elapsed_ms as i32, Some(&format!("skip ctype={ctype}")))
                    .await;
            }
        }
    }

    async fn upsert_and_log(&self, url: &str, page: Page, took_ms: i32) {
        match self.repo.upsert_page(&page).await {
            Ok(true) => {
                self.record_saved().await;
                let _ = self.logger.log(url, FetchStatus::Ok, took_ms, None).await;
            }
            Ok(false) => {
                let _ = self.logger.log(url, FetchStatus::Skip, took_ms, Some("unchanged")).await;
            }
            Err(e) => {
                let _ = self
                    .logger
                    .log(url, FetchStatus::Ng, took_ms, Some(&format!("upsert error: {e}")))
                    .await;
            }
        }
    }

    async fn apply_repair(&self, url: &str, repair: crate::backfill::RepairResult) {
        match repair.page {
            Some(page) => self.upsert_and_log(url, page, 0).await,
            None => {
                let _ = self.logger.log(url, FetchStatus::Ng, 0, Some(&repair.detail)).await;
            }
        }
    }

    // ---- Backfill lane (spec.md §4.8 step 4, C9) ----

    async fn run_backfill_lane(&self, deadline: &Deadline) {
        let batch_size = if self.single_backfill_one { 1 } else { BACKFILL_BATCH_SIZE };
        let Ok(deficient) = self.repo.deficient_pages(batch_size).await else {
            return;
        };

        for url in deficient {
            if deadline.expired() || !self.has_budget().await {
                break;
            }
            let repaired = run_ladder(
                &self.fetcher,
                &self.discovery,
                &url,
                true,
                self.single_large_bytes,
                self.single_stage1_read_timeout,
                self.head_connect_timeout,
                self.head_read_timeout,
            )
            .await;
            self.apply_repair(&url, repaired).await;
        }
    }

    // ---- Discovery lane (spec.md §4.8 step 5, C6+C7) ----

    async fn run_discovery_lane(&self, deadline: &Deadline) {
        for source in self.seed.sources.clone() {
            if deadline.expired() {
                break;
            }
            let (Some(api), Some(query)) = (&source.discover, &source.query) else {
                continue;
            };
            match self.budget.can_spend(api, 1).await {
                Ok(true) => {}
                _ => continue,
            }

            let candidates = self.discovery.discover(query).await;
            let _ = self.budget.add_usage(api, 1).await;

            let filtered: Vec<String> = candidates
                .iter()
                .map(|c| c.url.clone())
                .filter(|u| is_document_url(u) && host_is_allowed(u, &self.seed.allowed_hosts))
                .collect();
            let max_new = source.max_new.unwrap_or(self.max_per_domain);
            let urls = merge_candidates([filtered, Vec::new(), Vec::new()], self.max_per_domain, max_new);

            for (i, url) in urls.into_iter().enumerate() {
                if deadline.expired() || !self.has_budget().await {
                    break;
                }
                if i < DISCOVERY_PREFETCH_COUNT {
                    self.process_candidate(&url, deadline).await;
                    continue;
                }
                let title = candidates
                    .iter()
                    .find(|c| c.url == url)
                    .and_then(|c| c.title.clone())
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string());
                let page = Page::minimal(&url, title, "");
                match self.repo.upsert_page(&page).await {
                    Ok(true) => {
                        self.record_saved().await;
                        let _ = self.logger.log(&url, FetchStatus::Seed, 0, None).await;
                    }
                    Ok(false) => {
                        let _ = self.logger.log(&url, FetchStatus::Skip, 0, Some("unchanged")).await;
                    }
                    Err(e) => {
                        let _ = self
                            .logger
                            .log(&url, FetchStatus::Ng, 0, Some(&format!("upsert error: {e}")))
                            .await;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backfill_batch_size_is_reasonable() {
        assert!(BACKFILL_BATCH_SIZE > 0);
        assert!(DISCOVERY_PREFETCH_COUNT <= BACKFILL_BATCH_SIZE as usize);
    }
}
