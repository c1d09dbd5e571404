//! Per-host scheduler (C5): a lazily-populated semaphore-per-host registry
//! plus a global worker pool, capping in-flight fetches per host and
//! overall.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use url::Url;

/// Registry of per-host semaphores, each capped at `per_host_limit`
/// in-flight fetches (spec.md §3 "Per-host politeness").
#[derive(Clone)]
pub struct HostScheduler {
    per_host_limit: usize,
    hosts: Arc<Mutex<HashMap<String, Arc<Semaphore>>>>,
    workers: Arc<Semaphore>,
}

/// Held while a dispatched task runs; releases both the host and the
/// global worker slot on drop.
pub struct Permit {
    _host: OwnedSemaphorePermit,
    _worker: OwnedSemaphorePermit,
}

impl HostScheduler {
    pub fn new(per_host_limit: usize, parallel_workers: usize) -> Self {
        Self {
            per_host_limit,
            hosts: Arc::new(Mutex::new(HashMap::new())),
            workers: Arc::new(Semaphore::new(parallel_workers.max(1))),
        }
    }

    /// Host key used for the semaphore registry: the URL's authority, or
    /// the whole URL string if it doesn't parse (so malformed URLs still
    /// get *some* limiter rather than bypassing the registry).
    fn host_key(url: &str) -> String {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| url.to_string())
    }

    async fn host_semaphore(&self, host: &str) -> Arc<Semaphore> {
        let mut hosts = self.hosts.lock().await;
        hosts
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host_limit)))
            .clone()
    }

    /// Acquire a dispatch slot for `url`: a global worker-pool permit and a
    /// per-host permit, in that order. Both are released on drop,
    /// regardless of whether the fetch that follows succeeds or fails
    /// (spec.md §4.3 "acquires the host semaphore before sending the
    /// request and releases it on completion").
    pub async fn acquire(&self, url: &str) -> Permit {
        let worker = self.workers.clone().acquire_owned().await.expect("workers semaphore closed");
        let host_sem = self.host_semaphore(&Self::host_key(url)).await;
        let host = host_sem.acquire_owned().await.expect("host semaphore closed");
        Permit {
            _host: host,
            _worker: worker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn host_key_extracts_authority() {
        assert_eq!(HostScheduler::host_key("https://allowed.example/a/b"), "allowed.example");
    }

    #[test]
    fn host_key_falls_back_to_raw_string_for_malformed_url() {
        assert_eq!(HostScheduler::host_key("not a url"), "not a url");
    }

    #[tokio::test]
    async fn per_host_limit_caps_concurrent_permits() {
        let scheduler = HostScheduler::new(2, 8);
        let url = "https://allowed.example/x";

        let p1 = scheduler.acquire(url).await;
        let p2 = scheduler.acquire(url).await;

        let scheduler2 = scheduler.clone();
        let url2 = url.to_string();
        let handle = tokio::spawn(async move { scheduler2.acquire(&url2).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        drop(p1);
        let p3 = tokio::time::timeout(Duration::from_millis(200), handle)
            .await
            .expect("third acquire should unblock once a permit is released")
            .expect("task join");

        drop(p2);
        drop(p3);
    }

    #[tokio::test]
    async fn distinct_hosts_do_not_share_a_semaphore() {
        let scheduler = HostScheduler::new(1, 8);
        let p1 = scheduler.acquire("https://a.example/x").await;
        let p2 = scheduler.acquire("https://b.example/x").await;
        drop(p1);
        drop(p2);
    }
}
