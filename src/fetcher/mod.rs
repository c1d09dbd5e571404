//! Conditional HTTP client (C3): ETag/Last-Modified aware `GET`, host-tuned
//! read timeouts, and a hand-rolled connect-retry loop.

mod timeouts;

pub use timeouts::{HostTimeouts, KNOWN_SLOW_HOSTS};

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Desktop UA string, favouring HTML/XHTML/PDF, following spec.md §6
/// "HTTP request surface".
pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36 subsidy-crawler/0.1";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/pdf;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "ja,en-US;q=0.9,en;q=0.8";

const CONNECT_RETRIES: u32 = 3;
const BACKOFF_FACTOR: f64 = 1.2;
const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("request error for {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Outcome of a conditional `GET`. `body` is `None` on a `304`.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub body: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub content_type: Option<String>,
    pub status: u16,
    pub elapsed_ms: u64,
}

/// Conditional fetcher. Cheap to clone — wraps a `reqwest::Client`.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    timeouts: HostTimeouts,
    force_refresh: bool,
}

impl Fetcher {
    pub fn new(connect_timeout: Duration, default_read_timeout: Duration) -> Self {
        Self::with_timeouts(
            connect_timeout,
            HostTimeouts::new(default_read_timeout),
            false,
        )
    }

    pub fn with_timeouts(
        connect_timeout: Duration,
        timeouts: HostTimeouts,
        force_refresh: bool,
    ) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(connect_timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("failed to build reqwest client");

        Self {
            client,
            timeouts,
            force_refresh,
        }
    }

    pub fn force_refresh(&self) -> bool {
        self.force_refresh
    }

    /// Conditional `GET` with a host-tuned read timeout and connect-retry
    /// loop. `etag`/`last_modified` are ignored entirely when
    /// `force_refresh` is set (spec.md §4.3 "Force-refresh switch").
    pub async fn get(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchOutcome, FetchError> {
        let read_timeout = self.timeouts.for_url(url);
        self.get_with_timeout(url, etag, last_modified, read_timeout).await
    }

    /// As [`Self::get`], but with an explicit read timeout overriding the
    /// host-tuned lookup table — used by the backfill ladder's stage-1
    /// fetch, which always forces a full body regardless of cached
    /// validators and widens the timeout (spec.md §4.9 step 2).
    pub async fn get_with_timeout(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
        read_timeout: Duration,
    ) -> Result<FetchOutcome, FetchError> {
        let (etag, last_modified) = if self.force_refresh {
            (None, None)
        } else {
            (etag, last_modified)
        };

        let mut attempt = 0u32;
        let mut backoff = Duration::from_millis(250);

        loop {
            let result = self
                .try_get(url, etag, last_modified, read_timeout)
                .await;

            match result {
                Ok(outcome) => return Ok(outcome),
                Err(FetchError::Status { status, url }) if RETRY_STATUSES.contains(&status) => {
                    if attempt >= CONNECT_RETRIES {
                        return Err(FetchError::Status { status, url });
                    }
                    attempt += 1;
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.mul_f64(BACKOFF_FACTOR);
                }
                Err(FetchError::Request { .. }) if attempt < CONNECT_RETRIES => {
                    attempt += 1;
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.mul_f64(BACKOFF_FACTOR);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_get(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
        read_timeout: Duration,
    ) -> Result<FetchOutcome, FetchError> {
        let mut request = self.client.get(url).timeout(read_timeout);
        if let Some(etag) = etag {
            request = request.header("If-None-Match", etag);
        }
        if let Some(lm) = last_modified {
            request = request.header("If-Modified-Since", lm);
        }
        request = request
            .header("Accept", ACCEPT)
            .header("Accept-Language", ACCEPT_LANGUAGE)
            .header("Connection", "keep-alive");

        let start = Instant::now();
        let response = request.send().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome {
                body: None,
                etag: etag.map(str::to_string),
                last_modified: last_modified.map(str::to_string),
                content_type: header_str(&response, "content-type").map(|s| first_token(&s)),
                status: 304,
                elapsed_ms,
            });
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let new_etag = header_str(&response, "etag").or_else(|| etag.map(str::to_string));
        let new_last_modified =
            header_str(&response, "last-modified").or_else(|| last_modified.map(str::to_string));
        let content_type = header_str(&response, "content-type").map(|s| first_token(&s));

        let body = response.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

        Ok(FetchOutcome {
            body: Some(body),
            etag: new_etag,
            last_modified: new_last_modified,
            content_type,
            status: status.as_u16(),
            elapsed_ms,
        })
    }
}

fn header_str(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// First token before `;`, lowercased — e.g. `text/html; charset=utf-8` → `text/html`.
fn first_token(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_token_strips_charset_and_lowercases() {
        assert_eq!(first_token("Text/HTML; charset=utf-8"), "text/html");
        assert_eq!(first_token("application/pdf"), "application/pdf");
    }

    #[test]
    fn first_token_handles_no_parameters() {
        assert_eq!(first_token("application/json"), "application/json");
    }
}
