//! Backfill/repair recovery ladder (C9, spec.md §4.9). No direct
//! `original_source/` counterpart — built from spec.md's literal five-stage
//! ladder, in the orchestrator's idiom (plain async functions over the
//! shared `fetcher`/`extract`/`discovery` building blocks).

use std::sync::Arc;
use std::time::Duration;

use crate::discovery::DiscoveryProvider;
use crate::extract::{extract_from_html, pdf_row};
use crate::fetcher::Fetcher;
use crate::models::Page;
use crate::norm::{clip, norm_ws, SUMMARY_CLIP_LIMIT};

/// Which ladder stage produced the final record, purely for log detail
/// (spec.md §4.9 "single stage1 ReadTimeout -> dr-fetch" style message).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderOutcome {
    HeadPdf,
    Stage1Html,
    MetaRefreshPdf,
    DeepResearch,
    Ng,
}

pub struct RepairResult {
    pub page: Option<Page>,
    pub outcome: LadderOutcome,
    pub detail: String,
}

/// Run the recovery ladder for one URL (spec.md §4.9). `allow_head_preflight`
/// gates step 1, which is backfill-only per Open Question 3 (also recorded
/// in DESIGN.md): the crawl lane's failure path skips straight to stage 1.
/// `head_timeouts` is only consulted when `allow_head_preflight` is set.
#[allow(clippy::too_many_arguments)]
pub async fn run_ladder(
    fetcher: &Fetcher,
    provider: &Arc<dyn DiscoveryProvider>,
    url: &str,
    allow_head_preflight: bool,
    large_bytes_threshold: u64,
    stage1_read_timeout: Duration,
    head_connect_timeout: Duration,
    head_read_timeout: Duration,
) -> RepairResult {
    if allow_head_preflight {
        match head_preflight(url, head_connect_timeout, head_read_timeout, large_bytes_threshold).await {
            HeadDecision::Pdf(result) => return result,
            HeadDecision::TooLarge => {
                return deep_research(provider, url, "head-preflight content-length over threshold").await;
            }
            HeadDecision::Continue => {}
        }
    }

    match stage1_fetch(fetcher, url, stage1_read_timeout).await {
        Ok(html) => {
            if let Some(pdf_url) = meta_refresh_pdf_target(&html) {
                return RepairResult {
                    page: Some(pdf_row(&pdf_url)),
                    outcome: LadderOutcome::MetaRefreshPdf,
                    detail: format!("meta-refresh -> {pdf_url}"),
                };
            }
            RepairResult {
                page: Some(extract_from_html(url, &html)),
                outcome: LadderOutcome::Stage1Html,
                detail: "stage1 ok".to_string(),
            }
        }
        Err(stage1_error) => deep_research(provider, url, &stage1_error).await,
    }
}

enum HeadDecision {
    Continue,
    Pdf(RepairResult),
    TooLarge,
}

/// HEAD preflight (step 1, backfill only): PDF content-type routes directly
/// to the PDF-name row; a body over `large_bytes_threshold` skips straight
/// to the deep-research fallback (spec.md §4.9 step 1).
///
/// Uses its own short-lived client rather than the shared `Fetcher`'s:
/// `HEAD_CONNECT_TIMEOUT`/`HEAD_READ_TIMEOUT` are deliberately distinct
/// knobs from the fetcher's own timeouts (spec.md §6), and reqwest bakes
/// connect timeout into the client at construction, so there's no way to
/// borrow the shared client for a differently-timed connect phase.
async fn head_preflight(
    url: &str,
    connect_timeout: Duration,
    read_timeout: Duration,
    large_bytes_threshold: u64,
) -> HeadDecision {
    let Ok(client) = reqwest::Client::builder()
        .user_agent(crate::fetcher::USER_AGENT)
        .connect_timeout(connect_timeout)
        .build()
    else {
        return HeadDecision::Continue;
    };

    let Ok(response) = client.head(url).timeout(read_timeout).send().await else {
        return HeadDecision::Continue;
    };

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(';').next().unwrap_or(s).trim().to_lowercase());

    if content_type.as_deref() == Some("application/pdf") {
        return HeadDecision::Pdf(RepairResult {
            page: Some(pdf_row(url)),
            outcome: LadderOutcome::HeadPdf,
            detail: "head-preflight -> pdf".to_string(),
        });
    }

    let content_length = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());

    if content_length.is_some_and(|len| len >= large_bytes_threshold) {
        return HeadDecision::TooLarge;
    }

    HeadDecision::Continue
}

/// Stage-1 conditional GET with a longer read timeout and no prior
/// validators, forcing a full body regardless of what's cached (spec.md
/// §4.9 step 2).
async fn stage1_fetch(fetcher: &Fetcher, url: &str, read_timeout: Duration) -> Result<String, String> {
    match fetcher.get_with_timeout(url, None, None, read_timeout).await {
        Ok(outcome) => outcome.body.ok_or_else(|| "stage1 empty body (304)".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Very small meta-refresh detector: looks for
/// `<meta http-equiv="refresh" content="0;url=...pdf">`.
fn meta_refresh_pdf_target(html: &str) -> Option<String> {
    let lower = html.to_lowercase();
    let idx = lower.find("http-equiv=\"refresh\"")?;
    let tail = &html[idx..];
    let url_idx = tail.to_lowercase().find("url=")?;
    let after = &tail[url_idx + 4..];
    let end = after
        .find(['"', '\''])
        .unwrap_or(after.len());
    let candidate = after[..end].trim();
    if candidate.to_lowercase().ends_with(".pdf") {
        Some(candidate.to_string())
    } else {
        None
    }
}

async fn deep_research(
    provider: &Arc<dyn DiscoveryProvider>,
    url: &str,
    stage1_error: &str,
) -> RepairResult {
    const DEEP_RESEARCH_MAX_CHARS: usize = 4000;

    match provider.fetch_text(url, DEEP_RESEARCH_MAX_CHARS).await {
        Some(text) => {
            // Split on the first line break *before* `norm_ws`, which folds
            // newlines into spaces — title is the heading line, summary is
            // everything after it (falling back to the whole text when
            // there's no second line).
            let (title_raw, summary_raw) = match text.find('\n') {
                Some(idx) => (&text[..idx], &text[idx + 1..]),
                None => (text.as_str(), text.as_str()),
            };
            let title = norm_ws(Some(title_raw)).chars().take(80).collect::<String>();
            let summary = clip(Some(&norm_ws(Some(summary_raw))), SUMMARY_CLIP_LIMIT).unwrap_or_default();
            RepairResult {
                page: Some(Page {
                    url: url.to_string(),
                    title,
                    summary,
                    ..Page::default()
                }),
                outcome: LadderOutcome::DeepResearch,
                detail: format!("single stage1 {stage1_error} -> dr-fetch"),
            }
        }
        None => RepairResult {
            page: None,
            outcome: LadderOutcome::Ng,
            detail: format!("single stage1 {stage1_error} -> dr-fetch failed"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{Candidate, DiscoveryProvider};

    struct FakeProvider {
        text: Option<&'static str>,
    }

    #[async_trait::async_trait]
    impl DiscoveryProvider for FakeProvider {
        async fn discover(&self, _query: &str) -> Vec<Candidate> {
            Vec::new()
        }

        async fn fetch_text(&self, _url: &str, _max_chars: usize) -> Option<String> {
            self.text.map(str::to_string)
        }
    }

    #[tokio::test]
    async fn deep_research_clips_title_to_first_line_and_keeps_detail_trail() {
        let provider: Arc<dyn DiscoveryProvider> = Arc::new(FakeProvider {
            text: Some("概要\n本文本文本文"),
        });

        let result = deep_research(&provider, "https://allowed.example/a", "ReadTimeout").await;

        let page = result.page.expect("deep research produced a page");
        assert_eq!(page.title, "概要");
        assert!(page.summary.starts_with("本文本文本文"));
        assert_eq!(result.outcome, LadderOutcome::DeepResearch);
        assert_eq!(result.detail, "single stage1 ReadTimeout -> dr-fetch");
    }

    #[tokio::test]
    async fn deep_research_yields_ng_when_provider_has_no_text() {
        let provider: Arc<dyn DiscoveryProvider> = Arc::new(FakeProvider { text: None });

        let result = deep_research(&provider, "https://allowed.example/a", "ReadTimeout").await;

        assert!(result.page.is_none());
        assert_eq!(result.outcome, LadderOutcome::Ng);
        assert_eq!(result.detail, "single stage1 ReadTimeout -> dr-fetch failed");
    }

    #[test]
    fn meta_refresh_detects_pdf_redirect_target() {
        let html = r#"<meta http-equiv="Refresh" content="0; url=/files/doc.pdf">"#;
        assert_eq!(meta_refresh_pdf_target(html), Some("/files/doc.pdf".to_string()));
    }

    #[test]
    fn meta_refresh_ignores_non_pdf_targets() {
        let html = r#"<meta http-equiv="refresh" content="0; url=/files/doc.html">"#;
        assert_eq!(meta_refresh_pdf_target(html), None);
    }

    #[test]
    fn meta_refresh_returns_none_without_a_refresh_tag() {
        assert_eq!(meta_refresh_pdf_target("<html></html>"), None);
    }
}
