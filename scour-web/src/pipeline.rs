//! Bounded concurrent fetch-and-scan.
//!
//! [`BoundedFetcher`] admits URLs in input order through a semaphore of size
//! K (a sliding window: each finished fetch frees a slot for the next URL)
//! and collects results positionally. [`Scanner`] runs one scan over it:
//! fetch everything, extract visible text, pick the first matching keyword
//! per URL, and release the fetcher.
use crate::extract::visible_text;
use crate::fetch::Fetcher;
use crate::matcher::KeywordSet;
use futures::FutureExt;
use scour_common::{Result, ScourError};
use serde::{Serialize, Serializer};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

const CANCELLED_REASON: &str = "cancelled before dispatch";

/// Content on success, a human-readable reason on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success(String),
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub url: String,
    pub outcome: FetchOutcome,
}

impl FetchResult {
    fn failure(url: &str, reason: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            outcome: FetchOutcome::Failure(reason.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub url: String,
    pub keyword: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Matched { keyword: String },
    NoMatch,
    Failed { reason: String },
}

/// What happened to one input URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlOutcome {
    pub url: String,
    #[serde(flatten)]
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// One entry per input URL, in input order.
    pub outcomes: Vec<UrlOutcome>,
    /// Matched URLs only, in input order.
    pub matches: Vec<MatchRecord>,
    #[serde(rename = "elapsed_secs", serialize_with = "secs_f64")]
    pub elapsed: Duration,
}

fn secs_f64<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl ScanReport {
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.verdict, Verdict::Failed { .. }))
            .count()
    }
}

/// Runs fetches with at most `limit` in flight.
#[derive(Clone)]
pub struct BoundedFetcher {
    fetcher: Arc<dyn Fetcher>,
    limit: usize,
}

impl BoundedFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher>, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(ScourError::Config("concurrency must be at least 1".into()));
        }
        Ok(Self { fetcher, limit })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Fetch every URL. Always returns exactly one result per URL, in input
    /// order; failures (including a panicking strategy) are captured per URL.
    ///
    /// When `cancel` fires, URLs not yet admitted are recorded as failures and
    /// fetches already in flight run to completion.
    pub async fn fetch_all(
        &self,
        urls: &[String],
        cancel: Option<&CancellationToken>,
    ) -> Vec<FetchResult> {
        let semaphore = Arc::new(Semaphore::new(self.limit));
        let mut slots: Vec<Option<FetchResult>> = vec![None; urls.len()];
        let mut tasks = JoinSet::new();

        for (idx, url) in urls.iter().enumerate() {
            let permit = match admit(&semaphore, cancel).await {
                Some(permit) => permit,
                None => {
                    tracing::debug!(%url, "scan.fetch.cancelled");
                    slots[idx] = Some(FetchResult::failure(url, CANCELLED_REASON));
                    continue;
                }
            };

            let fetcher = Arc::clone(&self.fetcher);
            let url = url.clone();
            let span = tracing::debug_span!("fetch", idx, url = %url);
            tasks.spawn(
                async move {
                    let _permit = permit;
                    let started = Instant::now();
                    let outcome = match AssertUnwindSafe(fetcher.fetch(&url)).catch_unwind().await
                    {
                        Ok(Ok(body)) => FetchOutcome::Success(body),
                        Ok(Err(e)) => FetchOutcome::Failure(e.to_string()),
                        Err(_) => FetchOutcome::Failure("fetch task panicked".to_string()),
                    };
                    match &outcome {
                        FetchOutcome::Success(body) => tracing::debug!(
                            duration_ms = started.elapsed().as_millis() as u64,
                            body_len = body.len(),
                            "scan.fetch.done"
                        ),
                        FetchOutcome::Failure(reason) => tracing::warn!(
                            duration_ms = started.elapsed().as_millis() as u64,
                            %reason,
                            "scan.fetch.failed"
                        ),
                    }
                    (idx, FetchResult { url, outcome })
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => tracing::warn!(error = %e, "scan.fetch.join_error"),
            }
        }

        slots
            .into_iter()
            .zip(urls)
            .map(|(slot, url)| slot.unwrap_or_else(|| FetchResult::failure(url, "fetch task aborted")))
            .collect()
    }
}

/// Wait for a free slot, unless cancellation comes first.
async fn admit(
    semaphore: &Arc<Semaphore>,
    cancel: Option<&CancellationToken>,
) -> Option<OwnedSemaphorePermit> {
    match cancel {
        Some(token) => {
            if token.is_cancelled() {
                return None;
            }
            tokio::select! {
                biased;
                _ = token.cancelled() => None,
                permit = Arc::clone(semaphore).acquire_owned() => permit.ok(),
            }
        }
        None => Arc::clone(semaphore).acquire_owned().await.ok(),
    }
}

/// Extract and match one fetched document.
pub fn scan_one(result: &FetchResult, keywords: &KeywordSet) -> Verdict {
    match &result.outcome {
        FetchOutcome::Failure(reason) => Verdict::Failed {
            reason: reason.clone(),
        },
        FetchOutcome::Success(body) if body.trim().is_empty() => Verdict::NoMatch,
        FetchOutcome::Success(body) => match keywords.first_match(&visible_text(body)) {
            Some(kw) => Verdict::Matched {
                keyword: kw.to_string(),
            },
            None => Verdict::NoMatch,
        },
    }
}

/// One scan over a fetch strategy. Owns the strategy for the duration of
/// [`Scanner::run`] and closes it before returning.
pub struct Scanner {
    bounded: BoundedFetcher,
    keywords: KeywordSet,
    cancel: Option<CancellationToken>,
}

impl Scanner {
    pub fn new(fetcher: Arc<dyn Fetcher>, keywords: KeywordSet, concurrency: usize) -> Result<Self> {
        Ok(Self {
            bounded: BoundedFetcher::new(fetcher, concurrency)?,
            keywords,
            cancel: None,
        })
    }

    /// Stop admitting new URLs once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Fetch, extract, and match every URL, then release the fetcher.
    pub async fn run(self, urls: &[String]) -> ScanReport {
        let run_id = Uuid::new_v4();
        let fetcher_name = self.bounded.fetcher.name();
        let span = tracing::info_span!("scan", %run_id, fetcher = fetcher_name);

        async move {
            tracing::info!(
                urls = urls.len(),
                keywords = self.keywords.len(),
                concurrency = self.bounded.limit(),
                "scan.start"
            );
            let started = Instant::now();

            let fetched = self.bounded.fetch_all(urls, self.cancel.as_ref()).await;

            let mut outcomes = Vec::with_capacity(fetched.len());
            let mut matches = Vec::new();
            for result in fetched {
                let verdict = scan_one(&result, &self.keywords);
                if let Verdict::Matched { keyword } = &verdict {
                    tracing::info!(url = %result.url, %keyword, "scan.match");
                    matches.push(MatchRecord {
                        url: result.url.clone(),
                        keyword: keyword.clone(),
                    });
                }
                outcomes.push(UrlOutcome {
                    url: result.url,
                    verdict,
                });
            }
            let elapsed = started.elapsed();

            if let Err(e) = self.bounded.fetcher.close().await {
                tracing::warn!(error = %e, "scan.fetcher.close_failed");
            }

            let report = ScanReport {
                outcomes,
                matches,
                elapsed,
            };
            tracing::info!(
                matched = report.matches.len(),
                failed = report.failures(),
                elapsed_secs = report.elapsed.as_secs_f64(),
                "scan.finished"
            );
            report
        }
        .instrument(span)
        .await
    }
}
