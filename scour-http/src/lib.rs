//! Minimal HTTP client for page fetches with safe logging and opt-in retries.
//!
//! - Request options: headers, timeout, retries, status strictness
//! - Redacts sensitive query params and never logs secret header values
//! - Retries network errors, 429 and 5xx with exponential backoff and
//!   `Retry-After` support when a retry budget is configured
//! - Optional *raw* request/response logging via `SCOUR_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), scour_http::HttpError> {
//! let client = scour_http::HttpClient::new()?;
//! let html = client
//!     .get_text("https://quotes.toscrape.com/", scour_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), retries, final errors, and
//! (optionally) raw request/response lines (target `http.raw`).

use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, Method, StatusCode, Url};
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use uuid::Uuid;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "SCOUR_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)
const SNIPPET_MAX: usize = 500;

/// User agent sent when the caller does not configure one.
pub const DEFAULT_USER_AGENT: &str = concat!("scour/", env!("CARGO_PKG_VERSION"));

const SECRET_QUERY_KEYS: &[&str] = &[
    "access_token",
    "authorization",
    "auth",
    "key",
    "api_key",
    "apikey",
    "token",
    "secret",
    "client_secret",
    "bearer",
    "signature",
    "sig",
];

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SECRET_QUERY_KEYS.contains(&lower.as_str())
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    parts.push(format!("'{}'", redact_url(url)));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if key.eq_ignore_ascii_case("authorization") || key.eq_ignore_ascii_case("cookie") {
                val = "<redacted>".into();
            }
            (key, val)
        })
        .collect()
}

/// "host + path" and redacted query pairs for structured logs.
fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let redacted = url
        .query_pairs()
        .map(|(k, v)| {
            let k = k.to_string();
            let v = if is_secret_key(&k) {
                "<redacted>".to_string()
            } else {
                v.to_string()
            };
            (k, v)
        })
        .collect::<Vec<_>>();
    (host_path, redacted)
}

/// Full URL with secret query values replaced.
fn redact_url(url: &Url) -> String {
    let (_, pairs) = redact_query(url);
    let mut out = url.clone();
    if pairs.is_empty() {
        return out.to_string();
    }
    out.query_pairs_mut().clear().extend_pairs(pairs.iter());
    out.to_string()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {status} for {url}: {snippet}")]
    Status {
        status: StatusCode,
        url: String,
        snippet: String,
    },
}

// ==============================
// Request Options
// ==============================

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use scour_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     retries: Some(1),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(!opts.fail_on_status);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub headers: Option<HeaderMap>,
    /// If true, non-2xx responses become [`HttpError::Status`] instead of
    /// handing the body back to the caller.
    pub fail_on_status: bool,
}

// ==============================
// Client
// ==============================

/// Shared, cheaply clonable client; clones reuse one connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client with the default user agent.
    ///
    /// ```no_run
    /// use scour_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new()?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(30));
    /// assert_eq!(client.max_retries, 0);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new() -> Result<Self, HttpError> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    /// Construct a client that identifies itself with `user_agent`.
    pub fn with_user_agent(user_agent: &str) -> Result<Self, HttpError> {
        let ua = HeaderValue::from_str(user_agent)
            .map_err(|e| HttpError::Build(format!("invalid user agent: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, ua);
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .default_headers(headers)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            default_timeout: Duration::from_secs(30),
            max_retries: 0,
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Override the default retry budget (zero: a single attempt).
    ///
    /// ```no_run
    /// use scour_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new()?.with_retries(3);
    /// assert_eq!(client.max_retries, 3);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    /// GET `url` and return the decoded body text.
    ///
    /// The body is decoded using the response charset (UTF-8 fallback).
    /// Non-2xx responses still return their body unless
    /// [`RequestOpts::fail_on_status`] is set.
    pub async fn get_text(&self, url: &str, opts: RequestOpts) -> Result<String, HttpError> {
        let url = Url::parse(url).map_err(|e| HttpError::Url(format!("{url}: {e}")))?;
        self.request_text(Method::GET, url, opts).await
    }

    // ==============================
    // Core request implementation
    // ==============================

    async fn request_text(
        &self,
        method: Method,
        url: Url,
        opts: RequestOpts,
    ) -> Result<String, HttpError> {
        let mut attempt = 0usize;
        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let req_id = Uuid::new_v4().simple().to_string();
        let (host_path, redacted_q) = redact_query(&url);

        loop {
            let mut rb = self
                .inner
                .request(method.clone(), url.clone())
                .timeout(timeout);
            if let Some(hdrs) = &opts.headers {
                rb = rb.headers(hdrs.clone());
            }

            tracing::debug!(
                req_id=%req_id,
                attempt=attempt + 1,
                max_retries,
                method=%method,
                host_path=%host_path,
                query=?redacted_q,
                timeout_ms=timeout.as_millis() as u64,
                "http.request.start"
            );

            if raw_enabled() {
                let curl = make_curl(&method, &url, opts.headers.as_ref().unwrap_or(&HeaderMap::new()));
                tracing::debug!(target: "http.raw", %req_id, %curl, "request");
            }

            // ----- Send -----
            let t0 = Instant::now();
            let resp = match rb.send().await {
                Ok(resp) => resp,
                Err(err) => {
                    let message = describe_reqwest_error(&err);
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff(attempt);
                        tracing::warn!(
                            req_id=%req_id,
                            attempt,
                            max_retries,
                            backoff_ms=delay.as_millis() as u64,
                            message=%message,
                            "http.retrying.network_send"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(
                        req_id=%req_id,
                        attempt,
                        max_retries,
                        host_path=%host_path,
                        message=%message,
                        "http.network_error.send"
                    );
                    return Err(HttpError::Network(message));
                }
            };
            let status = resp.status();
            let headers = resp.headers().clone();
            let body = match resp.text().await {
                Ok(body) => body,
                Err(err) => {
                    let message = describe_reqwest_error(&err);
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff(attempt);
                        tracing::warn!(
                            req_id=%req_id,
                            attempt,
                            max_retries,
                            backoff_ms=delay.as_millis() as u64,
                            message=%message,
                            "http.retrying.network_body"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(
                        req_id=%req_id,
                        attempt,
                        max_retries,
                        host_path=%host_path,
                        message=%message,
                        "http.network_error.body"
                    );
                    return Err(HttpError::Network(message));
                }
            };
            let dur_ms = t0.elapsed().as_millis() as u64;

            tracing::debug!(
                req_id=%req_id,
                %status,
                duration_ms=dur_ms,
                body_len=body.len(),
                content_type=?headers.get(reqwest::header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
                "http.response.headers"
            );

            if raw_enabled() {
                let hdrs = redact_headers(&headers);
                let truncated = body.len() > RAW_MAX_BODY;
                tracing::info!(
                    target:"http.raw",
                    %req_id,
                    status=%status,
                    duration_ms=dur_ms,
                    headers=?hdrs,
                    body=%truncate_chars(&body, RAW_MAX_BODY),
                    truncated
                );
            }

            let snippet = snip_body(&body);
            tracing::trace!(
                req_id=%req_id,
                body_snippet=%snippet,
                "http.response.body_snippet"
            );

            if status.is_success() {
                return Ok(body);
            }

            // ----- Non-success: maybe retry -----
            let is_429 = status == StatusCode::TOO_MANY_REQUESTS;
            let is_5xx = status.is_server_error();

            let retry_after = retry_after_delay_secs(&headers).map(Duration::from_secs);
            // A Retry-After beyond the per-request timeout ends the retries.
            let wait_allowed = retry_after.is_none_or(|d| d <= timeout);

            if (is_429 || is_5xx) && attempt < max_retries && wait_allowed {
                attempt += 1;
                let delay = if let Some(d) = retry_after {
                    d
                } else if is_429 {
                    // floor for 429 when no Retry-After is present
                    backoff(attempt).max(Duration::from_millis(1100))
                } else {
                    backoff(attempt)
                };
                tracing::warn!(
                    req_id=%req_id,
                    %status,
                    attempt,
                    max_retries,
                    backoff_ms=delay.as_millis() as u64,
                    retry_after_secs=?retry_after.map(|d| d.as_secs()),
                    "http.retrying"
                );
                sleep(delay).await;
                continue;
            }

            if (is_429 || is_5xx) && attempt < max_retries && !wait_allowed {
                tracing::warn!(
                    req_id=%req_id,
                    %status,
                    retry_after_secs=?retry_after.map(|d| d.as_secs()),
                    timeout_ms=timeout.as_millis() as u64,
                    "http.retry_after_exceeds_timeout"
                );
            }

            if opts.fail_on_status {
                tracing::warn!(
                    req_id=%req_id,
                    %status,
                    host_path=%host_path,
                    body_snippet=%snippet,
                    "http.error"
                );
                return Err(HttpError::Status {
                    status,
                    url: redact_url(&url),
                    snippet,
                });
            }

            tracing::info!(
                req_id=%req_id,
                %status,
                host_path=%host_path,
                "http.response.non_success_body_kept"
            );
            return Ok(body);
        }
    }
}

// ==============================
// Helpers
// ==============================

fn backoff(attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(16) as u32;
    Duration::from_millis(200u64.saturating_mul(1u64 << shift))
}

fn describe_reqwest_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}

fn truncate_chars(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn snip_body(body: &str) -> String {
    if body.len() > SNIPPET_MAX {
        format!("{}...", truncate_chars(body, SNIPPET_MAX))
    } else {
        body.to_string()
    }
}
