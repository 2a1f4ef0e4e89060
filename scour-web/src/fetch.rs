//! Fetch strategies.
//!
//! Every strategy implements [`Fetcher`]: `fetch(url) -> content | error`.
//! The pipeline only ever sees the trait, so swapping HTTP for a rendered
//! browser load is a configuration choice.
use crate::browser::BrowserFetcher;
use async_trait::async_trait;
use scour_common::DEFAULT_FETCH_TIMEOUT_SECS;
use scour_drivers::browser::DriverSettings;
use scour_http::{DEFAULT_USER_AGENT, HttpClient, HttpError, RequestOpts};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("browser fetch failed: {0:#}")]
    Browser(anyhow::Error),
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Short label for logs ("http", "browser").
    fn name(&self) -> &'static str;

    /// Retrieve the document at `url`.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;

    /// Release shared resources. Called once, after the last fetch.
    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Knobs for the plain HTTP strategy.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub retries: usize,
    pub fail_on_status: bool,
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            retries: 0,
            fail_on_status: false,
            user_agent: None,
        }
    }
}

/// Which strategy to build, with its settings.
#[derive(Debug, Clone)]
pub enum FetcherSettings {
    Http(HttpSettings),
    Browser(DriverSettings),
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self::Http(HttpSettings::default())
    }
}

/// Build the configured strategy behind a shared trait object.
pub fn build_fetcher(settings: FetcherSettings) -> Result<Arc<dyn Fetcher>, FetchError> {
    Ok(match settings {
        FetcherSettings::Http(http) => Arc::new(HttpFetcher::new(http)?),
        FetcherSettings::Browser(driver) => Arc::new(BrowserFetcher::new(driver)),
    })
}

/// Plain GET awaiting the full response body. One client (and so one
/// connection pool) serves every fetch.
#[derive(Clone)]
pub struct HttpFetcher {
    client: HttpClient,
    opts: RequestOpts,
}

impl HttpFetcher {
    pub fn new(settings: HttpSettings) -> Result<Self, FetchError> {
        let ua = settings.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let client = HttpClient::with_user_agent(ua)?
            .with_timeout(settings.timeout)
            .with_retries(settings.retries);
        Ok(Self {
            client,
            opts: RequestOpts {
                fail_on_status: settings.fail_on_status,
                ..Default::default()
            },
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        Ok(self.client.get_text(url, self.opts.clone()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_is_http() {
        let fetcher = build_fetcher(FetcherSettings::default()).unwrap();
        assert_eq!(fetcher.name(), "http");
    }

    #[test]
    fn browser_strategy_builds_without_connecting() {
        let fetcher = build_fetcher(FetcherSettings::Browser(DriverSettings::default())).unwrap();
        assert_eq!(fetcher.name(), "browser");
    }

    #[test]
    fn invalid_user_agent_is_rejected() {
        let err = HttpFetcher::new(HttpSettings {
            user_agent: Some("bad\nagent".into()),
            ..HttpSettings::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, FetchError::Http(HttpError::Build(_))));
    }
}
