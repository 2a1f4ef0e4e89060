use crate::fetch::{FetchError, Fetcher};
use async_trait::async_trait;
use scour_drivers::browser::{DriverSettings, SessionPool};

/// Browser-rendered fetches over a shared pool of WebDriver sessions.
///
/// Each fetch checks a session out, loads the page, waits for the network to
/// settle, and reads the rendered DOM. A session that failed mid-load is
/// closed rather than returned to the pool.
pub struct BrowserFetcher {
    pool: SessionPool,
}

impl BrowserFetcher {
    pub fn new(settings: DriverSettings) -> Self {
        Self {
            pool: SessionPool::new(settings),
        }
    }
}

#[async_trait]
impl Fetcher for BrowserFetcher {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let driver = self.pool.acquire().await.map_err(FetchError::Browser)?;
        match driver.render(url).await {
            Ok(html) => {
                self.pool.release(driver).await;
                Ok(html)
            }
            Err(e) => {
                self.pool.discard(driver).await;
                Err(FetchError::Browser(e))
            }
        }
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.pool.shutdown().await
    }
}
