//! Shared pool of WebDriver sessions.
//!
//! Sessions are opened lazily, handed out one per in-flight fetch, and
//! parked on `about:blank` between fetches. The pool never holds more idle
//! sessions than the peak number of concurrent fetches, so the caller's
//! concurrency limit also bounds the number of browser sessions.
use crate::browser::driver::{DriverSettings, ScourDriver};
use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

pub struct SessionPool {
    settings: DriverSettings,
    idle: Mutex<Vec<ScourDriver>>,
    /// Sessions being closed in the background after a failed load.
    closing: Mutex<JoinSet<()>>,
    opened: AtomicUsize,
    closed: AtomicBool,
}

impl SessionPool {
    pub fn new(settings: DriverSettings) -> Self {
        Self {
            settings,
            idle: Mutex::new(Vec::new()),
            closing: Mutex::new(JoinSet::new()),
            opened: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Sessions opened over the pool's lifetime.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    /// Take an idle session or open a new one.
    pub async fn acquire(&self) -> Result<ScourDriver> {
        if self.closed.load(Ordering::Acquire) {
            bail!("browser session pool is shut down");
        }
        if let Some(driver) = self.idle.lock().await.pop() {
            return Ok(driver);
        }
        let driver = ScourDriver::connect(&self.settings).await?;
        self.opened.fetch_add(1, Ordering::Relaxed);
        Ok(driver)
    }

    /// Return a healthy session. Sessions that cannot be reset, or that come
    /// back after shutdown, are closed instead.
    pub async fn release(&self, driver: ScourDriver) {
        if self.closed.load(Ordering::Acquire) {
            close_quietly(driver).await;
            return;
        }
        match driver.reset().await {
            Ok(()) => self.idle.lock().await.push(driver),
            Err(e) => {
                tracing::debug!(target: "browser.session", error = %e, "reset failed; closing session");
                self.discard(driver).await;
            }
        }
    }

    /// Close a session that should not be reused (e.g. after a failed load).
    ///
    /// The close runs in the background: a session whose navigation timed
    /// out may still be busy, and the caller must not queue behind it.
    pub async fn discard(&self, driver: ScourDriver) {
        if self.closed.load(Ordering::Acquire) {
            close_quietly(driver).await;
            return;
        }
        self.closing.lock().await.spawn(close_quietly(driver));
    }

    /// Close every idle session and refuse further acquisitions.
    ///
    /// Background closes get one page-load timeout to finish; stragglers
    /// are aborted.
    pub async fn shutdown(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);

        let mut closing = std::mem::take(&mut *self.closing.lock().await);
        let grace = self.settings.page_load_timeout;
        let drained = tokio::time::timeout(grace, async {
            while closing.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!(
                target: "browser.session",
                pending = closing.len(),
                "discarded sessions still closing; aborting"
            );
            closing.abort_all();
        }

        let idle: Vec<ScourDriver> = std::mem::take(&mut *self.idle.lock().await);
        let count = idle.len();
        let mut failures = 0usize;
        for driver in idle {
            if driver.close().await.is_err() {
                failures += 1;
            }
        }
        tracing::debug!(
            target: "browser.session",
            closed = count,
            failures,
            opened = self.opened(),
            "session pool shut down"
        );
        if failures > 0 {
            bail!("{failures} of {count} browser sessions failed to close");
        }
        Ok(())
    }
}

async fn close_quietly(driver: ScourDriver) {
    if let Err(e) = driver.close().await {
        tracing::debug!(target: "browser.session", error = %e, "session close failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// A WebDriver endpoint that opens sessions instantly but takes
    /// `close_delay` to end them, like a session stuck on a navigation.
    async fn slow_closing_webdriver(close_delay: Duration) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": { "sessionId": "stuck-session", "capabilities": {} }
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/session/stuck-session"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "value": null }))
                    .set_delay(close_delay),
            )
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn acquire_after_shutdown_fails() {
        let pool = SessionPool::new(DriverSettings::default());
        pool.shutdown().await.unwrap();
        let err = pool.acquire().await.err().unwrap();
        assert!(err.to_string().contains("shut down"));
        assert_eq!(pool.opened(), 0);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let pool = SessionPool::new(DriverSettings {
            webdriver_url: "http://127.0.0.1:9".into(),
            ..DriverSettings::default()
        });
        assert!(pool.acquire().await.is_err());
        assert_eq!(pool.opened(), 0);
    }

    #[tokio::test]
    async fn discard_does_not_wait_for_a_busy_session() {
        let server = slow_closing_webdriver(Duration::from_secs(5)).await;
        let pool = SessionPool::new(DriverSettings {
            webdriver_url: server.uri(),
            page_load_timeout: Duration::from_millis(300),
            ..DriverSettings::default()
        });

        let driver = pool.acquire().await.unwrap();
        assert_eq!(pool.opened(), 1);

        let started = Instant::now();
        pool.discard(driver).await;
        assert!(started.elapsed() < Duration::from_secs(1));

        // Shutdown waits at most one page-load timeout for the stuck close.
        let started = Instant::now();
        pool.shutdown().await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
