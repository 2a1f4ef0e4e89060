use crate::browser::page::ScourPage;
use anyhow::{anyhow, Context, Result};
use fantoccini::{Client, ClientBuilder};
use scour_common::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_NETWORK_IDLE_MS, DEFAULT_WEBDRIVER_URL};
use serde_json::{json, Map, Value};
use std::time::Duration;
use url::Url;
use webdriver::capabilities::Capabilities;

/// How sessions are opened and how long a page may take to settle.
#[derive(Debug, Clone)]
pub struct DriverSettings {
    /// WebDriver endpoint, e.g. Chromedriver on `http://localhost:9515`.
    pub webdriver_url: String,
    /// Run the browser without a visible window.
    pub headless: bool,
    /// Overrides the browser's user agent when set.
    pub user_agent: Option<String>,
    /// Upper bound on navigation plus the network-idle wait.
    pub page_load_timeout: Duration,
    /// Quiet period with no new resource loads that counts as "settled".
    pub network_idle: Duration,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
            user_agent: None,
            page_load_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            network_idle: Duration::from_millis(DEFAULT_NETWORK_IDLE_MS),
        }
    }
}

/// Chrome command-line arguments for the given settings.
pub fn build_chrome_arguments(settings: &DriverSettings) -> Vec<String> {
    let mut args = vec![
        "--disable-dev-shm-usage".to_string(),
        "--disable-extensions".to_string(),
        "--no-first-run".to_string(),
        "--window-size=1366,768".to_string(),
    ];
    if settings.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    if let Some(ua) = &settings.user_agent {
        args.push(format!("--user-agent={ua}"));
    }
    args
}

fn build_capabilities(settings: &DriverSettings) -> Capabilities {
    let mut caps = Capabilities::new();
    let mut chrome_opts = Map::new();
    chrome_opts.insert("args".to_string(), json!(build_chrome_arguments(settings)));
    caps.insert("goog:chromeOptions".to_string(), Value::Object(chrome_opts));
    // Navigation returns once the document is interactive; the page helper
    // then polls for network idle itself.
    caps.insert("pageLoadStrategy".to_string(), json!("eager"));
    // The browser itself abandons a navigation at the same limit, so a hung
    // page cannot keep the session busy past it.
    let limit_ms = settings.page_load_timeout.as_millis() as u64;
    caps.insert(
        "timeouts".to_string(),
        json!({ "pageLoad": limit_ms, "script": limit_ms }),
    );
    caps
}

/// Thin wrapper around one `fantoccini` WebDriver session.
pub struct ScourDriver {
    pub client: Client,
    settings: DriverSettings,
}

impl ScourDriver {
    /// Open a new session on the configured WebDriver service.
    pub async fn connect(settings: &DriverSettings) -> Result<Self> {
        let endpoint = Url::parse(&settings.webdriver_url)
            .map_err(|e| anyhow!("invalid WebDriver URL {}: {e}", settings.webdriver_url))?;

        let client = ClientBuilder::native()
            .capabilities(build_capabilities(settings))
            .connect(endpoint.as_str())
            .await
            .with_context(|| format!("failed to open WebDriver session at {endpoint}"))?;

        tracing::debug!(
            target: "browser.session",
            webdriver = %endpoint,
            headless = settings.headless,
            "session opened"
        );

        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    /// A page handle bound to this session.
    pub fn page(&self) -> ScourPage {
        ScourPage::new(self.client.clone())
    }

    /// Navigate to `url`, wait for the network to settle, and return the
    /// rendered DOM serialised as HTML.
    pub async fn render(&self, url: &str) -> Result<String> {
        let page = self.page();
        let timeout = self.settings.page_load_timeout;
        let idle = self.settings.network_idle;

        let load = async {
            page.goto(url).await?;
            page.wait_for_network_idle(idle).await?;
            page.get_content().await
        };

        tokio::time::timeout(timeout, load)
            .await
            .map_err(|_| anyhow!("page load timed out after {}s", timeout.as_secs_f64()))?
    }

    /// Park the session on a blank document so it can serve the next URL.
    pub async fn reset(&self) -> Result<()> {
        self.page().goto("about:blank").await
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}
