use anyhow::Result;
use fantoccini::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

const PROBE_SCRIPT: &str = r#"
return {
    ready: document.readyState,
    resources: performance.getEntriesByType('resource').length
};
"#;

/// Snapshot of document load progress read from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProbe {
    pub ready_state: String,
    pub resources: u64,
}

impl LoadProbe {
    /// Parse the value returned by the probe script; missing fields read as
    /// "still loading".
    pub fn from_value(v: &Value) -> Self {
        Self {
            ready_state: v
                .get("ready")
                .and_then(Value::as_str)
                .unwrap_or("loading")
                .to_string(),
            resources: v.get("resources").and_then(Value::as_u64).unwrap_or(0),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.ready_state == "complete"
    }
}

/// Tracks when the resource count last changed.
#[derive(Debug)]
pub struct IdleTracker {
    idle: Duration,
    last: Option<LoadProbe>,
    stable_since: Instant,
}

impl IdleTracker {
    pub fn new(idle: Duration, now: Instant) -> Self {
        Self {
            idle,
            last: None,
            stable_since: now,
        }
    }

    /// Feed one probe; true once the document is complete and no new
    /// resources appeared for the idle window.
    pub fn observe(&mut self, probe: LoadProbe, now: Instant) -> bool {
        let changed = self.last.as_ref() != Some(&probe);
        let complete = probe.is_complete();
        self.last = Some(probe);
        if changed || !complete {
            self.stable_since = now;
            return false;
        }
        now.duration_since(self.stable_since) >= self.idle
    }
}

/// Page handle over a WebDriver session.
pub struct ScourPage {
    client: Client,
}

impl ScourPage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Navigate to `url`.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.client.goto(url).await.map_err(anyhow::Error::from)
    }

    /// Read document state and the number of loaded resources.
    pub async fn probe(&self) -> Result<LoadProbe> {
        let v = self.client.execute(PROBE_SCRIPT, vec![]).await?;
        Ok(LoadProbe::from_value(&v))
    }

    /// Poll until the document is complete and the resource timeline has been
    /// quiet for `idle`. Callers bound the total wait.
    pub async fn wait_for_network_idle(&self, idle: Duration) -> Result<()> {
        let mut tracker = IdleTracker::new(idle, Instant::now());
        loop {
            let probe = self.probe().await?;
            if tracker.observe(probe, Instant::now()) {
                debug!(target: "browser.page", "network idle");
                return Ok(());
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Return the full rendered page HTML.
    pub async fn get_content(&self) -> Result<String> {
        self.client.source().await.map_err(anyhow::Error::msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn probe(ready: &str, resources: u64) -> LoadProbe {
        LoadProbe {
            ready_state: ready.to_string(),
            resources,
        }
    }

    #[test]
    fn parses_probe_value() {
        let p = LoadProbe::from_value(&json!({"ready": "complete", "resources": 7}));
        assert_eq!(p, probe("complete", 7));
        assert!(p.is_complete());
    }

    #[test]
    fn missing_fields_read_as_loading() {
        let p = LoadProbe::from_value(&json!(null));
        assert_eq!(p, probe("loading", 0));
        assert!(!p.is_complete());
    }

    #[test]
    fn idle_requires_quiet_window_after_completion() {
        let t0 = Instant::now();
        let idle = Duration::from_millis(500);
        let mut tracker = IdleTracker::new(idle, t0);

        assert!(!tracker.observe(probe("interactive", 3), t0));
        assert!(!tracker.observe(probe("complete", 5), t0 + Duration::from_millis(100)));
        assert!(!tracker.observe(probe("complete", 5), t0 + Duration::from_millis(400)));
        assert!(tracker.observe(probe("complete", 5), t0 + Duration::from_millis(600)));
    }

    #[test]
    fn new_resources_restart_the_window() {
        let t0 = Instant::now();
        let idle = Duration::from_millis(500);
        let mut tracker = IdleTracker::new(idle, t0);

        assert!(!tracker.observe(probe("complete", 5), t0));
        assert!(!tracker.observe(probe("complete", 6), t0 + Duration::from_millis(450)));
        assert!(!tracker.observe(probe("complete", 6), t0 + Duration::from_millis(900)));
        assert!(tracker.observe(probe("complete", 6), t0 + Duration::from_millis(950)));
    }
}
