//! Merges command-line flags over the loaded config into one run plan.
use crate::cli::{Cli, FetcherKind, FormatArg};
use anyhow::{Context, Result, bail};
use scour_common::OutputFormat;
use scour_common::observability::LogConfig;
use scour_config::{FetcherConfig, ScourConfig};
use scour_drivers::browser::DriverSettings;
use scour_web::{FetcherSettings, HttpSettings, KeywordSet};
use std::path::Path;
use std::time::Duration;

#[derive(Debug)]
pub struct RunPlan {
    pub urls: Vec<String>,
    pub keywords: KeywordSet,
    pub concurrency: usize,
    pub fetcher: FetcherSettings,
    pub output: OutputFormat,
    pub log: LogConfig,
}

impl RunPlan {
    /// Flags win over config. URL and keyword lists given on the command
    /// line replace the configured lists rather than extending them.
    pub fn resolve(cfg: ScourConfig, cli: &Cli) -> Result<Self> {
        let mut urls = cli.urls.clone();
        if let Some(path) = &cli.urls_file {
            urls.extend(read_list(path)?);
        }
        if urls.is_empty() {
            urls = cfg.scan.urls;
        }
        if urls.is_empty() {
            bail!("no URLs to scan; pass them as arguments, via --urls-file, or in scan.urls");
        }

        let mut keywords = Vec::new();
        if let Some(path) = &cli.keywords_file {
            keywords.extend(read_list(path)?);
        }
        keywords.extend(cli.keywords.iter().cloned());
        if keywords.is_empty() {
            keywords = cfg.scan.keywords;
        }
        if keywords.is_empty() {
            bail!("no keywords given; pass -k/--keyword, --keywords-file, or set scan.keywords");
        }
        let keywords = KeywordSet::new(keywords)?;

        let concurrency = cli.concurrency.unwrap_or(cfg.scan.concurrency);
        if concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        if cli.timeout_secs == Some(0) {
            bail!("--timeout-secs must be positive");
        }

        let fetcher = fetcher_settings(apply_fetcher_flags(cfg.fetcher, cli)?);

        let output = match cli.format {
            Some(FormatArg::Text) => OutputFormat::Text,
            Some(FormatArg::Json) => OutputFormat::Json,
            None => cfg.output.format,
        };

        let log = LogConfig {
            log_dir: cfg.logging.dir,
            emit_stderr: cfg.logging.stderr || cli.verbose,
            format: cfg.logging.format,
            default_filter: if cli.verbose {
                "debug".into()
            } else {
                cfg.logging.filter
            },
            ..LogConfig::default()
        };

        Ok(Self {
            urls,
            keywords,
            concurrency,
            fetcher,
            output,
            log,
        })
    }
}

/// One entry per line. Blank lines and `#` comments are skipped.
pub fn read_list(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_list(&raw))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Strategy-specific flags must match the strategy in use.
fn apply_fetcher_flags(base: FetcherConfig, cli: &Cli) -> Result<FetcherConfig> {
    let mut fetcher = match (cli.fetcher, base) {
        (Some(FetcherKind::Browser), cfg @ FetcherConfig::Browser { .. }) => cfg,
        (Some(FetcherKind::Http), cfg @ FetcherConfig::Http { .. }) => cfg,
        (None, cfg) => cfg,
        (Some(FetcherKind::Http), _) => FetcherConfig::default(),
        (Some(FetcherKind::Browser), _) => default_browser(),
    };

    match &mut fetcher {
        FetcherConfig::Http {
            timeout_secs,
            retries,
            ..
        } => {
            if let Some(t) = cli.timeout_secs {
                *timeout_secs = t;
            }
            if let Some(r) = cli.retries {
                *retries = r;
            }
            if cli.webdriver_url.is_some() || cli.headful {
                bail!("--webdriver-url and --headful only apply to the browser fetcher; add --fetcher browser");
            }
        }
        FetcherConfig::Browser {
            webdriver_url,
            headless,
            load_timeout_secs,
            ..
        } => {
            if let Some(url) = &cli.webdriver_url {
                *webdriver_url = url.clone();
            }
            if cli.headful {
                *headless = false;
            }
            if let Some(t) = cli.timeout_secs {
                *load_timeout_secs = t;
            }
            if cli.retries.is_some() {
                bail!("--retries only applies to the http fetcher");
            }
        }
    }
    Ok(fetcher)
}

fn default_browser() -> FetcherConfig {
    let d = DriverSettings::default();
    FetcherConfig::Browser {
        webdriver_url: d.webdriver_url,
        headless: d.headless,
        network_idle_ms: d.network_idle.as_millis() as u64,
        load_timeout_secs: d.page_load_timeout.as_secs(),
        user_agent: d.user_agent,
    }
}

fn fetcher_settings(cfg: FetcherConfig) -> FetcherSettings {
    match cfg {
        FetcherConfig::Http {
            timeout_secs,
            retries,
            fail_on_status,
            user_agent,
        } => FetcherSettings::Http(HttpSettings {
            timeout: Duration::from_secs(timeout_secs),
            retries,
            fail_on_status,
            user_agent,
        }),
        FetcherConfig::Browser {
            webdriver_url,
            headless,
            network_idle_ms,
            load_timeout_secs,
            user_agent,
        } => FetcherSettings::Browser(DriverSettings {
            webdriver_url,
            headless,
            user_agent,
            page_load_timeout: Duration::from_secs(load_timeout_secs),
            network_idle: Duration::from_millis(network_idle_ms),
        }),
    }
}
