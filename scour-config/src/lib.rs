//! Loader for scan configuration with YAML + environment overlays.
//!
//! Precedence, lowest to highest: built-in defaults, config files (in the
//! order added), `SCOUR__`-prefixed environment variables. Nested keys use
//! `__` as separator (`SCOUR__SCAN__CONCURRENCY=4`); `scan.urls` and
//! `scan.keywords` accept comma-separated lists from the environment.
//! String values may reference other environment variables as `${VAR}`;
//! expansion is applied recursively, up to a fixed depth.
//!
//! ```yaml
//! version: "1"
//! scan:
//!   urls: ["https://quotes.toscrape.com/"]
//!   keywords: ["happiness"]
//!   concurrency: 10
//! fetcher:
//!   kind: http          # or: browser
//!   timeout_secs: 30
//! logging:
//!   format: text
//! output:
//!   format: text
//! ```
use config::{Config, ConfigError, Environment, File, FileFormat};
use scour_common::observability::LogFormat;
use scour_common::{
    DEFAULT_CONCURRENCY, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_NETWORK_IDLE_MS,
    DEFAULT_WEBDRIVER_URL, OutputFormat,
};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "SCOUR";

/// File name looked up under the user's config directory.
pub const DEFAULT_CONFIG_FILE: &str = "scour.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScourConfig {
    pub version: Option<String>,
    pub scan: ScanConfig,
    pub fetcher: FetcherConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub urls: Vec<String>,
    pub keywords: Vec<String>,
    pub concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            keywords: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// The tag is `kind`; strategy settings sit next to it.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FetcherConfig {
    Http {
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
        #[serde(default)]
        retries: usize,
        #[serde(default)]
        fail_on_status: bool,
        #[serde(default)]
        user_agent: Option<String>,
    },
    Browser {
        #[serde(default = "default_webdriver_url")]
        webdriver_url: String,
        #[serde(default = "default_true")]
        headless: bool,
        #[serde(default = "default_network_idle_ms")]
        network_idle_ms: u64,
        #[serde(default = "default_timeout_secs")]
        load_timeout_secs: u64,
        #[serde(default)]
        user_agent: Option<String>,
    },
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self::Http {
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            retries: 0,
            fail_on_status: false,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub dir: Option<PathBuf>,
    pub stderr: bool,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            dir: None,
            stderr: false,
            filter: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}
fn default_webdriver_url() -> String {
    DEFAULT_WEBDRIVER_URL.into()
}
fn default_network_idle_ms() -> u64 {
    DEFAULT_NETWORK_IDLE_MS
}
fn default_true() -> bool {
    true
}

impl ScourConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.concurrency == 0 {
            return Err(ConfigError::Message(
                "scan.concurrency must be at least 1".into(),
            ));
        }
        if self.scan.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Message(
                "scan.keywords must not contain blank entries".into(),
            ));
        }
        match &self.fetcher {
            FetcherConfig::Http { timeout_secs, .. } if *timeout_secs == 0 => Err(
                ConfigError::Message("fetcher.timeout_secs must be positive".into()),
            ),
            FetcherConfig::Browser {
                load_timeout_secs, ..
            } if *load_timeout_secs == 0 => Err(ConfigError::Message(
                "fetcher.load_timeout_secs must be positive".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// `<config dir>/scour/scour.yaml`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scour").join(DEFAULT_CONFIG_FILE))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct ScourConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ScourConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ScourConfigLoader {
    /// Start from built-in defaults; `SCOUR__` env overrides are applied on load.
    ///
    /// ```
    /// use scour_config::ScourConfigLoader;
    ///
    /// let config = ScourConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nscan:\n  keywords: [happiness]")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.scan.concurrency, 10);
    /// assert!(config.scan.urls.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Attach [`default_config_path`] as an optional file.
    pub fn with_default_file(self) -> Self {
        match default_config_path() {
            Some(path) => self.with_optional_file(path),
            None => self,
        }
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use scour_config::{FetcherConfig, ScourConfigLoader};
    ///
    /// let cfg = ScourConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// fetcher:
    ///   kind: browser
    ///   headless: false
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// match cfg.fetcher {
    ///     FetcherConfig::Browser { webdriver_url, headless, .. } => {
    ///         assert_eq!(webdriver_url, "http://localhost:9515");
    ///         assert!(!headless);
    ///     }
    ///     other => panic!("expected browser fetcher, got {other:?}"),
    /// }
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders, deserialize, and validate.
    pub fn load(self) -> Result<ScourConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("scan.urls")
                    .with_list_parse_key("scan.keywords"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: ScourConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;
        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("SITE", Some("example.com")), ("PAGE", Some("news"))], || {
            let mut v = json!([
                "https://$SITE/",
                { "url": "https://${SITE}/${PAGE}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!([
                    "https://example.com/",
                    { "url": "https://example.com/news" },
                    42,
                    true,
                    null
                ])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST_SCOUR}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST_SCOUR}"));
    }

    #[test]
    fn defaults_are_http_with_ten_slots() {
        let cfg = ScourConfig::default();
        assert_eq!(cfg.scan.concurrency, 10);
        assert!(matches!(
            cfg.fetcher,
            FetcherConfig::Http {
                timeout_secs: 30,
                retries: 0,
                ..
            }
        ));
        assert_eq!(cfg.output.format, OutputFormat::Text);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validation_rejects_zero_concurrency_and_blank_keywords() {
        let mut cfg = ScourConfig::default();
        cfg.scan.concurrency = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = ScourConfig::default();
        cfg.scan.keywords = vec!["ok".into(), " ".into()];
        assert!(cfg.validate().is_err());

        let cfg = ScourConfig {
            fetcher: FetcherConfig::Http {
                timeout_secs: 0,
                retries: 0,
                fail_on_status: false,
                user_agent: None,
            },
            ..ScourConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_path_ends_with_file_name() {
        if let Some(p) = default_config_path() {
            assert!(p.ends_with("scour/scour.yaml"));
        }
    }
}
