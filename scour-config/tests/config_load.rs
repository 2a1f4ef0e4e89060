use scour_common::OutputFormat;
use scour_common::observability::LogFormat;
use scour_config::{FetcherConfig, ScourConfigLoader};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
version: "1"
scan:
  urls:
    - "https://quotes.toscrape.com/"
    - "https://${SCOUR_TEST_HOST}/"
  keywords: ["happiness", "love"]
  concurrency: 4
fetcher:
  kind: http
  timeout_secs: 12
  retries: 1
logging:
  format: json
  stderr: true
output:
  format: json
"#;

#[test]
#[serial]
fn loads_file_and_expands_placeholders() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "scour.yaml", FILE_YAML);

    let config = temp_env::with_var("SCOUR_TEST_HOST", Some("books.toscrape.com"), || {
        ScourConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load scan config")
    });

    assert_eq!(config.version.as_deref(), Some("1"));
    assert_eq!(
        config.scan.urls,
        vec![
            "https://quotes.toscrape.com/".to_string(),
            "https://books.toscrape.com/".to_string()
        ]
    );
    assert_eq!(config.scan.keywords, vec!["happiness", "love"]);
    assert_eq!(config.scan.concurrency, 4);
    assert!(matches!(
        config.fetcher,
        FetcherConfig::Http {
            timeout_secs: 12,
            retries: 1,
            ..
        }
    ));
    assert_eq!(config.logging.format, LogFormat::Json);
    assert!(config.logging.stderr);
    assert_eq!(config.output.format, OutputFormat::Json);
}

#[test]
#[serial]
fn environment_overrides_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "scour.yaml", FILE_YAML);

    let config = temp_env::with_vars(
        [
            ("SCOUR_TEST_HOST", Some("example.com")),
            ("SCOUR__SCAN__CONCURRENCY", Some("2")),
            ("SCOUR__SCAN__KEYWORDS", Some("alpha,beta")),
        ],
        || ScourConfigLoader::new().with_file(&p).load(),
    )
    .expect("load with env overrides");

    assert_eq!(config.scan.concurrency, 2);
    assert_eq!(config.scan.keywords, vec!["alpha", "beta"]);
}

#[test]
#[serial]
fn missing_optional_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = ScourConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults load");

    assert_eq!(config.scan.concurrency, 10);
    assert!(config.scan.urls.is_empty());
    assert!(matches!(config.fetcher, FetcherConfig::Http { .. }));
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = ScourConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}

#[test]
#[serial]
fn browser_fetcher_section() {
    let config = ScourConfigLoader::new()
        .with_yaml_str(
            r#"
fetcher:
  kind: browser
  webdriver_url: "http://127.0.0.1:4444"
  network_idle_ms: 250
"#,
        )
        .load()
        .expect("browser config");

    match config.fetcher {
        FetcherConfig::Browser {
            webdriver_url,
            headless,
            network_idle_ms,
            load_timeout_secs,
            ..
        } => {
            assert_eq!(webdriver_url, "http://127.0.0.1:4444");
            assert!(headless);
            assert_eq!(network_idle_ms, 250);
            assert_eq!(load_timeout_secs, 30);
        }
        other => panic!("expected browser fetcher, got {other:?}"),
    }
}

#[test]
#[serial]
fn zero_concurrency_is_rejected_on_load() {
    let result = ScourConfigLoader::new()
        .with_yaml_str("scan:\n  concurrency: 0\n")
        .load();
    assert!(result.is_err());
}
