mod common;

use scour_drivers::browser::DriverSettings;
use scour_web::{FetcherSettings, KeywordSet, Scanner, Verdict, build_fetcher};

// Requires chromedriver listening on SCOUR_WEBDRIVER_URL (default :9515)
// and outbound network access.
#[tokio::test]
#[ignore]
async fn browser_scan_smoketest() {
    common::init_test_tracing();
    let webdriver_url = std::env::var("SCOUR_WEBDRIVER_URL")
        .unwrap_or_else(|_| scour_common::DEFAULT_WEBDRIVER_URL.to_string());

    let fetcher = build_fetcher(FetcherSettings::Browser(DriverSettings {
        webdriver_url,
        ..DriverSettings::default()
    }))
    .expect("browser fetcher builds");

    let urls = vec![
        "https://quotes.toscrape.com/js/".to_string(),
        "https://books.toscrape.com/".to_string(),
    ];
    let report = Scanner::new(fetcher, KeywordSet::new(["einstein"]).unwrap(), 2)
        .unwrap()
        .run(&urls)
        .await;

    tracing::debug!(?report, "browser scan report");
    assert_eq!(report.outcomes.len(), 2);
    // Quotes on the JS page only exist after rendering.
    assert!(matches!(
        report.outcomes[0].verdict,
        Verdict::Matched { .. }
    ));
}
