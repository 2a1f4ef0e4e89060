//! Fetch, extract, and scan.
//!
//! - Pluggable fetch strategies behind [`fetch::Fetcher`]: plain HTTP
//!   ([`fetch::HttpFetcher`]) and browser-rendered ([`browser::BrowserFetcher`])
//! - Visible-text extraction from HTML (`extract`)
//! - First-match keyword search (`matcher`)
//! - The bounded concurrent pipeline tying them together (`pipeline`)

pub mod browser;
pub mod extract;
pub mod fetch;
pub mod matcher;
pub mod pipeline;

pub use browser::BrowserFetcher;
pub use extract::visible_text;
pub use fetch::{FetchError, Fetcher, FetcherSettings, HttpFetcher, HttpSettings, build_fetcher};
pub use matcher::KeywordSet;
pub use pipeline::{
    BoundedFetcher, FetchOutcome, FetchResult, MatchRecord, ScanReport, Scanner, UrlOutcome,
    Verdict,
};
