use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Fetch pages concurrently and report which ones mention your keywords.
#[derive(Debug, Parser)]
#[command(name = "scour", version)]
pub struct Cli {
    /// URLs to scan, in report order.
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// YAML config file (defaults to <config dir>/scour/scour.yaml when present).
    #[arg(short, long, env = "SCOUR_CONFIG")]
    pub config: Option<PathBuf>,

    /// File with one URL per line; blank lines and `#` comments are skipped.
    #[arg(long)]
    pub urls_file: Option<PathBuf>,

    /// File with one keyword per line, highest priority first.
    #[arg(long)]
    pub keywords_file: Option<PathBuf>,

    /// Keyword to look for; repeat for more. Earlier keywords win.
    #[arg(short = 'k', long = "keyword", value_name = "KEYWORD")]
    pub keywords: Vec<String>,

    /// Maximum fetches in flight.
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Fetch strategy.
    #[arg(long, value_enum)]
    pub fetcher: Option<FetcherKind>,

    /// WebDriver endpoint for the browser strategy.
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Show the browser window instead of running headless.
    #[arg(long)]
    pub headful: bool,

    /// Per-fetch timeout in seconds (page-load timeout for the browser).
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Retries for network errors, 429 and 5xx (HTTP strategy only).
    #[arg(long)]
    pub retries: Option<usize>,

    /// Report format.
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Mirror logs to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FetcherKind {
    Http,
    Browser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Text,
    Json,
}
