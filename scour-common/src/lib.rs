//! Common types and utilities shared across scour crates.
//!
//! This crate holds the shared error type, workspace-wide defaults, and the
//! observability helpers. It is intentionally lightweight so every crate can
//! depend on it without pulling in the HTTP or browser stacks.
//!
//! # Overview
//!
//! - [`ScourError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`OutputFormat`]: how scan reports are rendered
//! - Defaults such as [`DEFAULT_CONCURRENCY`] and [`DEFAULT_WEBDRIVER_URL`]
//!
//! # Examples
//!
//! ```rust
//! use scour_common::{OutputFormat, DEFAULT_CONCURRENCY};
//!
//! assert_eq!(DEFAULT_CONCURRENCY, 10);
//! assert_eq!(OutputFormat::default(), OutputFormat::Text);
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Fetches allowed in flight when nothing else is configured.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Chromedriver's default listen address.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Per-fetch timeout applied by both fetch strategies unless overridden.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Quiet period the browser strategy waits for before reading the DOM.
pub const DEFAULT_NETWORK_IDLE_MS: u64 = 500;

/// Preferred output format for scan reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `Keyword '..' found in URL: ..` line per match, then the timing line.
    #[default]
    Text,
    /// The whole report as a single JSON document.
    Json,
}

/// Error types used across the scour workspace.
#[derive(thiserror::Error, Debug)]
pub enum ScourError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient alias for results that use [`ScourError`].
pub type Result<T> = std::result::Result<T, ScourError>;
