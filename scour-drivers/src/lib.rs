//! Driver layer for browser automation.
//!
//! This crate wraps a WebDriver endpoint (Chromedriver by default) and exposes
//! what the browser fetch strategy needs: rendered page loads that wait for
//! the network to settle, and a pool of sessions shared across concurrent
//! fetches.
//!
//! - [`browser::driver::ScourDriver`]: WebDriver session wrapper
//! - [`browser::page::ScourPage`]: navigation, network-idle wait, DOM source
//! - [`browser::pool::SessionPool`]: reusable sessions with a single shutdown
pub mod browser;
