//! Browser session abstraction.
//!
//! The runner only needs a page that can load a URL, wait for an element
//! and hand back its rendered HTML. [`chromium`] drives headless Chrome
//! through chromiumoxide; tests substitute a scripted session.

pub mod chromium;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use chromium::{ChromiumLauncher, DEFAULT_USER_AGENT, LaunchOptions};

/// Starts one exclusively-owned browser session per run.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageSession>>;
}

/// A single page in a running browser.
#[async_trait]
pub trait PageSession: Send {
    /// Load `url`, failing with `NavigationTimeout` once `timeout` elapses.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Block until `selector` matches, failing with `ElementWaitTimeout`.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Rendered HTML of the current document.
    async fn content(&mut self) -> Result<String>;

    /// Release the page and the browser process behind it.
    async fn close(self: Box<Self>) -> Result<()>;
}
