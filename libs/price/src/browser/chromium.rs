//! Headless Chrome via chromiumoxide.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Launcher, PageSession};
use crate::error::{FetchError, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const WAIT_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub chrome_path: Option<PathBuf>,
    pub user_agent: String,
    pub window_size: (u32, u32),
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            chrome_path: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            window_size: (1920, 1080),
        }
    }
}

/// Find a Chrome binary: the configured path if it exists, then `PATH`.
///
/// `None` leaves the lookup to chromiumoxide.
pub fn find_chrome(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        warn!(path = %path.display(), "configured chrome path does not exist");
    }

    ["google-chrome", "chromium", "chromium-browser"]
        .into_iter()
        .find_map(|name| which::which(name).ok())
}

pub struct ChromiumLauncher {
    options: LaunchOptions,
}

impl ChromiumLauncher {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }

    fn config(&self) -> Result<BrowserConfig> {
        let (width, height) = self.options.window_size;

        let mut builder = BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-accelerated-2d-canvas")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", self.options.user_agent))
            .window_size(width, height);

        if let Some(path) = find_chrome(self.options.chrome_path.as_deref()) {
            debug!(path = %path.display(), "using chrome binary");
            builder = builder.chrome_executable(path);
        }

        builder
            .build()
            .map_err(|e| FetchError::Browser(format!("failed to build browser config: {e}")))
    }
}

#[async_trait]
impl Launcher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn PageSession>> {
        let config = self.config()?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Browser(format!("failed to launch Chromium: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "cdp handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                shutdown(&mut browser, handler).await;
                return Err(FetchError::Browser(format!("failed to open page: {e}")));
            }
        };

        info!("browser session started");

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler,
        }))
    }
}

pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(FetchError::Browser(format!("navigation failed: {e}"))),
            Err(_) => Err(FetchError::NavigationTimeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let page = &self.page;
        let appeared = async {
            while page.find_element(selector).await.is_err() {
                tokio::time::sleep(WAIT_POLL).await;
            }
        };

        tokio::time::timeout(timeout, appeared)
            .await
            .map_err(|_| FetchError::ElementWaitTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
    }

    async fn content(&mut self) -> Result<String> {
        self.page.content().await.map_err(FetchError::browser)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumSession {
            mut browser,
            page,
            handler,
        } = *self;

        if let Err(e) = page.close().await {
            debug!(error = %e, "page close failed");
        }
        shutdown(&mut browser, handler).await;

        info!("browser session closed");
        Ok(())
    }
}

async fn shutdown(browser: &mut Browser, handler: JoinHandle<()>) {
    if let Err(e) = browser.close().await {
        warn!(error = %e, "browser close failed, killing process");
        if let Some(Err(e)) = browser.kill().await {
            warn!(error = %e, "failed to kill browser process");
        }
    }
    if let Err(e) = browser.wait().await {
        warn!(error = %e, "failed waiting for browser exit");
    }
    handler.abort();
}
