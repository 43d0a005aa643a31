//! Headless browser sessions for script-rendered pages.
//!
//! Only the navigate / render / terminate contract of the browser matters to
//! the agent, so it is expressed as the [`BrowserLauncher`] and
//! [`BrowserSession`] traits. A session is a scoped resource: dropping it
//! terminates the browser process, which is what guarantees release on every
//! exit path of dynamic retrieval.

use anyhow::{anyhow, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::config::BrowserConfig;

/// A live browser with one open tab
pub trait BrowserSession: Send {
    /// Navigate and wait for the initial load to finish
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Serialized DOM as currently rendered
    fn rendered_markup(&mut self) -> Result<String>;
}

/// Starts browser sessions; implementations must be shareable with blocking tasks
pub trait BrowserLauncher: Send + Sync {
    fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}

/// Launches local headless Chrome processes
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    sandbox: bool,
}

impl ChromeLauncher {
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self { sandbox: config.sandbox }
    }
}

/// Sandbox is disabled when running inside a container
/// (detected via /.dockerenv or RECON_AGENT_CONTAINER env var).
fn is_container() -> bool {
    std::env::var("RECON_AGENT_CONTAINER").is_ok()
        || std::path::Path::new("/.dockerenv").exists()
}

/// Chrome binary override: CHROME_PATH env var, then the WSL Windows install
fn chrome_path() -> Option<PathBuf> {
    std::env::var("CHROME_PATH").ok()
        .map(PathBuf::from)
        .or_else(|| {
            let wsl_path = std::path::Path::new("/mnt/c/Program Files/Google/Chrome/Application/chrome.exe");
            if wsl_path.exists() { Some(wsl_path.to_path_buf()) } else { None }
        })
}

impl BrowserLauncher for ChromeLauncher {
    fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let sandbox = self.sandbox && !is_container();

        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(sandbox)
            .path(chrome_path())
            .build()
            .map_err(|e| anyhow!("Failed to build Chrome launch options: {}", e))?;

        let browser = Browser::new(options)
            .map_err(|e| anyhow!("Failed to launch headless Chrome: {}", e))?;
        let tab = browser.new_tab()
            .map_err(|e| anyhow!("Failed to create browser tab: {}", e))?;

        debug!("Launched headless Chrome (sandbox: {})", sandbox);
        Ok(Box::new(ChromeSession { _browser: browser, tab }))
    }
}

struct ChromeSession {
    // Dropping the Browser kills the Chrome process
    _browser: Browser,
    tab: Arc<Tab>,
}

impl BrowserSession for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.tab.navigate_to(url)
            .map_err(|e| anyhow!("Failed to navigate to {}: {}", url, e))?;
        self.tab.wait_until_navigated()
            .map_err(|e| anyhow!("Page failed to load for {}: {}", url, e))?;
        Ok(())
    }

    fn rendered_markup(&mut self) -> Result<String> {
        self.tab.get_content()
            .map_err(|e| anyhow!("Failed to get page content: {}", e))
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(false) {
            debug!("Closing browser tab failed (process is terminated anyway): {}", e);
        }
        debug!("Headless Chrome session released");
    }
}
