use anyhow::{anyhow, Result};
use recon_agent::browser_pool::{BrowserLauncher, BrowserSession};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Stands in for headless Chrome: serves fixed markup and counts how many
/// sessions were launched and released.
#[derive(Clone, Default)]
pub struct FakeBrowser {
    pub markup: String,
    pub fail_launch: bool,
    pub fail_navigate: bool,
    pub fail_render: bool,
    pub launched: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
    pub visited: Arc<Mutex<Vec<String>>>,
}

impl FakeBrowser {
    pub fn rendering(markup: &str) -> Self {
        Self { markup: markup.to_string(), ..Self::default() }
    }

    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

impl BrowserLauncher for FakeBrowser {
    fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        if self.fail_launch {
            return Err(anyhow!("Failed to launch headless Chrome: no binary"));
        }
        self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession { browser: self.clone() }))
    }
}

struct FakeSession {
    browser: FakeBrowser,
}

impl BrowserSession for FakeSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        if self.browser.fail_navigate {
            return Err(anyhow!("Failed to navigate to {}: connection reset", url));
        }
        self.browser.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }

    fn rendered_markup(&mut self) -> Result<String> {
        if self.browser.fail_render {
            return Err(anyhow!("Failed to get page content: target crashed"));
        }
        Ok(self.browser.markup.clone())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.browser.released.fetch_add(1, Ordering::SeqCst);
    }
}
