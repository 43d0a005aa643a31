//! Page retrieval: a plain HTTP fetch for static sites and a headless browser
//! render for script-driven ones. Both produce the same [`Retrieval`] shape.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::browser_pool::BrowserLauncher;
use crate::config::{AppConfig, HttpConfig};
use crate::html::PageDocument;

/// How a page has to be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Essential content is in the initial server response
    Static,
    /// Content needs script execution to appear
    Dynamic,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Static => write!(f, "Static scrape"),
            Strategy::Dynamic => write!(f, "Dynamic (headless browser) scrape"),
        }
    }
}

/// Parsed page plus its short text summary
#[derive(Debug)]
pub struct Retrieval {
    pub document: PageDocument,
    pub content_summary: String,
}

impl Retrieval {
    pub fn from_markup(markup: impl Into<String>) -> Self {
        let document = PageDocument::parse(markup);
        let content_summary = document.content_summary();
        debug!(
            "Parsed {} byte(s) of markup, summary has {} line(s)",
            document.raw_markup().len(),
            content_summary.lines().count()
        );
        Self { document, content_summary }
    }
}

/// HTTP client shared by classification, static retrieval and enrichment
pub fn build_http_client(config: &HttpConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .user_agent(&config.user_agent)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .context("Failed to create HTTP client")
}

/// GET a page body. Non-success statuses still return the body, the way a
/// browser would still render an error page.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String> {
    debug!("Fetching {}", url);

    let response = client.get(url).send().await
        .map_err(|e| anyhow!("Failed to fetch {}: {}", url, e))?;

    let status = response.status();
    if !status.is_success() {
        warn!("Non-success status {} for {}", status, url);
    }

    response.text().await.map_err(|e| anyhow!("Failed to read response body from {}: {}", url, e))
}

pub struct StaticRetriever {
    client: reqwest::Client,
}

impl StaticRetriever {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn retrieve(&self, url: &str) -> Result<Retrieval> {
        let markup = fetch_page(&self.client, url).await?;
        Ok(Retrieval::from_markup(markup))
    }
}

pub struct DynamicRetriever {
    launcher: Arc<dyn BrowserLauncher>,
    settle_delay: Duration,
}

impl DynamicRetriever {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, settle_delay: Duration) -> Self {
        Self { launcher, settle_delay }
    }

    /// Render `url` in a fresh browser session. The browser API is blocking,
    /// so the whole session runs on the blocking pool.
    pub async fn retrieve(&self, url: &str) -> Result<Retrieval> {
        let launcher = Arc::clone(&self.launcher);
        let url = url.to_string();
        let settle_delay = self.settle_delay;

        let markup = tokio::task::spawn_blocking(move || render_page(launcher.as_ref(), &url, settle_delay))
            .await
            .map_err(|e| anyhow!("Browser task failed: {}", e))??;

        Ok(Retrieval::from_markup(markup))
    }
}

/// The session is dropped (and the browser terminated) when this returns,
/// whether or not any step failed.
fn render_page(launcher: &dyn BrowserLauncher, url: &str, settle_delay: Duration) -> Result<String> {
    let mut session = launcher.launch()?;
    session.navigate(url)?;

    debug!("Waiting {:?} for {} to render", settle_delay, url);
    std::thread::sleep(settle_delay);

    session.rendered_markup()
}

/// Dispatches to the retriever matching a [`Strategy`]
pub struct Retriever {
    static_retriever: StaticRetriever,
    dynamic_retriever: DynamicRetriever,
}

impl Retriever {
    pub fn new(static_retriever: StaticRetriever, dynamic_retriever: DynamicRetriever) -> Self {
        Self { static_retriever, dynamic_retriever }
    }

    pub fn from_config(config: &AppConfig, client: reqwest::Client, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self::new(
            StaticRetriever::new(client),
            DynamicRetriever::new(launcher, Duration::from_secs(config.browser.settle_delay_secs)),
        )
    }

    pub async fn retrieve(&self, strategy: Strategy, url: &str) -> Result<Retrieval> {
        match strategy {
            Strategy::Static => self.static_retriever.retrieve(url).await,
            Strategy::Dynamic => self.dynamic_retriever.retrieve(url).await,
        }
    }
}
