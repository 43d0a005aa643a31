use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

use crate::retriever::{fetch_page, Strategy};

static STATIC_MARKERS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1, p").unwrap()
});

/// Decides between static and dynamic retrieval with one probing fetch
pub struct SiteClassifier {
    client: reqwest::Client,
}

impl SiteClassifier {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Static when the raw response already has a top-level heading or a
    /// paragraph. Any fetch failure falls back to Dynamic, since a browser
    /// render can still see pages the plain fetch could not.
    pub async fn classify(&self, url: &str) -> Strategy {
        match fetch_page(&self.client, url).await {
            Ok(body) if is_static_markup(&body) => Strategy::Static,
            Ok(_) => {
                debug!("No <h1> or <p> in raw response from {} - likely script-rendered", url);
                Strategy::Dynamic
            }
            Err(e) => {
                debug!("Classification fetch failed for {}: {}", url, e);
                Strategy::Dynamic
            }
        }
    }
}

pub fn is_static_markup(markup: &str) -> bool {
    Html::parse_document(markup).select(&STATIC_MARKERS).next().is_some()
}
