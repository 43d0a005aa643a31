//! Knowledge-base enrichment.
//!
//! Looks up the company's page on the knowledge base (Wikipedia by default)
//! and lifts the label/value rows of its infobox. A missing page, a page
//! without an infobox and a failed request all produce an empty record;
//! callers cannot and need not tell them apart.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{Html, Selector};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::config::EnrichmentConfig;
use crate::domain_utils;
use crate::html::normalized_text;
use crate::retriever::fetch_page;

static INFOBOX_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table.infobox").unwrap()
});

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").unwrap()
});

static LABEL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("th").unwrap()
});

static VALUE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("td").unwrap()
});

/// Label → value facts, kept in first-seen label order.
/// Re-inserting a label replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentRecord {
    entries: Vec<(String, String)>,
}

impl EnrichmentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == label) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnrichmentRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = EnrichmentRecord::new();
        for (label, value) in iter {
            record.insert(label, value);
        }
        record
    }
}

impl Serialize for EnrichmentRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

pub struct KnowledgeBase {
    client: reqwest::Client,
    base_url: String,
    key_separator: String,
}

impl KnowledgeBase {
    pub fn new(client: reqwest::Client, config: &EnrichmentConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            key_separator: config.key_separator.clone(),
        }
    }

    /// Knowledge-base page for a company; the key is appended as a single
    /// percent-encoded path segment
    pub fn page_url(&self, company_name: &str) -> Result<Url> {
        let key = domain_utils::canonical_key(company_name, &self.key_separator);
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid knowledge base URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Knowledge base URL cannot take a path: {}", self.base_url))?
            .pop_if_empty()
            .push(&key);
        Ok(url)
    }

    pub async fn lookup(&self, company_name: &str) -> EnrichmentRecord {
        let fetched = match self.page_url(company_name) {
            Ok(url) => fetch_page(&self.client, url.as_str()).await,
            Err(e) => Err(e),
        };
        match fetched {
            Ok(html) => {
                let record = parse_infobox(&html);
                debug!("Knowledge base returned {} fact(s) for {}", record.len(), company_name);
                record
            }
            Err(e) => {
                debug!("Knowledge base lookup failed for {}: {}", company_name, e);
                EnrichmentRecord::new()
            }
        }
    }
}

/// Rows of the first infobox table that have both a header and a data cell
pub fn parse_infobox(html: &str) -> EnrichmentRecord {
    let document = Html::parse_document(html);
    let mut record = EnrichmentRecord::new();

    let Some(infobox) = document.select(&INFOBOX_SELECTOR).next() else {
        return record;
    };

    for row in infobox.select(&ROW_SELECTOR) {
        let label = row.select(&LABEL_SELECTOR).next();
        let value = row.select(&VALUE_SELECTOR).next();
        if let (Some(label), Some(value)) = (label, value) {
            record.insert(normalized_text(label), normalized_text(value));
        }
    }

    record
}
