//! Heuristic structured-data extraction.
//!
//! Every extractor is a declarative [`ExtractionRule`]: which containers to
//! visit, an optional heading gate that decides whether a container is
//! relevant, which items inside it to collect, an optional filter on those
//! items, and what to capture from each item. The four built-in rules cover
//! services, categories (navigation links), office locations and blog/news
//! post links. Adding a rule never touches the traversal code.

use anyhow::Result;
use scraper::ElementRef;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::html::{attribute_contains_any, normalized_text, PageDocument, TagSelector};

/// Containers are only considered when their first heading mentions a keyword
#[derive(Debug, Clone)]
pub struct HeadingGate {
    pub tags: &'static [&'static str],
    /// Lower-case; matched as substrings of the lower-cased heading text
    pub keywords: &'static [&'static str],
}

#[derive(Debug, Clone)]
pub struct ItemSelector {
    pub tags: &'static [&'static str],
    pub required_attribute: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub enum ItemFilter {
    /// Normalized item text must contain the needle (case-insensitive)
    TextContains(&'static str),
    /// The attribute value must contain one of the needles (case-insensitive)
    AttributeContainsAny {
        attribute: &'static str,
        needles: &'static [&'static str],
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    Text,
    Attribute(&'static str),
}

#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub name: &'static str,
    pub containers: &'static [&'static str],
    pub heading: Option<HeadingGate>,
    pub items: ItemSelector,
    pub filter: Option<ItemFilter>,
    pub capture: Capture,
}

pub const SERVICE_RULE: ExtractionRule = ExtractionRule {
    name: "services",
    containers: &["section", "div", "article", "main", "footer"],
    heading: Some(HeadingGate {
        tags: &["h2", "h3", "h4"],
        keywords: &["service", "solution", "what we do", "offering", "products", "we provide"],
    }),
    items: ItemSelector { tags: &["p", "ul", "li"], required_attribute: None },
    filter: None,
    capture: Capture::Text,
};

pub const LOCATION_RULE: ExtractionRule = ExtractionRule {
    name: "locations",
    containers: &["section", "div"],
    heading: Some(HeadingGate {
        tags: &["h2", "h3", "h4"],
        keywords: &["locations", "contact", "our offices"],
    }),
    items: ItemSelector { tags: &["p", "span"], required_attribute: None },
    filter: Some(ItemFilter::TextContains("address")),
    capture: Capture::Text,
};

pub const CATEGORY_RULE: ExtractionRule = ExtractionRule {
    name: "categories",
    containers: &["nav"],
    heading: None,
    items: ItemSelector { tags: &["a"], required_attribute: Some("href") },
    filter: None,
    capture: Capture::Text,
};

/// The document root is the only container, so every linked anchor is a candidate
pub const POST_RULE: ExtractionRule = ExtractionRule {
    name: "posts",
    containers: &["html"],
    heading: None,
    items: ItemSelector { tags: &["a"], required_attribute: Some("href") },
    filter: Some(ItemFilter::AttributeContainsAny {
        attribute: "href",
        needles: &["/blog", "/news", "/post", "/article"],
    }),
    capture: Capture::Attribute("href"),
};

/// A rule with its selectors compiled once
#[derive(Debug, Clone)]
pub struct Extractor {
    rule: ExtractionRule,
    containers: TagSelector,
    heading: Option<TagSelector>,
    items: TagSelector,
}

impl Extractor {
    pub fn new(rule: ExtractionRule) -> Result<Self> {
        let containers = TagSelector::new(rule.containers)?;
        let heading = match &rule.heading {
            Some(gate) => Some(TagSelector::new(gate.tags)?),
            None => None,
        };
        let items = match rule.items.required_attribute {
            Some(attr) => TagSelector::with_attribute(rule.items.tags, attr)?,
            None => TagSelector::new(rule.items.tags)?,
        };
        Ok(Self { rule, containers, heading, items })
    }

    pub fn name(&self) -> &'static str {
        self.rule.name
    }

    /// Apply the rule, returning captured values in document order
    pub fn extract(&self, document: &PageDocument) -> Vec<String> {
        let mut results = Vec::new();

        for container in document.find_all(&self.containers) {
            if !self.passes_heading_gate(container) {
                continue;
            }
            for item in self.items.descendants_of(container) {
                if let Some(value) = self.capture(item) {
                    results.push(value);
                }
            }
        }

        debug!("Extractor '{}' collected {} item(s)", self.name(), results.len());
        results
    }

    fn passes_heading_gate(&self, container: ElementRef<'_>) -> bool {
        let (Some(gate), Some(selector)) = (&self.rule.heading, &self.heading) else {
            return true;
        };
        match selector.first_descendant(container) {
            Some(heading) => {
                let text = normalized_text(heading).to_lowercase();
                gate.keywords.iter().any(|keyword| text.contains(keyword))
            }
            None => false,
        }
    }

    fn capture(&self, item: ElementRef<'_>) -> Option<String> {
        match &self.rule.filter {
            Some(ItemFilter::TextContains(needle)) => {
                if !normalized_text(item).to_lowercase().contains(&needle.to_lowercase()) {
                    return None;
                }
            }
            Some(ItemFilter::AttributeContainsAny { attribute, needles }) => {
                if !attribute_contains_any(item, attribute, needles) {
                    return None;
                }
            }
            None => {}
        }

        match self.rule.capture {
            Capture::Text => Some(normalized_text(item)),
            Capture::Attribute(attr) => item.value().attr(attr).map(str::to_string),
        }
    }
}

/// Everything the extractors found on one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub services: Vec<String>,
    pub categories: Vec<String>,
    pub locations: Vec<String>,
    /// Deduplicated; iteration order is lexical, not document order
    pub posts: BTreeSet<String>,
}

/// The four built-in extractors
#[derive(Debug, Clone)]
pub struct ExtractorSet {
    services: Extractor,
    categories: Extractor,
    locations: Extractor,
    posts: Extractor,
}

impl ExtractorSet {
    pub fn new() -> Result<Self> {
        Ok(Self {
            services: Extractor::new(SERVICE_RULE)?,
            categories: Extractor::new(CATEGORY_RULE)?,
            locations: Extractor::new(LOCATION_RULE)?,
            posts: Extractor::new(POST_RULE)?,
        })
    }

    pub fn extract_all(&self, document: &PageDocument) -> ExtractionResult {
        ExtractionResult {
            services: self.services.extract(document),
            categories: self.categories.extract(document),
            locations: self.locations.extract(document),
            posts: self.posts.extract(document).into_iter().collect(),
        }
    }
}
