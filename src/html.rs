//! Parsed page representation and the small query surface the extractors need:
//! tag lookup, attribute filtering and whitespace-normalized text.

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Number of paragraphs that make up a content summary
pub const SUMMARY_PARAGRAPHS: usize = 5;

static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("p").unwrap()
});

/// Raw markup together with its parsed tree
#[derive(Debug)]
pub struct PageDocument {
    raw_markup: String,
    tree: Html,
}

impl PageDocument {
    pub fn parse(markup: impl Into<String>) -> Self {
        let raw_markup = markup.into();
        let tree = Html::parse_document(&raw_markup);
        Self { raw_markup, tree }
    }

    pub fn raw_markup(&self) -> &str {
        &self.raw_markup
    }

    /// All matching elements in document order
    pub fn find_all<'a>(&'a self, selector: &'a TagSelector) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.tree.select(selector.selector())
    }

    pub fn find_first<'a>(&'a self, selector: &'a TagSelector) -> Option<ElementRef<'a>> {
        self.find_all(selector).next()
    }

    /// Text of the first five paragraphs, one per line
    pub fn content_summary(&self) -> String {
        self.tree
            .select(&PARAGRAPH_SELECTOR)
            .take(SUMMARY_PARAGRAPHS)
            .map(normalized_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A compiled "one of these tags" query, optionally requiring an attribute
#[derive(Debug, Clone)]
pub struct TagSelector {
    css: String,
    selector: Selector,
}

impl TagSelector {
    pub fn new(tags: &[&str]) -> Result<Self> {
        Self::build(tags, None)
    }

    /// Matches only elements that carry `attribute` (any value)
    pub fn with_attribute(tags: &[&str], attribute: &str) -> Result<Self> {
        Self::build(tags, Some(attribute))
    }

    fn build(tags: &[&str], attribute: Option<&str>) -> Result<Self> {
        if tags.is_empty() {
            return Err(anyhow!("Tag selector needs at least one tag"));
        }
        let css = tags
            .iter()
            .map(|tag| match attribute {
                Some(attr) => format!("{}[{}]", tag, attr),
                None => tag.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let selector = Selector::parse(&css)
            .map_err(|e| anyhow!("Invalid selector '{}': {:?}", css, e))?;
        Ok(Self { css, selector })
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    /// Descendants of `element` (excluding itself) in document order
    pub fn descendants_of<'a>(&'a self, element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        element.select(&self.selector)
    }

    pub fn first_descendant<'a>(&'a self, element: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.descendants_of(element).next()
    }
}

/// Subtree text with leading, trailing and internal whitespace collapsed
pub fn normalized_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive substring test against an attribute value.
/// Missing attributes never match.
pub fn attribute_contains_any(element: ElementRef<'_>, attribute: &str, needles: &[&str]) -> bool {
    match element.value().attr(attribute) {
        Some(value) => {
            let value = value.to_lowercase();
            needles.iter().any(|needle| value.contains(&needle.to_lowercase()))
        }
        None => false,
    }
}
