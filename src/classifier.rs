//! Notice page classification
//!
//! Notice pages are printable abstracts laid out as label/value table cells.
//! A field's value is the first element that follows its label in document
//! order, which tolerates the portal's inconsistent markup around the labels.

use crate::config::{ClassifierConfig, compile_pattern};
use crate::error::Result;
use crate::types::Classification;
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use std::sync::LazyLock;

// Infallible literal patterns
#[allow(clippy::unwrap_used)]
static TITLE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Project\s*Title").unwrap());
#[allow(clippy::unwrap_used)]
static CATEGORY_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Category").unwrap());

/// Title and category values read from a notice page
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoticeFields {
    /// `Some` when a title label exists; the value may be empty
    pub title: Option<String>,
    /// `Some` when a category label exists; the value may be empty
    pub category: Option<String>,
}

impl NoticeFields {
    /// Locate the title and category fields in a parsed page
    pub fn extract(document: &Html) -> Self {
        Self {
            title: labelled_value(document, &TITLE_LABEL),
            category: labelled_value(document, &CATEGORY_LABEL),
        }
    }

    /// Whether the page is a real notice rather than an empty placeholder
    pub fn is_notice(&self) -> bool {
        self.title.is_some() || self.category.is_some()
    }
}

/// Decides whether a notice is worth capturing
#[derive(Clone, Debug)]
pub struct NoticeClassifier {
    title_re: Regex,
    category_prefix: String,
}

impl NoticeClassifier {
    /// Build a classifier from configuration
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        Ok(Self {
            title_re: compile_pattern("title_pattern", &config.title_pattern)?,
            category_prefix: config.category_prefix.to_lowercase(),
        })
    }

    /// Classify a parsed notice page
    pub fn classify(&self, document: &Html) -> Classification {
        self.classify_fields(&NoticeFields::extract(document))
    }

    /// Classify already extracted fields
    pub fn classify_fields(&self, fields: &NoticeFields) -> Classification {
        if !fields.is_notice() {
            return Classification::Invalid;
        }

        let category_match = fields
            .category
            .as_deref()
            .is_some_and(|c| c.to_lowercase().starts_with(&self.category_prefix));
        let title_match = fields
            .title
            .as_deref()
            .is_some_and(|t| self.title_re.is_match(t));

        if category_match || title_match {
            Classification::ValidRelevant
        } else {
            Classification::ValidIrrelevant
        }
    }
}

/// Text of the first element after the first text node matching `label`
///
/// Returns `None` only when no text node matches the label. A label with no
/// following element yields an empty value.
fn labelled_value(document: &Html, label: &Regex) -> Option<String> {
    let mut nodes = document.tree.root().descendants();

    nodes
        .by_ref()
        .find(|node| matches!(node.value(), Node::Text(text) if label.is_match(text)))?;

    let value = nodes
        .filter_map(ElementRef::wrap)
        .next()
        .map(|el| collapse_text(el.text()))
        .unwrap_or_default();
    Some(value)
}

/// Join text segments with all whitespace runs collapsed to single spaces
fn collapse_text<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    segments
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
