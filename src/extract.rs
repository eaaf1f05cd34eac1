//! Text extraction from rendered markup.
//!
//! Everything here is a pure function of its input: the same markup and
//! selector always give the same text.

use scraper::{ElementRef, Html, Selector};

use crate::utils;

/// Visible text of an element with whitespace collapsed.
pub fn element_text(el: ElementRef<'_>) -> String {
    utils::clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// Text of the first match under `scope`, if it has any text at all.
pub fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

pub fn first_attr_in(doc: &Html, selector: &Selector, attr: &str) -> Option<String> {
    doc.select(selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Text content of every element matching `selector`, in document order.
pub fn extract(doc: &Html, selector: &Selector) -> Vec<String> {
    doc.select(selector).map(element_text).collect()
}
