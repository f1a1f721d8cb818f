//! Null-safe access to a parsed document
//!
//! Every accessor returns `None` (or an empty list) when the element is
//! missing or has no text, so extractors never fail on absent markup.

use scraper::{ElementRef, Selector};

/// Trimmed text content of an element, `None` when empty
pub fn text_of(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Text of the first element matching `selector` under `scope`
pub fn select_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().and_then(text_of)
}

/// Attribute of the first element matching `selector` under `scope`
pub fn select_attr(scope: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Parses a selector that is known at compile time
///
/// Returns `None` (and logs) rather than panicking if it does not parse.
pub fn static_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::error!("Invalid selector {}: {:?}", css, e);
            None
        }
    }
}
