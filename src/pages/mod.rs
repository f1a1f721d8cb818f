//! Page extractors
//!
//! This module turns fetched documents into records:
//! - [`ListPage`] reads the ranked chart into [`MovieRecord`]s
//! - [`DetailPage`] reads critic score and billed cast for one title
//!
//! Extractors never fail. Missing or changed markup yields empty or
//! sentinel values and a log line.
//!
//! [`MovieRecord`]: crate::record::MovieRecord

mod detail;
pub mod dom;
mod list;

pub use detail::DetailPage;
pub use list::ListPage;

use scraper::Html;

/// Turns a parsed document into structured output
pub trait PageExtractor {
    type Output;

    /// Extracts from `document`, tolerating absent or malformed markup
    fn extract(&self, document: &Html) -> Self::Output;
}
