//! Title detail page extraction
//!
//! Reads the critic score and the billed cast. Selectors come from the
//! configuration since this markup is the most likely to drift.

use crate::config::{parse_selector, SelectorConfig};
use crate::pages::dom::{select_text, text_of};
use crate::pages::PageExtractor;
use crate::record::DetailFields;
use crate::ConfigError;
use scraper::{Html, Selector};

/// Extractor for a single title's detail page
#[derive(Debug, Clone)]
pub struct DetailPage {
    metascore: Selector,
    cast_list: Selector,
    cast_member: Selector,
    max_actors: usize,
}

impl DetailPage {
    /// Creates an extractor keeping at most `max_actors` cast members
    pub fn new(selectors: &SelectorConfig, max_actors: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            metascore: parse_selector(&selectors.metascore)?,
            cast_list: parse_selector(&selectors.cast_list)?,
            cast_member: parse_selector(&selectors.cast_member)?,
            max_actors,
        })
    }

    /// Trimmed critic score text, `None` when absent
    pub fn metascore(&self, document: &Html) -> Option<String> {
        select_text(document.root_element(), &self.metascore)
    }

    /// Billed cast in document order, capped at `max_actors`
    ///
    /// Names that are empty after trimming are dropped before the cap.
    pub fn actors(&self, document: &Html) -> Vec<String> {
        let Some(container) = document.select(&self.cast_list).next() else {
            tracing::debug!("Cast list container not found");
            return Vec::new();
        };

        container
            .select(&self.cast_member)
            .filter_map(text_of)
            .take(self.max_actors)
            .collect()
    }
}

impl PageExtractor for DetailPage {
    type Output = DetailFields;

    fn extract(&self, document: &Html) -> DetailFields {
        DetailFields {
            metascore: self.metascore(document),
            actors: self.actors(document),
        }
    }
}
