//! Movie record model
//!
//! A [`MovieRecord`] is created by list-page extraction, enriched once by
//! detail-page extraction, and then handed read-only to the sinks.

mod normalize;

pub use normalize::{coerce_metascore, coerce_rating, coerce_year, duration_to_minutes};

/// Sentinel used for required text fields that could not be extracted
pub const NOT_AVAILABLE: &str = "N/A";

/// One row per title
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord {
    /// Display title, `"N/A"` when absent
    pub title: String,
    pub original_title: Option<String>,
    /// Release year as text, `"N/A"` when absent
    pub year: String,
    /// Aggregate rating as text, `"N/A"` when absent
    pub rating: String,
    pub duration_minutes: Option<u32>,
    pub metascore: Option<String>,
    pub description: Option<String>,
    pub genres: Vec<String>,
    /// Absolute detail page URL; `None` means the detail stage is skipped
    pub detail_url: Option<String>,
    /// Billed cast in billing order
    pub actors: Vec<String>,
}

impl MovieRecord {
    /// Creates a record with every optional field empty
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            original_title: None,
            year: NOT_AVAILABLE.to_string(),
            rating: NOT_AVAILABLE.to_string(),
            duration_minutes: None,
            metascore: None,
            description: None,
            genres: Vec::new(),
            detail_url: None,
            actors: Vec::new(),
        }
    }

    /// Applies the detail-page fields to this record
    pub fn enrich(&mut self, details: DetailFields) {
        self.metascore = details.metascore;
        self.actors = details.actors;
    }
}

/// Fields only available on a title's detail page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailFields {
    pub metascore: Option<String>,
    pub actors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_uses_sentinels() {
        let record = MovieRecord::new("Heat");
        assert_eq!(record.year, "N/A");
        assert_eq!(record.rating, "N/A");
        assert!(record.actors.is_empty());
        assert!(record.detail_url.is_none());
    }

    #[test]
    fn test_enrich_sets_detail_fields() {
        let mut record = MovieRecord::new("Heat");
        record.enrich(DetailFields {
            metascore: Some("76".to_string()),
            actors: vec!["Al Pacino".to_string(), "Robert De Niro".to_string()],
        });

        assert_eq!(record.metascore.as_deref(), Some("76"));
        assert_eq!(record.actors, vec!["Al Pacino", "Robert De Niro"]);
        assert_eq!(record.title, "Heat");
    }
}
