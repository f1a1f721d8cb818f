//! Top-chart list page extraction
//!
//! The chart is read from the structured-data block the page embeds as
//! `<script id="__NEXT_DATA__">`. When enabled, a markup fallback reads the
//! visible list items instead; it is only tried when the structured path
//! yields nothing.

use crate::config::ScraperConfig;
use crate::pages::dom::{select_attr, select_text, static_selector, text_of};
use crate::pages::PageExtractor;
use crate::record::{duration_to_minutes, MovieRecord, NOT_AVAILABLE};
use scraper::{ElementRef, Html};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::Url;

const NEXT_DATA_SELECTOR: &str = "script#__NEXT_DATA__";
const CHART_EDGES_POINTER: &str = "/props/pageProps/pageData/chartTitles/edges";

const LIST_ITEM_SELECTOR: &str = "ul.ipc-metadata-list > li";
const ITEM_TITLE_SELECTOR: &str = "h3.ipc-title__text";
const ITEM_METADATA_SELECTOR: &str = ".cli-title-metadata-item";
const ITEM_RATING_SELECTOR: &str = "span.ipc-rating-star--rating";
const ITEM_LINK_SELECTOR: &str = "a.ipc-title-link-wrapper";

#[derive(Debug, Deserialize)]
struct ChartEdge {
    node: Option<ChartNode>,
}

// Every field is read leniently: a value of the wrong shape becomes `None`
// for that field only and the rest of the node is still used.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ChartNode {
    #[serde(deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    title_text: Option<TextValue>,
    #[serde(deserialize_with = "lenient")]
    original_title_text: Option<TextValue>,
    #[serde(deserialize_with = "lenient")]
    release_year: Option<ReleaseYear>,
    #[serde(deserialize_with = "lenient")]
    ratings_summary: Option<RatingsSummary>,
    #[serde(deserialize_with = "lenient")]
    runtime: Option<Runtime>,
    #[serde(deserialize_with = "lenient")]
    plot: Option<Plot>,
    #[serde(deserialize_with = "lenient")]
    title_genres: Option<TitleGenres>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TextValue {
    #[serde(deserialize_with = "lenient")]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReleaseYear {
    year: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RatingsSummary {
    aggregate_rating: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Runtime {
    seconds: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Plot {
    #[serde(deserialize_with = "lenient")]
    plot_text: Option<PlainText>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PlainText {
    #[serde(deserialize_with = "lenient")]
    plain_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TitleGenres {
    /// Entries are read one by one so a bad entry only drops itself
    #[serde(deserialize_with = "lenient")]
    genres: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenreEntry {
    #[serde(deserialize_with = "lenient")]
    genre: Option<TextValue>,
}

/// Reads any JSON value, keeping it only if it has the expected shape
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Extractor for the top-chart page
#[derive(Debug, Clone)]
pub struct ListPage {
    max_movies: usize,
    base_url: String,
    markup_fallback: bool,
}

impl ListPage {
    /// Creates an extractor capped at `max_movies` records
    pub fn new(max_movies: usize, base_url: impl Into<String>) -> Self {
        Self {
            max_movies,
            base_url: base_url.into(),
            markup_fallback: false,
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(config.max_movies, config.base_url.clone())
            .with_markup_fallback(config.markup_fallback)
    }

    /// Enables the visible-markup fallback
    pub fn with_markup_fallback(mut self, enabled: bool) -> Self {
        self.markup_fallback = enabled;
        self
    }

    /// Reads movies from the embedded structured-data block
    ///
    /// A missing or undeserializable block yields an empty list.
    pub fn extract_structured(&self, document: &Html) -> Vec<MovieRecord> {
        let Some(selector) = static_selector(NEXT_DATA_SELECTOR) else {
            return Vec::new();
        };

        let Some(script) = document.select(&selector).next() else {
            tracing::error!("Structured-data block {} not found", NEXT_DATA_SELECTOR);
            return Vec::new();
        };

        let payload: Value = match serde_json::from_str(&script.text().collect::<String>()) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to parse structured-data block: {}", e);
                return Vec::new();
            }
        };

        let Some(edges) = payload.pointer(CHART_EDGES_POINTER).and_then(Value::as_array) else {
            tracing::error!("No chart entries found in structured-data block");
            return Vec::new();
        };

        tracing::info!("Chart entries found in structured-data block: {}", edges.len());

        edges
            .iter()
            .enumerate()
            .filter_map(|(index, edge)| match ChartEdge::deserialize(edge) {
                Ok(ChartEdge { node: Some(node) }) => Some(self.record_from_node(node)),
                Ok(ChartEdge { node: None }) => None,
                Err(e) => {
                    tracing::warn!("Skipping malformed chart entry {}: {}", index, e);
                    None
                }
            })
            .take(self.max_movies)
            .collect()
    }

    fn record_from_node(&self, node: ChartNode) -> MovieRecord {
        let title = node
            .title_text
            .and_then(|t| t.text)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let mut record = MovieRecord::new(title);

        record.original_title = node.original_title_text.and_then(|t| t.text);
        record.year = node
            .release_year
            .and_then(|r| r.year)
            .and_then(|v| scalar_text(&v))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        record.rating = node
            .ratings_summary
            .and_then(|r| r.aggregate_rating)
            .and_then(|v| scalar_text(&v))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        record.duration_minutes = node
            .runtime
            .and_then(|r| r.seconds)
            .and_then(|v| whole_seconds(&v))
            .filter(|seconds| *seconds > 0)
            .and_then(|seconds| u32::try_from(seconds / 60).ok())
            .filter(|minutes| *minutes > 0);
        record.description = node
            .plot
            .and_then(|p| p.plot_text)
            .and_then(|p| p.plain_text);
        record.genres = node
            .title_genres
            .and_then(|g| g.genres)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| GenreEntry::deserialize(entry).ok())
            .filter_map(|entry| entry.genre.and_then(|g| g.text))
            .filter(|name| !name.is_empty())
            .collect();
        record.detail_url = node
            .id
            .filter(|id| !id.trim().is_empty())
            .map(|id| format!("{}/title/{}/", self.base_url.trim_end_matches('/'), id.trim()));

        record
    }

    /// Reads movies from the visible list markup
    ///
    /// Items without a title heading are skipped.
    pub fn extract_markup(&self, document: &Html) -> Vec<MovieRecord> {
        let (Some(items), Some(title), Some(metadata), Some(rating), Some(link)) = (
            static_selector(LIST_ITEM_SELECTOR),
            static_selector(ITEM_TITLE_SELECTOR),
            static_selector(ITEM_METADATA_SELECTOR),
            static_selector(ITEM_RATING_SELECTOR),
            static_selector(ITEM_LINK_SELECTOR),
        ) else {
            return Vec::new();
        };

        let base = Url::parse(&self.base_url).ok();
        let mut movies = Vec::new();

        for (index, item) in document.select(&items).enumerate() {
            if movies.len() >= self.max_movies {
                break;
            }

            let Some(heading) = select_text(item, &title) else {
                tracing::warn!("Skipping list item {}: no title heading", index);
                continue;
            };

            let mut record = MovieRecord::new(strip_ordinal(&heading));

            let chips: Vec<ElementRef<'_>> = item.select(&metadata).collect();
            if let Some(year) = chips.first().and_then(|chip| text_of(*chip)) {
                record.year = year;
            }
            record.duration_minutes =
                duration_to_minutes(chips.get(1).and_then(|chip| text_of(*chip)).as_deref());

            if let Some(value) = select_text(item, &rating) {
                record.rating = value;
            }

            record.detail_url = select_attr(item, &link, "href").and_then(|href| {
                base.as_ref()
                    .and_then(|base| base.join(&href).ok())
                    .map(|url| url.to_string())
            });

            movies.push(record);
        }

        tracing::info!("Movies found in list markup: {}", movies.len());
        movies
    }
}

impl PageExtractor for ListPage {
    type Output = Vec<MovieRecord>;

    fn extract(&self, document: &Html) -> Vec<MovieRecord> {
        let movies = self.extract_structured(document);
        if !movies.is_empty() || !self.markup_fallback {
            return movies;
        }

        tracing::warn!("Structured data yielded no movies, falling back to list markup");
        self.extract_markup(document)
    }
}

/// Renders a JSON scalar as text (`1994`, `8.4`, `"2001"`)
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    }
}

/// Reads a runtime in seconds, accepting integral or floating-point JSON
fn whole_seconds(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|seconds| seconds.is_finite() && *seconds >= 0.0 && *seconds < u64::MAX as f64)
            .map(|seconds| seconds as u64)
    })
}

/// Removes a leading `"<ordinal>."` from a chart heading
fn strip_ordinal(heading: &str) -> String {
    match heading.split_once('.') {
        Some((ordinal, rest))
            if !ordinal.trim().is_empty() && ordinal.trim().chars().all(|c| c.is_ascii_digit()) =>
        {
            rest.trim().to_string()
        }
        _ => heading.trim().to_string(),
    }
}
