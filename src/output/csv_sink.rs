//! Flat-file CSV sink

use crate::output::traits::{Sink, SinkError, SinkResult};
use crate::record::MovieRecord;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Separator for list-valued columns (genres, actors)
pub const LIST_SEPARATOR: &str = "|";

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    title: &'a str,
    original_title: Option<&'a str>,
    year: &'a str,
    rating: &'a str,
    duration: Option<u32>,
    description: Option<&'a str>,
    genres: String,
    detail_url: Option<&'a str>,
    actors: String,
    metascore: Option<&'a str>,
}

impl<'a> From<&'a MovieRecord> for CsvRow<'a> {
    fn from(movie: &'a MovieRecord) -> Self {
        Self {
            title: &movie.title,
            original_title: movie.original_title.as_deref(),
            year: &movie.year,
            rating: &movie.rating,
            duration: movie.duration_minutes,
            description: movie.description.as_deref(),
            genres: movie.genres.join(LIST_SEPARATOR),
            detail_url: movie.detail_url.as_deref(),
            actors: movie.actors.join(LIST_SEPARATOR),
            metascore: movie.metascore.as_deref(),
        }
    }
}

/// Writes the batch as a CSV file, overwriting any previous export
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, movies: &[MovieRecord]) -> SinkResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        for movie in movies {
            writer.serialize(CsvRow::from(movie))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl Sink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn save(&mut self, movies: &[MovieRecord]) -> SinkResult<()> {
        if movies.is_empty() {
            return Err(SinkError::Empty);
        }

        self.write(movies)?;
        tracing::info!("Saved {} movies to {}", movies.len(), self.path.display());
        Ok(())
    }

    async fn clear(&mut self) -> SinkResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Removed {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
