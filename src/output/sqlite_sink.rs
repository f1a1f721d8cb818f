//! Embedded SQLite sink
//!
//! Stores movies, deduplicated actors, and the movie/actor relation.
//! Year, rating and metascore keep their extracted text.

use crate::output::csv_sink::LIST_SEPARATOR;
use crate::output::schema::initialize_sqlite_schema;
use crate::output::traits::{Sink, SinkError, SinkResult};
use crate::record::MovieRecord;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;

/// SQLite persistence backend
pub struct SqliteSink {
    conn: Connection,
}

impl std::fmt::Debug for SqliteSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSink")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl SqliteSink {
    /// Opens or creates the database at `path` and its schema
    pub fn open(path: &Path) -> SinkResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        initialize_sqlite_schema(&conn)?;

        tracing::info!("SQLite database initialized: {}", path.display());
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn open_in_memory() -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_sqlite_schema(&conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    fn insert_batch(&mut self, movies: &[MovieRecord]) -> SinkResult<()> {
        let tx = self.conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        for movie in movies {
            tx.execute(
                "INSERT INTO movies (title, original_title, year, rating, duration, metascore,
                 description, genres, detail_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    movie.title,
                    movie.original_title,
                    movie.year,
                    movie.rating,
                    movie.duration_minutes,
                    movie.metascore,
                    movie.description,
                    movie.genres.join(LIST_SEPARATOR),
                    movie.detail_url,
                    now,
                ],
            )?;
            let movie_id = tx.last_insert_rowid();

            for name in movie.actors.iter().filter(|name| !name.is_empty()) {
                let actor_id = get_or_create_actor(&tx, name, &now)?;
                tx.execute(
                    "INSERT OR IGNORE INTO movie_actors (movie_id, actor_id, created_at)
                     VALUES (?1, ?2, ?3)",
                    params![movie_id, actor_id, now],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

/// Returns the id of the actor named `name`, inserting it if needed
fn get_or_create_actor(tx: &Transaction<'_>, name: &str, now: &str) -> SinkResult<i64> {
    let existing: Option<i64> = tx
        .query_row("SELECT id FROM actors WHERE name = ?1", params![name], |row| {
            row.get(0)
        })
        .optional()?;

    if let Some(id) = existing {
        return Ok(id);
    }

    tx.execute(
        "INSERT INTO actors (name, created_at) VALUES (?1, ?2)",
        params![name, now],
    )?;
    Ok(tx.last_insert_rowid())
}

#[async_trait]
impl Sink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn replaces_on_save(&self) -> bool {
        true
    }

    async fn save(&mut self, movies: &[MovieRecord]) -> SinkResult<()> {
        if movies.is_empty() {
            return Err(SinkError::Empty);
        }

        self.insert_batch(movies)?;
        tracing::info!("Saved {} movies to SQLite", movies.len());
        Ok(())
    }

    async fn clear(&mut self) -> SinkResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM movie_actors", [])?;
        tx.execute("DELETE FROM movies", [])?;
        tx.execute("DELETE FROM actors", [])?;
        tx.commit()?;

        tracing::info!("Cleared movies, actors and relations from SQLite");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(title: &str, actors: &[&str]) -> MovieRecord {
        let mut movie = MovieRecord::new(title);
        movie.year = "1994".to_string();
        movie.rating = "8.9".to_string();
        movie.actors = actors.iter().map(|a| a.to_string()).collect();
        movie
    }

    fn count(sink: &SqliteSink, table: &str) -> i64 {
        sink.connection()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_deduplicates_actors() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        sink.save(&[
            movie("Pulp Fiction", &["John Travolta", "Uma Thurman"]),
            movie("Get Shorty", &["John Travolta", "Gene Hackman"]),
        ])
        .await
        .unwrap();

        assert_eq!(count(&sink, "movies"), 2);
        assert_eq!(count(&sink, "actors"), 3);
        assert_eq!(count(&sink, "movie_actors"), 4);
    }

    #[tokio::test]
    async fn test_duplicate_actor_in_one_movie_ignored() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        sink.save(&[movie("Dr. Strangelove", &["Peter Sellers", "Peter Sellers"])])
            .await
            .unwrap();

        assert_eq!(count(&sink, "actors"), 1);
        assert_eq!(count(&sink, "movie_actors"), 1);
    }

    #[tokio::test]
    async fn test_text_fields_kept_verbatim() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        let mut record = movie("Unrated", &[]);
        record.year = "N/A".to_string();
        record.metascore = Some("tbd".to_string());
        sink.save(&[record]).await.unwrap();

        let (year, metascore): (String, String) = sink
            .connection()
            .query_row("SELECT year, metascore FROM movies", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(year, "N/A");
        assert_eq!(metascore, "tbd");
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        sink.save(&[movie("Heat", &["Al Pacino"])]).await.unwrap();

        sink.clear().await.unwrap();

        assert_eq!(count(&sink, "movies"), 0);
        assert_eq!(count(&sink, "actors"), 0);
        assert_eq!(count(&sink, "movie_actors"), 0);
    }

    #[tokio::test]
    async fn test_save_empty_batch_rejected() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        assert!(matches!(sink.save(&[]).await, Err(SinkError::Empty)));
    }

    #[tokio::test]
    async fn test_open_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("data").join("movies.db");

        let mut sink = SqliteSink::open(&path).unwrap();
        sink.save(&[movie("Heat", &[])]).await.unwrap();

        assert!(path.exists());
    }
}
