//! Relational MySQL sink
//!
//! Numeric columns are filled through the record coercions; text that
//! does not coerce is stored as NULL.

use crate::output::schema::MYSQL_SCHEMA_SQL;
use crate::output::traits::{Sink, SinkError, SinkResult};
use crate::record::{coerce_metascore, coerce_rating, coerce_year, MovieRecord};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::{MySql, Transaction};

/// Column values for one `movies` row after coercion
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MovieRow<'a> {
    pub title: &'a str,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub duration: Option<u32>,
    pub metascore: Option<i32>,
    pub detail_url: Option<&'a str>,
}

impl<'a> From<&'a MovieRecord> for MovieRow<'a> {
    fn from(movie: &'a MovieRecord) -> Self {
        Self {
            title: movie.title.trim(),
            year: coerce_year(&movie.year),
            rating: coerce_rating(&movie.rating),
            duration: movie.duration_minutes,
            metascore: movie.metascore.as_deref().and_then(coerce_metascore),
            detail_url: movie.detail_url.as_deref().filter(|url| !url.is_empty()),
        }
    }
}

/// Distinct non-empty actor names in billing order
pub(crate) fn distinct_actors(actors: &[String]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    actors
        .iter()
        .map(|name| name.as_str())
        .filter(|name| !name.is_empty() && seen.insert(*name))
        .collect()
}

/// MySQL persistence backend
#[derive(Debug, Clone)]
pub struct MySqlSink {
    pool: MySqlPool,
}

impl MySqlSink {
    /// Connects to `url` and creates the tables when missing
    pub async fn connect(url: &str) -> SinkResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await?;

        for statement in MYSQL_SCHEMA_SQL {
            sqlx::query(statement).execute(&pool).await?;
        }

        tracing::info!("Connected to MySQL");
        Ok(Self { pool })
    }

    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn insert_movie(
        tx: &mut Transaction<'static, MySql>,
        movie: &MovieRecord,
        now: NaiveDateTime,
    ) -> SinkResult<()> {
        let row = MovieRow::from(movie);
        let result = sqlx::query(
            "INSERT INTO movies (title, year, rating, duration, metascore, detail_url, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(row.title)
        .bind(row.year)
        .bind(row.rating)
        .bind(row.duration)
        .bind(row.metascore)
        .bind(row.detail_url)
        .bind(now)
        .execute(&mut **tx)
        .await?;
        let movie_id = result.last_insert_id();

        for name in distinct_actors(&movie.actors) {
            let actor_id = Self::get_or_create_actor(tx, name, now).await?;
            sqlx::query(
                "INSERT IGNORE INTO movie_actors (movies_id, actors_id, created_at)
                 VALUES (?, ?, ?)",
            )
            .bind(movie_id)
            .bind(actor_id)
            .bind(now)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn get_or_create_actor(
        tx: &mut Transaction<'static, MySql>,
        name: &str,
        now: NaiveDateTime,
    ) -> SinkResult<u64> {
        let existing: Option<i32> = sqlx::query_scalar("SELECT id FROM actors WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut **tx)
            .await?;

        if let Some(id) = existing {
            return Ok(id as u64);
        }

        let result = sqlx::query("INSERT INTO actors (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(now)
            .execute(&mut **tx)
            .await?;
        Ok(result.last_insert_id())
    }
}

#[async_trait]
impl Sink for MySqlSink {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn replaces_on_save(&self) -> bool {
        true
    }

    async fn save(&mut self, movies: &[MovieRecord]) -> SinkResult<()> {
        if movies.is_empty() {
            return Err(SinkError::Empty);
        }

        let mut tx = self.pool.begin().await?;
        let now = Utc::now().naive_utc();

        for movie in movies {
            Self::insert_movie(&mut tx, movie, now).await?;
        }

        tx.commit().await?;
        tracing::info!("Saved {} movies to MySQL", movies.len());
        Ok(())
    }

    async fn clear(&mut self) -> SinkResult<()> {
        let mut tx = self.pool.begin().await?;
        for table in ["movie_actors", "movies", "actors"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::info!("Cleared movies, actors and relations from MySQL");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_row_coerces_numeric_text() {
        let mut movie = MovieRecord::new("  Alien ");
        movie.year = "1979".to_string();
        movie.rating = "8.5".to_string();
        movie.duration_minutes = Some(117);
        movie.metascore = Some("89".to_string());
        movie.detail_url = Some("https://www.imdb.com/title/tt0078748/".to_string());

        let row = MovieRow::from(&movie);

        assert_eq!(row.title, "Alien");
        assert_eq!(row.year, Some(1979));
        assert_eq!(row.rating, Some(8.5));
        assert_eq!(row.duration, Some(117));
        assert_eq!(row.metascore, Some(89));
        assert_eq!(row.detail_url, Some("https://www.imdb.com/title/tt0078748/"));
    }

    #[test]
    fn test_movie_row_non_numeric_becomes_null() {
        let mut movie = MovieRecord::new("Unknown");
        movie.metascore = Some("tbd".to_string());
        movie.detail_url = Some(String::new());

        let row = MovieRow::from(&movie);

        assert_eq!(row.year, None);
        assert_eq!(row.rating, None);
        assert_eq!(row.metascore, None);
        assert_eq!(row.detail_url, None);
    }

    #[test]
    fn test_distinct_actors_keeps_first_occurrence() {
        let actors = vec![
            "Sigourney Weaver".to_string(),
            String::new(),
            "Tom Skerritt".to_string(),
            "Sigourney Weaver".to_string(),
        ];

        assert_eq!(
            distinct_actors(&actors),
            vec!["Sigourney Weaver", "Tom Skerritt"]
        );
    }
}
