//! Statistics from the embedded database
//!
//! This module reads counts back from the SQLite sink and prints them
//! for the `--stats` command.

use crate::output::sqlite_sink::SqliteSink;
use crate::output::traits::SinkResult;

/// Summary counts of a saved harvest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestStatistics {
    /// Total number of stored movies
    pub movies: u64,

    /// Number of distinct actors
    pub actors: u64,

    /// Number of movie/actor relations
    pub relations: u64,

    /// Movies stored without a critic score
    pub missing_metascore: u64,

    /// Best-rated stored titles, highest first
    pub top_rated: Vec<(String, String)>,
}

fn count(sink: &SqliteSink, sql: &str) -> SinkResult<u64> {
    let value: i64 = sink.connection().query_row(sql, [], |row| row.get(0))?;
    Ok(value.max(0) as u64)
}

/// Loads statistics from the SQLite sink
///
/// # Arguments
///
/// * `sink` - An opened SQLite sink
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(SinkError)` - Failed to query statistics
pub fn load_statistics(sink: &SqliteSink) -> SinkResult<HarvestStatistics> {
    let movies = count(sink, "SELECT COUNT(*) FROM movies")?;
    let actors = count(sink, "SELECT COUNT(*) FROM actors")?;
    let relations = count(sink, "SELECT COUNT(*) FROM movie_actors")?;
    let missing_metascore = count(
        sink,
        "SELECT COUNT(*) FROM movies WHERE metascore IS NULL OR metascore = ''",
    )?;

    // Ratings are stored as text, so sort on the numeric cast and skip "N/A"
    let mut stmt = sink.connection().prepare(
        "SELECT title, rating FROM movies
         WHERE rating GLOB '[0-9]*'
         ORDER BY CAST(rating AS REAL) DESC, id ASC
         LIMIT 5",
    )?;
    let top_rated = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<(String, String)>, _>>()?;

    Ok(HarvestStatistics {
        movies,
        actors,
        relations,
        missing_metascore,
        top_rated,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Movies: {}", stats.movies);
    println!("  Distinct actors: {}", stats.actors);
    println!("  Movie/actor relations: {}", stats.relations);
    println!();

    let with_score = stats.movies.saturating_sub(stats.missing_metascore);
    let coverage = if stats.movies > 0 {
        (with_score as f64 / stats.movies as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Metascore coverage: {}/{} ({:.1}%)",
        with_score, stats.movies, coverage
    );

    if stats.movies > 0 {
        println!(
            "Average billed cast: {:.1}",
            stats.relations as f64 / stats.movies as f64
        );
    }

    if !stats.top_rated.is_empty() {
        println!();
        println!("Top Rated:");
        for (title, rating) in &stats.top_rated {
            println!("  {} ({})", title, rating);
        }
    }
}
