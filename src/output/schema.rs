//! Database schema definitions
//!
//! This module contains the SQL schemas for the embedded (SQLite) and
//! relational (MySQL) sinks. Both use the same three tables.

/// SQLite schema; numeric-looking fields are stored as text
pub const SQLITE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS movies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    original_title TEXT,
    year TEXT,
    rating TEXT,
    duration INTEGER,
    metascore TEXT,
    description TEXT,
    genres TEXT,
    detail_url TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS actors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS movie_actors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_id INTEGER NOT NULL REFERENCES movies(id),
    actor_id INTEGER NOT NULL REFERENCES actors(id),
    created_at TEXT NOT NULL,
    UNIQUE(movie_id, actor_id)
);

CREATE INDEX IF NOT EXISTS idx_movie_actors_movie ON movie_actors(movie_id);
CREATE INDEX IF NOT EXISTS idx_movie_actors_actor ON movie_actors(actor_id);
"#;

/// MySQL schema; numeric fields are coerced before insert
pub const MYSQL_SCHEMA_SQL: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS movies (
        id INT AUTO_INCREMENT PRIMARY KEY,
        title VARCHAR(512) NOT NULL,
        year INT NULL,
        rating DOUBLE NULL,
        duration INT NULL,
        metascore INT NULL,
        detail_url VARCHAR(1024) NULL,
        created_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS actors (
        id INT AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(255) NOT NULL UNIQUE,
        created_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS movie_actors (
        id INT AUTO_INCREMENT PRIMARY KEY,
        movies_id INT NOT NULL,
        actors_id INT NOT NULL,
        created_at DATETIME NOT NULL,
        UNIQUE KEY uq_movie_actor (movies_id, actors_id),
        FOREIGN KEY (movies_id) REFERENCES movies(id),
        FOREIGN KEY (actors_id) REFERENCES actors(id)
    )
    "#,
];

/// Initializes the SQLite schema
pub fn initialize_sqlite_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SQLITE_SCHEMA_SQL)?;
    Ok(())
}
