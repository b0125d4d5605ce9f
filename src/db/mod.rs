pub mod models;
pub mod queries;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Progression encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

const SCHEMA_VERSION: i32 = 1;

pub struct Database {
    pub conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        // WAL: readers don't block on an import's writes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0);

        if version > SCHEMA_VERSION {
            return Err(DbError::Migration(format!(
                "database schema v{version} is newer than this build (v{SCHEMA_VERSION})"
            )));
        }
        if version < 1 {
            self.migrate_v1()?;
        }

        self.conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    /// V1: songs, artist/genre metadata, chord statistics
    fn migrate_v1(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS artists (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                spotify_id  TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS genres (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                name    TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS artist_genres (
                artist_id   INTEGER NOT NULL REFERENCES artists(id) ON DELETE CASCADE,
                genre_id    INTEGER NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
                PRIMARY KEY (artist_id, genre_id)
            );

            -- id is the dataset's song id
            CREATE TABLE IF NOT EXISTS songs (
                id          INTEGER PRIMARY KEY,
                title       TEXT NOT NULL,
                artist_id   INTEGER REFERENCES artists(id) ON DELETE SET NULL,
                imported_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_songs_artist ON songs(artist_id);

            -- Raw quality text -> category, categorized by hand (0 = invalid)
            CREATE TABLE IF NOT EXISTS chord_qualities (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                chord_quality   TEXT NOT NULL UNIQUE,
                chord_category  INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_qualities_category ON chord_qualities(chord_category);

            CREATE TABLE IF NOT EXISTS chord_occurrences (
                root_note_id    INTEGER NOT NULL,
                chord_category  INTEGER NOT NULL,
                song_id         INTEGER NOT NULL,
                count           INTEGER NOT NULL,
                PRIMARY KEY (root_note_id, chord_category, song_id)
            );
            CREATE INDEX IF NOT EXISTS idx_occurrences_song ON chord_occurrences(song_id);

            -- chords: JSON [[root_note_id, chord_category], ...]
            CREATE TABLE IF NOT EXISTS progressions (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                length  INTEGER NOT NULL,
                chords  TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS song_progressions (
                song_id         INTEGER NOT NULL,
                progression_id  INTEGER NOT NULL REFERENCES progressions(id) ON DELETE CASCADE,
                position        INTEGER NOT NULL,
                PRIMARY KEY (song_id, progression_id)
            );
            CREATE INDEX IF NOT EXISTS idx_song_progressions_prog ON song_progressions(progression_id);
            ",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_sets_version() {
        let db = Database::open_in_memory().unwrap();
        let version: i32 = db
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_reopen_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chordstat.db");
        {
            let db = Database::open(&path).unwrap();
            db.conn
                .execute("INSERT INTO chord_qualities (chord_quality) VALUES ('m7')", [])
                .unwrap();
        }
        let db = Database::open(&path).unwrap();
        let count: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM chord_qualities", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1).unwrap();
        }
        assert!(matches!(Database::open(&path), Err(DbError::Migration(_))));
    }
}
