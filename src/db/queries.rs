use std::collections::BTreeMap;

use super::models::{LibraryStats, ProgressionCount};
use super::{Database, DbError, Result};
use crate::dataset::SongRecord;
use crate::sequence::QualityTable;
use crate::theory::{Chord, ChordQuality, Progression};
use rusqlite::{params, OptionalExtension};

impl Database {
    /// Record the song row plus its artist and the artist's genres.
    /// Returns the artist id.
    pub fn record_basic_info(&self, song: &SongRecord) -> Result<i64> {
        // Artists without a Spotify id are keyed by name instead.
        let artist_key = if song.spotify_artist_id.trim().is_empty() {
            format!("name:{}", song.artist_name)
        } else {
            song.spotify_artist_id.clone()
        };

        self.conn.execute(
            "INSERT INTO artists (name, spotify_id) VALUES (?1, ?2)
             ON CONFLICT(spotify_id) DO UPDATE SET name = excluded.name",
            params![song.artist_name, artist_key],
        )?;
        let artist_id: i64 = self.conn.query_row(
            "SELECT id FROM artists WHERE spotify_id = ?1",
            params![artist_key],
            |row| row.get(0),
        )?;

        if !song.genres.is_empty() {
            let mut add_genre = self
                .conn
                .prepare_cached("INSERT OR IGNORE INTO genres (name) VALUES (?1)")?;
            let mut link = self.conn.prepare_cached(
                "INSERT OR IGNORE INTO artist_genres (artist_id, genre_id)
                 SELECT ?1, id FROM genres WHERE name = ?2",
            )?;
            for genre in &song.genres {
                add_genre.execute(params![genre])?;
                link.execute(params![artist_id, genre])?;
            }
        }

        self.conn.execute(
            "INSERT INTO songs (id, title, artist_id) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                artist_id = excluded.artist_id,
                imported_at = datetime('now')",
            params![song.id, song.song_title, artist_id],
        )?;

        Ok(artist_id)
    }

    /// Add quality texts not yet in the table (category defaults to invalid).
    /// Returns how many were new.
    pub fn record_chord_qualities<'a, I>(&self, qualities: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut stmt = self
            .conn
            .prepare_cached("INSERT OR IGNORE INTO chord_qualities (chord_quality) VALUES (?1)")?;
        let mut added = 0;
        for quality in qualities {
            added += stmt.execute(params![quality])?;
        }
        Ok(added)
    }

    /// Snapshot of the whole quality → category table.
    pub fn load_quality_table(&self) -> Result<QualityTable> {
        let mut stmt = self
            .conn
            .prepare("SELECT chord_quality, chord_category FROM chord_qualities")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(quality, category)| {
                let cat = ChordQuality::from_id(category).unwrap_or_else(|| {
                    log::warn!("Quality {quality:?} has unknown category {category}, treating as invalid");
                    ChordQuality::Invalid
                });
                (quality, cat)
            })
            .collect())
    }

    /// Set the category for a quality text, adding the quality if needed.
    /// Returns the previous category, if the quality was already known.
    pub fn set_quality_category(
        &self,
        quality: &str,
        category: ChordQuality,
    ) -> Result<Option<ChordQuality>> {
        let previous: Option<i64> = self
            .conn
            .query_row(
                "SELECT chord_category FROM chord_qualities WHERE chord_quality = ?1",
                params![quality],
                |row| row.get(0),
            )
            .optional()?;

        self.conn.execute(
            "INSERT INTO chord_qualities (chord_quality, chord_category) VALUES (?1, ?2)
             ON CONFLICT(chord_quality) DO UPDATE SET chord_category = excluded.chord_category",
            params![quality, category.id()],
        )?;

        Ok(previous.map(|id| ChordQuality::from_id(id).unwrap_or_default()))
    }

    /// Quality texts still waiting for a category.
    pub fn uncategorized_qualities(&self, limit: usize) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT chord_quality FROM chord_qualities
             WHERE chord_category = ?1
             ORDER BY id
             LIMIT ?2",
        )?;
        let qualities = stmt
            .query_map(params![ChordQuality::Invalid.id(), limit as i64], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(qualities)
    }

    /// Replace a song's chord occurrence counts.
    pub fn record_chord_occurrences(
        &self,
        song_id: i64,
        occurrences: &BTreeMap<Chord, u32>,
    ) -> Result<()> {
        self.conn
            .execute("DELETE FROM chord_occurrences WHERE song_id = ?1", params![song_id])?;

        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO chord_occurrences (root_note_id, chord_category, song_id, count)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (chord, count) in occurrences {
            let (root, category) = chord.ids();
            stmt.execute(params![root, category, song_id, count])?;
        }
        Ok(())
    }

    /// Link a song to its progressions, storing each distinct progression
    /// once across the whole database. Returns how many progressions were
    /// new to the database.
    pub fn record_progressions(&self, song_id: i64, progressions: &[Progression]) -> Result<usize> {
        self.conn
            .execute("DELETE FROM song_progressions WHERE song_id = ?1", params![song_id])?;

        let mut insert = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO progressions (length, chords) VALUES (?1, ?2)",
        )?;
        let mut lookup = self
            .conn
            .prepare_cached("SELECT id FROM progressions WHERE chords = ?1")?;
        let mut link = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO song_progressions (song_id, progression_id, position)
             VALUES (?1, ?2, ?3)",
        )?;

        let mut added = 0;
        for (position, progression) in progressions.iter().enumerate() {
            let key = serde_json::to_string(&progression.ids())?;
            added += insert.execute(params![progression.len() as i64, key])?;
            let id: i64 = lookup.query_row(params![key], |row| row.get(0))?;
            link.execute(params![song_id, id, position as i64])?;
        }
        Ok(added)
    }

    /// Most widespread progressions by number of songs.
    pub fn top_progressions(&self, limit: usize) -> Result<Vec<ProgressionCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.chords, COUNT(sp.song_id) AS songs
             FROM progressions p
             LEFT JOIN song_progressions sp ON sp.progression_id = p.id
             GROUP BY p.id
             ORDER BY songs DESC, p.length, p.id
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(key, songs)| {
                Ok(ProgressionCount {
                    progression: decode_progression(&key)?,
                    songs,
                })
            })
            .collect()
    }

    /// Get database statistics.
    pub fn stats(&self) -> Result<LibraryStats> {
        let count = |sql: &str| -> Result<i64> {
            Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
        };

        let total_songs = count("SELECT COUNT(*) FROM songs")?;
        let total_artists = count("SELECT COUNT(*) FROM artists")?;
        let total_genres = count("SELECT COUNT(*) FROM genres")?;
        let total_qualities = count("SELECT COUNT(*) FROM chord_qualities")?;
        let uncategorized_qualities =
            count("SELECT COUNT(*) FROM chord_qualities WHERE chord_category = 0")?;
        let total_chords = count("SELECT COALESCE(SUM(count), 0) FROM chord_occurrences")?;
        let total_progressions = count("SELECT COUNT(*) FROM progressions")?;

        let mut cat_stmt = self.conn.prepare(
            "SELECT chord_category, SUM(count) FROM chord_occurrences
             GROUP BY chord_category
             ORDER BY SUM(count) DESC",
        )?;
        let categories: Vec<(ChordQuality, i64)> = cat_stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(id, n)| (ChordQuality::from_id(id).unwrap_or_default(), n))
            .collect();

        let mut genre_stmt = self.conn.prepare(
            "SELECT g.name, COUNT(*)
             FROM genres g
             JOIN artist_genres ag ON ag.genre_id = g.id
             GROUP BY g.id
             ORDER BY COUNT(*) DESC, g.name
             LIMIT 20",
        )?;
        let genres: Vec<(String, i64)> = genre_stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(LibraryStats {
            total_songs,
            total_artists,
            total_genres,
            total_qualities,
            uncategorized_qualities,
            total_chords,
            total_progressions,
            categories,
            genres,
        })
    }
}

fn decode_progression(key: &str) -> Result<Progression> {
    let ids: Vec<(u8, u8)> = serde_json::from_str(key)?;
    let chords = ids
        .into_iter()
        .map(|(root, category)| {
            Chord::from_ids(root, category)
                .ok_or_else(|| DbError::Corrupt(format!("bad chord ({root}, {category}) in {key}")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Progression::new(chords))
}
