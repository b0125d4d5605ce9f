use crate::theory::{ChordQuality, Progression};

/// A stored progression and how many songs contain it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionCount {
    pub progression: Progression,
    pub songs: i64,
}

/// Database statistics.
#[derive(Debug)]
pub struct LibraryStats {
    pub total_songs: i64,
    pub total_artists: i64,
    pub total_genres: i64,
    pub total_qualities: i64,
    pub uncategorized_qualities: i64,
    pub total_chords: i64,
    pub total_progressions: i64,
    /// Chord occurrence totals per category, most common first.
    pub categories: Vec<(ChordQuality, i64)>,
    /// Top genres by artist count.
    pub genres: Vec<(String, i64)>,
}
