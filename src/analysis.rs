use std::collections::{BTreeMap, BTreeSet};

use crate::config::ProgressionConfig;
use crate::sequence::{build_sequence, parse_chord_info, QualityCategorizer};
use crate::theory::{detect_progressions, Chord, Progression, ProgressionError};

/// Everything derived from one song's chord text, ready to be stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongAnalysis {
    pub song_id: i64,
    /// Distinct raw quality texts, for the categorization table.
    pub qualities: BTreeSet<String>,
    /// How many times each (root, category) pair occurs.
    pub occurrences: BTreeMap<Chord, u32>,
    /// Repeated motifs in discovery order.
    pub progressions: Vec<Progression>,
    pub chord_count: usize,
    pub unresolved: usize,
}

/// Distinct quality texts in a song. Needs no categorizer, so it can run
/// before the table knows about any of them.
pub fn distinct_qualities(lines: &BTreeMap<u32, String>) -> BTreeSet<String> {
    parse_chord_info(lines)
        .into_iter()
        .map(|(_, quality)| quality.to_string())
        .collect()
}

/// Count (root, category) pairs.
pub fn count_occurrences(chords: &[Chord]) -> BTreeMap<Chord, u32> {
    let mut counts = BTreeMap::new();
    for chord in chords {
        *counts.entry(*chord).or_insert(0) += 1;
    }
    counts
}

/// Run the whole pipeline for one song: parse, resolve, categorize, count,
/// detect progressions.
pub fn analyze_song<C>(
    song_id: i64,
    lines: &BTreeMap<u32, String>,
    categorizer: &C,
    bounds: &ProgressionConfig,
) -> Result<SongAnalysis, ProgressionError>
where
    C: QualityCategorizer + ?Sized,
{
    let seq = build_sequence(lines, categorizer);
    let progressions = detect_progressions(&seq.chords, bounds.min_len, bounds.max_len)?;

    if seq.unresolved > 0 {
        log::debug!("Song {song_id}: {} unresolved chord tokens", seq.unresolved);
    }
    log::trace!(
        "Song {song_id}: {} chords, {} progressions",
        seq.chords.len(),
        progressions.len()
    );

    Ok(SongAnalysis {
        song_id,
        qualities: distinct_qualities(lines),
        occurrences: count_occurrences(&seq.chords),
        progressions,
        chord_count: seq.chords.len(),
        unresolved: seq.unresolved,
    })
}
