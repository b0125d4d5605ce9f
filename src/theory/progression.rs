use std::fmt;

use super::{Chord, ProgressionError};

pub const DEFAULT_MIN_LEN: usize = 2;
pub const DEFAULT_MAX_LEN: usize = 8;

/// A run of chords that was played twice back to back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Progression {
    chords: Vec<Chord>,
}

impl Progression {
    pub fn new(chords: Vec<Chord>) -> Self {
        Self { chords }
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    /// Canonical ordered `(root_note_id, chord_category)` pairs.
    pub fn ids(&self) -> Vec<(u8, u8)> {
        self.chords.iter().map(|c| c.ids()).collect()
    }
}

impl fmt::Display for Progression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chord) in self.chords.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{chord}")?;
        }
        Ok(())
    }
}

/// Detection needs `min_len >= 1` and `max_len > min_len`.
pub fn check_bounds(min_len: usize, max_len: usize) -> Result<(), ProgressionError> {
    if min_len < 1 || max_len <= min_len {
        return Err(ProgressionError::InvalidBounds { min_len, max_len });
    }
    Ok(())
}

/// True if `chords[at..at+len]` is immediately followed by an identical copy.
/// Caller guarantees `at + 2 * len <= chords.len()`.
fn repeats_at(chords: &[Chord], at: usize, len: usize) -> bool {
    chords[at..at + len] == chords[at + len..at + 2 * len]
}

/// Find immediately repeated chord motifs of length `min_len..max_len`.
///
/// Lengths are scanned shortest first and each length left to right. A
/// window that repeats and isn't already in the result is accepted and the
/// cursor jumps past both copies; otherwise the cursor moves by one. The
/// result is in discovery order and holds no two equal progressions.
pub fn detect_progressions(
    chords: &[Chord],
    min_len: usize,
    max_len: usize,
) -> Result<Vec<Progression>, ProgressionError> {
    check_bounds(min_len, max_len)?;

    let n = chords.len();
    let mut found: Vec<Progression> = Vec::new();

    for len in min_len..max_len {
        let mut i = 0;
        while i + 2 * len <= n {
            if repeats_at(chords, i, len) {
                let window = &chords[i..i + len];
                if !found.iter().any(|p| p.chords() == window) {
                    found.push(Progression::new(window.to_vec()));
                    i += 2 * len;
                    continue;
                }
            }
            i += 1;
        }
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::{ChordQuality, RootNote};

    fn maj(root: RootNote) -> Chord {
        Chord::new(root, ChordQuality::Major)
    }

    fn min(root: RootNote) -> Chord {
        Chord::new(root, ChordQuality::Minor)
    }

    fn detect(chords: &[Chord]) -> Vec<Progression> {
        detect_progressions(chords, DEFAULT_MIN_LEN, DEFAULT_MAX_LEN).unwrap()
    }

    fn prog(chords: &[Chord]) -> Progression {
        Progression::new(chords.to_vec())
    }

    #[test]
    fn test_simple_doubling() {
        let (a, b) = (maj(RootNote::C), maj(RootNote::G));
        assert_eq!(detect(&[a, b, a, b]), vec![prog(&[a, b])]);
    }

    #[test]
    fn test_third_repetition_not_reported() {
        let (a, b) = (maj(RootNote::C), min(RootNote::A));
        assert_eq!(detect(&[a, b, a, b, a, b]), vec![prog(&[a, b])]);
    }

    #[test]
    fn test_fourfold_repeat() {
        // At length 2 the post-skip window is a duplicate and is rejected;
        // the length-4 pass then sees [a b a b] doubled, which is new content.
        let (a, b) = (maj(RootNote::F), maj(RootNote::G));
        assert_eq!(
            detect(&[a, b, a, b, a, b, a, b]),
            vec![prog(&[a, b]), prog(&[a, b, a, b])]
        );
    }

    #[test]
    fn test_short_sequences_are_empty() {
        let a = maj(RootNote::C);
        assert!(detect(&[]).is_empty());
        assert!(detect(&[a]).is_empty());
        assert!(detect(&[a, a]).is_empty());
        assert!(detect(&[a, a, a]).is_empty());
    }

    #[test]
    fn test_no_repeats() {
        let seq = [maj(RootNote::C), maj(RootNote::D), maj(RootNote::E), maj(RootNote::F)];
        assert!(detect(&seq).is_empty());
    }

    #[test]
    fn test_same_chord_four_times() {
        let a = maj(RootNote::E);
        assert_eq!(detect(&[a, a, a, a]), vec![prog(&[a, a])]);
    }

    #[test]
    fn test_quality_matters() {
        let seq = [
            maj(RootNote::A), maj(RootNote::D),
            min(RootNote::A), maj(RootNote::D),
        ];
        assert!(detect(&seq).is_empty());
    }

    #[test]
    fn test_enharmonic_roots_repeat() {
        let cs = Chord::new(RootNote::from_spelling("C#").unwrap(), ChordQuality::Minor);
        let db = Chord::new(RootNote::from_spelling("Db").unwrap(), ChordQuality::Minor);
        let e = maj(RootNote::E);
        assert_eq!(detect(&[cs, e, db, e]), vec![prog(&[cs, e])]);
    }

    #[test]
    fn test_shorter_length_reported_first() {
        let (a, b) = (maj(RootNote::C), maj(RootNote::G));
        let x = min(RootNote::E);
        let seq = [x, a, b, a, b, a, b, a, b];
        let found = detect(&seq);
        assert_eq!(found[0], prog(&[a, b]));
        assert!(found.iter().skip(1).all(|p| p.len() > 2));
    }

    #[test]
    fn test_longer_motif_found_when_no_short_one() {
        let (a, b, c) = (maj(RootNote::C), min(RootNote::A), maj(RootNote::F));
        let g = maj(RootNote::G);
        let seq = [a, b, c, g, a, b, c, g];
        assert_eq!(detect(&seq), vec![prog(&[a, b, c, g])]);
    }

    #[test]
    fn test_discovery_order_by_length_then_offset() {
        let (a, b, c) = (maj(RootNote::C), maj(RootNote::G), min(RootNote::A));
        let (d, e, f) = (maj(RootNote::F), maj(RootNote::D), maj(RootNote::E));
        // length-3 motif first in the song, length-2 motifs later
        let seq = [c, d, e, c, d, e, a, b, a, b, f, e, f, e];
        assert_eq!(
            detect(&seq),
            vec![prog(&[a, b]), prog(&[f, e]), prog(&[c, d, e])]
        );
    }

    #[test]
    fn test_duplicate_at_later_offset_rejected() {
        let (a, b, x) = (maj(RootNote::C), maj(RootNote::G), min(RootNote::B));
        let seq = [a, b, a, b, x, a, b, a, b];
        assert_eq!(detect(&seq), vec![prog(&[a, b])]);
    }

    #[test]
    fn test_accepted_windows_do_not_overlap() {
        // Length 1 only: accept at 0, jump to 2, then the rest are duplicates.
        let a = maj(RootNote::A);
        let found = detect_progressions(&[a, a, a, a, a], 1, 2).unwrap();
        assert_eq!(found, vec![prog(&[a])]);
    }

    #[test]
    fn test_max_len_is_exclusive() {
        let (a, b, c) = (maj(RootNote::C), maj(RootNote::G), min(RootNote::A));
        let seq = [a, b, c, a, b, c];
        assert!(detect_progressions(&seq, 2, 3).unwrap().is_empty());
        assert_eq!(detect_progressions(&seq, 2, 4).unwrap(), vec![prog(&[a, b, c])]);
    }

    #[test]
    fn test_max_len_eight_covers_length_seven() {
        let notes = [
            RootNote::C, RootNote::D, RootNote::E, RootNote::F,
            RootNote::G, RootNote::A, RootNote::B,
        ];
        let motif: Vec<Chord> = notes.iter().map(|n| maj(*n)).collect();
        let seq: Vec<Chord> = motif.iter().chain(motif.iter()).copied().collect();
        assert_eq!(detect(&seq), vec![Progression::new(motif.clone())]);

        let eight: Vec<Chord> = motif.iter().copied().chain([min(RootNote::C)]).collect();
        let seq: Vec<Chord> = eight.iter().chain(eight.iter()).copied().collect();
        assert!(detect(&seq).is_empty());
    }

    #[test]
    fn test_output_has_no_duplicates() {
        let (a, b, c) = (maj(RootNote::C), maj(RootNote::G), min(RootNote::A));
        let seq = [a, b, a, b, c, a, b, a, b, c, c, a, b, a, b, c, a, b];
        let found = detect(&seq);
        for (i, p) in found.iter().enumerate() {
            for q in &found[i + 1..] {
                assert_ne!(p, q);
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let (a, b, c) = (maj(RootNote::C), maj(RootNote::G), min(RootNote::A));
        let seq = [a, b, c, a, b, c, b, b, a, a, c, b, c, b];
        assert_eq!(detect(&seq), detect(&seq));
    }

    #[test]
    fn test_invalid_bounds() {
        let a = maj(RootNote::C);
        assert!(matches!(
            detect_progressions(&[a], 0, 8),
            Err(ProgressionError::InvalidBounds { min_len: 0, max_len: 8 })
        ));
        assert!(detect_progressions(&[a], 3, 3).is_err());
        assert!(detect_progressions(&[a], 4, 2).is_err());
        assert!(detect_progressions(&[], 1, 2).unwrap().is_empty());
    }

    #[test]
    fn test_display() {
        let p = prog(&[maj(RootNote::C), min(RootNote::A), maj(RootNote::F)]);
        assert_eq!(p.to_string(), "C Am F");
        assert_eq!(p.ids(), vec![(0, 1), (9, 2), (5, 1)]);
    }
}
