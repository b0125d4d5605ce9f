use std::fmt;

use super::TheoryError;

/// One of the 12 pitch classes, numbered by semitone distance from C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RootNote {
    C,
    Db,
    D,
    Eb,
    E,
    F,
    Gb,
    G,
    Ab,
    A,
    Bb,
    B,
}

impl RootNote {
    pub const ALL: [RootNote; 12] = [
        Self::C, Self::Db, Self::D, Self::Eb, Self::E, Self::F,
        Self::Gb, Self::G, Self::Ab, Self::A, Self::Bb, Self::B,
    ];

    /// Semitones above C (0-11). This is the persisted `root_note_id`.
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// Resolve one of the 17 accepted spellings. Enharmonic aliases
    /// ("C#" / "Db") resolve to the same note.
    pub fn from_spelling(spelling: &str) -> Result<Self, TheoryError> {
        Self::ALL
            .into_iter()
            .find(|note| note.spellings().contains(&spelling))
            .ok_or_else(|| TheoryError::UnknownSpelling(spelling.to_string()))
    }

    /// Every accepted spelling for this pitch class.
    pub fn spellings(self) -> &'static [&'static str] {
        match self {
            Self::C => &["C"],
            Self::Db => &["Db", "C#"],
            Self::D => &["D"],
            Self::Eb => &["Eb", "D#"],
            Self::E => &["E"],
            Self::F => &["F"],
            Self::Gb => &["Gb", "F#"],
            Self::G => &["G"],
            Self::Ab => &["Ab", "G#"],
            Self::A => &["A"],
            Self::Bb => &["Bb", "A#"],
            Self::B => &["B"],
        }
    }

    /// Display name (first spelling).
    pub fn name(self) -> &'static str {
        self.spellings()[0]
    }
}

impl fmt::Display for RootNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enharmonic_aliases_share_id() {
        assert_eq!(
            RootNote::from_spelling("C#").unwrap(),
            RootNote::from_spelling("Db").unwrap()
        );
        assert_eq!(RootNote::from_spelling("A#").unwrap().id(), 10);
        assert_eq!(RootNote::from_spelling("Bb").unwrap().id(), 10);
        assert_eq!(RootNote::from_spelling("F#").unwrap().id(), 6);
    }

    #[test]
    fn test_distinct_notes_differ() {
        assert_ne!(
            RootNote::from_spelling("C").unwrap(),
            RootNote::from_spelling("Db").unwrap()
        );
    }

    #[test]
    fn test_unknown_spelling() {
        for bad in ["X", "", "c", "Cb", "E#", "H"] {
            match RootNote::from_spelling(bad) {
                Err(TheoryError::UnknownSpelling(s)) => assert_eq!(s, bad),
                other => panic!("expected UnknownSpelling for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_seventeen_spellings() {
        let total: usize = RootNote::ALL.iter().map(|n| n.spellings().len()).sum();
        assert_eq!(total, 17);
    }

    #[test]
    fn test_ids_are_semitones() {
        for (i, note) in RootNote::ALL.iter().enumerate() {
            assert_eq!(note.id() as usize, i);
            assert_eq!(RootNote::from_id(i as u8), Some(*note));
        }
        assert_eq!(RootNote::from_id(12), None);
    }
}
