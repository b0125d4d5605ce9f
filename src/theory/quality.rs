use std::fmt;

use clap::ValueEnum;

/// Coarse chord quality category. Discriminants are the persisted
/// `chord_category` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, ValueEnum)]
pub enum ChordQuality {
    /// Not a chord (or not categorized yet).
    #[default]
    Invalid = 0,
    /// Includes dominant chords.
    Major = 1,
    Minor = 2,
    /// Sus and power chords.
    Neutral = 3,
    Diminished = 4,
    Augmented = 5,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 6] = [
        Self::Invalid,
        Self::Major,
        Self::Minor,
        Self::Neutral,
        Self::Diminished,
        Self::Augmented,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|q| i64::from(q.id()) == id)
    }

    /// Short suffix used when printing chords ("C", "Am", "Bdim").
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Invalid => "?",
            Self::Major => "",
            Self::Minor => "m",
            Self::Neutral => "5",
            Self::Diminished => "dim",
            Self::Augmented => "aug",
        }
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invalid => "invalid",
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Neutral => "neutral",
            Self::Diminished => "diminished",
            Self::Augmented => "augmented",
        };
        f.write_str(name)
    }
}
