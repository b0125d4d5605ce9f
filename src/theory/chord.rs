use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use super::{ChordQuality, RootNote};

/// Longest quality text kept after the root spelling.
pub const MAX_QUALITY_CHARS: usize = 10;

// Two-letter spellings come before the letter they start with, so "C#m"
// never stops at "C".
static ROOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:C#|C|Db|D#|D|Eb|E|F#|F|Gb|G#|G|Ab|A#|A|Bb|B)").unwrap()
});

/// Split a raw token into `(root spelling, quality text)`.
///
/// Returns `None` when the token doesn't start with a root spelling, which is
/// how lyric words get filtered out. The quality text is whatever follows the
/// root, cut to [`MAX_QUALITY_CHARS`] characters, and may be empty.
pub fn parse_token(token: &str) -> Option<(&str, &str)> {
    let m = ROOT_RE.find(token)?;
    let rest = &token[m.end()..];
    let quality = match rest.char_indices().nth(MAX_QUALITY_CHARS) {
        Some((cut, _)) => &rest[..cut],
        None => rest,
    };
    Some((m.as_str(), quality))
}

/// A chord reduced to root pitch class and quality category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Chord {
    pub root: RootNote,
    pub quality: ChordQuality,
}

impl Chord {
    pub fn new(root: RootNote, quality: ChordQuality) -> Self {
        Self { root, quality }
    }

    /// Persisted `(root_note_id, chord_category)` pair.
    pub fn ids(self) -> (u8, u8) {
        (self.root.id(), self.quality.id())
    }

    pub fn from_ids(root_id: u8, category_id: u8) -> Option<Self> {
        Some(Self {
            root: RootNote::from_id(root_id)?,
            quality: ChordQuality::from_id(i64::from(category_id))?,
        })
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.root, self.quality.suffix())
    }
}
