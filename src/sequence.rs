use std::collections::{BTreeMap, HashMap};

use crate::theory::{parse_token, Chord, ChordQuality, RootNote};

/// Maps raw quality text ("m7", "maj7", "sus4") to a category.
///
/// The mapping itself lives in the `chord_qualities` table and is edited by
/// hand; sequence building only consumes it.
pub trait QualityCategorizer {
    fn categorize(&self, quality: &str) -> ChordQuality;
}

impl<F> QualityCategorizer for F
where
    F: Fn(&str) -> ChordQuality,
{
    fn categorize(&self, quality: &str) -> ChordQuality {
        self(quality)
    }
}

/// In-memory snapshot of the quality → category table.
/// Qualities missing from the table are `Invalid`, same as the column default.
#[derive(Debug, Clone, Default)]
pub struct QualityTable {
    categories: HashMap<String, ChordQuality>,
}

impl QualityTable {
    pub fn new(categories: HashMap<String, ChordQuality>) -> Self {
        Self { categories }
    }

    pub fn insert(&mut self, quality: impl Into<String>, category: ChordQuality) {
        self.categories.insert(quality.into(), category);
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl QualityCategorizer for QualityTable {
    fn categorize(&self, quality: &str) -> ChordQuality {
        self.categories.get(quality).copied().unwrap_or_default()
    }
}

impl FromIterator<(String, ChordQuality)> for QualityTable {
    fn from_iter<I: IntoIterator<Item = (String, ChordQuality)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Raw `(root spelling, quality text)` pairs in encounter order: lines by
/// ascending index, tokens left to right. Non-chord tokens are dropped.
pub fn parse_chord_info(lines: &BTreeMap<u32, String>) -> Vec<(&str, &str)> {
    lines
        .values()
        .flat_map(|line| line.split_whitespace())
        .filter_map(parse_token)
        .collect()
}

/// One song's chords in the order they appear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChordSequence {
    pub chords: Vec<Chord>,
    /// Tokens whose root matched the parser but not the resolver.
    pub unresolved: usize,
}

/// Build the song's chord sequence, asking `categorizer` at most once per
/// distinct quality text.
pub fn build_sequence<C>(lines: &BTreeMap<u32, String>, categorizer: &C) -> ChordSequence
where
    C: QualityCategorizer + ?Sized,
{
    let mut categories: HashMap<&str, ChordQuality> = HashMap::new();
    let mut seq = ChordSequence::default();

    for (spelling, quality) in parse_chord_info(lines) {
        let root = match RootNote::from_spelling(spelling) {
            Ok(root) => root,
            Err(e) => {
                log::trace!("Dropping token: {e}");
                seq.unresolved += 1;
                continue;
            }
        };
        let category = *categories
            .entry(quality)
            .or_insert_with(|| categorizer.categorize(quality));
        seq.chords.push(Chord::new(root, category));
    }

    seq
}
