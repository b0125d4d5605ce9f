pub mod chord;
pub mod progression;
pub mod quality;
pub mod root_note;

pub use chord::{parse_token, Chord};
pub use progression::{detect_progressions, Progression, DEFAULT_MAX_LEN, DEFAULT_MIN_LEN};
pub use quality::ChordQuality;
pub use root_note::RootNote;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum TheoryError {
    #[error("Unknown root note spelling: {0:?}")]
    UnknownSpelling(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum ProgressionError {
    #[error("Invalid progression length bounds: min {min_len}, max {max_len} (need min >= 1 and max > min)")]
    InvalidBounds { min_len: usize, max_len: usize },
}
