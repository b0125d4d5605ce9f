pub mod analysis;
pub mod config;
pub mod dataset;
pub mod db;
pub mod importer;
pub mod sequence;
pub mod theory;

/// Application name for XDG paths
pub const APP_NAME: &str = "chordstat";
