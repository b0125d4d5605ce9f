use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use thiserror::Error;

use crate::analysis::{analyze_song, distinct_qualities, SongAnalysis};
use crate::config::ProgressionConfig;
use crate::dataset::{DatasetError, RowRange, SongReader, SongRecord};
use crate::db::Database;
use crate::theory::ProgressionError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),
    #[error("Database error: {0}")]
    Db(#[from] crate::db::DbError),
    #[error("Configuration error: {0}")]
    Config(#[from] ProgressionError),
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, ImportError>;

/// Which statistics the import pass records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportOptions {
    /// Song title, artist, genres.
    pub basic_info: bool,
    /// (root, category) counts per song.
    pub occurrences: bool,
    pub progressions: bool,
}

impl ImportOptions {
    pub fn all() -> Self {
        Self {
            basic_info: true,
            occurrences: true,
            progressions: true,
        }
    }

    /// No flags at all means everything.
    pub fn from_flags(basic_info: bool, occurrences: bool, progressions: bool) -> Self {
        if !basic_info && !occurrences && !progressions {
            Self::all()
        } else {
            Self {
                basic_info,
                occurrences,
                progressions,
            }
        }
    }

    fn needs_chords(&self) -> bool {
        self.occurrences || self.progressions
    }
}

pub struct QualityPassResult {
    pub songs: u64,
    /// Sum over songs of each song's distinct qualities.
    pub seen: u64,
    pub added: u64,
    pub errors: u64,
}

pub struct ImportResult {
    pub imported: u64,
    pub failed: u64,
    pub progressions_added: u64,
    pub unresolved_tokens: u64,
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {pos} songs ({per_sec}) {msg}")
            .unwrap(),
    );
    pb.set_message(message);
    pb
}

/// Pull the next row, logging and counting malformed ones. Only I/O
/// failures end the read.
fn next_song<R: std::io::Read>(
    reader: &mut SongReader<R>,
    errors: &mut u64,
) -> Result<Option<SongRecord>> {
    for row in reader.by_ref() {
        match row {
            Ok(song) => return Ok(Some(song)),
            Err(DatasetError::Io(e)) => return Err(DatasetError::Io(e).into()),
            Err(e) => {
                log::warn!("Skipping row: {e}");
                *errors += 1;
            }
        }
    }
    Ok(None)
}

/// Record every quality text in the dataset that the table doesn't know yet,
/// so it can be categorized before the import pass.
pub fn record_qualities(
    db: &Database,
    csv_path: &Path,
    range: RowRange,
) -> Result<QualityPassResult> {
    let mut reader = SongReader::open(csv_path, range)?;
    let mut result = QualityPassResult {
        songs: 0,
        seen: 0,
        added: 0,
        errors: 0,
    };

    let pb = spinner("Collecting chord qualities...");
    let tx = db.conn.unchecked_transaction().map_err(crate::db::DbError::from)?;

    while let Some(song) = next_song(&mut reader, &mut result.errors)? {
        let qualities = distinct_qualities(&song.chords);
        result.seen += qualities.len() as u64;
        result.added += db.record_chord_qualities(qualities.iter().map(String::as_str))? as u64;
        result.songs += 1;
        pb.inc(1);
    }

    tx.commit().map_err(crate::db::DbError::from)?;
    pb.finish_with_message(format!(
        "Done: {} qualities seen, {} new",
        result.seen, result.added
    ));

    Ok(result)
}

/// Import songs: basic info and/or chord statistics, depending on `options`.
///
/// Songs are handled in chunks: the chunk is analysed in parallel, then
/// written in one transaction, so progress is kept if the run dies midway.
pub fn import_songs(
    db: &Database,
    csv_path: &Path,
    range: RowRange,
    options: ImportOptions,
    bounds: &ProgressionConfig,
    jobs: usize,
) -> Result<ImportResult> {
    bounds.validate()?;

    let table = if options.needs_chords() {
        let table = db.load_quality_table()?;
        if table.is_empty() {
            log::warn!("Chord quality table is empty; every chord will be categorized as invalid");
        } else {
            log::info!("Loaded {} chord qualities", table.len());
        }
        table
    } else {
        Default::default()
    };

    let jobs = jobs.max(1);
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    let chunk_size = jobs * 2;
    log::info!("Importing with {jobs} workers");

    let mut reader = SongReader::open(csv_path, range)?;
    let mut result = ImportResult {
        imported: 0,
        failed: 0,
        progressions_added: 0,
        unresolved_tokens: 0,
    };
    let pb = spinner("Importing...");

    loop {
        let mut chunk = Vec::with_capacity(chunk_size);
        while chunk.len() < chunk_size {
            match next_song(&mut reader, &mut result.failed)? {
                Some(song) => chunk.push(song),
                None => break,
            }
        }
        if chunk.is_empty() {
            break;
        }

        let analyses: Vec<Option<std::result::Result<SongAnalysis, ProgressionError>>> =
            pool.install(|| {
                chunk
                    .par_iter()
                    .map(|song| {
                        options
                            .needs_chords()
                            .then(|| analyze_song(song.id, &song.chords, &table, bounds))
                    })
                    .collect()
            });

        let mut tx = db.conn.unchecked_transaction().map_err(crate::db::DbError::from)?;
        for (song, analysis) in chunk.iter().zip(analyses) {
            let analysis = analysis.transpose()?;
            // A song that fails partway leaves nothing behind, not even the
            // removal of its previous rows.
            let mut sp = tx.savepoint().map_err(crate::db::DbError::from)?;
            match store_song(db, song, analysis.as_ref(), options) {
                Ok(added) => {
                    sp.commit().map_err(crate::db::DbError::from)?;
                    result.imported += 1;
                    result.progressions_added += added;
                    if let Some(a) = &analysis {
                        result.unresolved_tokens += a.unresolved as u64;
                    }
                }
                Err(e) => {
                    sp.rollback().map_err(crate::db::DbError::from)?;
                    log::warn!("Failed to store song {}: {}", song.id, e);
                    result.failed += 1;
                }
            }
            pb.inc(1);
        }
        tx.commit().map_err(crate::db::DbError::from)?;
    }

    pb.finish_with_message(format!(
        "Done: {} imported, {} failed",
        result.imported, result.failed
    ));

    Ok(result)
}

/// Write one song. Returns how many progressions were new to the database.
fn store_song(
    db: &Database,
    song: &SongRecord,
    analysis: Option<&SongAnalysis>,
    options: ImportOptions,
) -> std::result::Result<u64, crate::db::DbError> {
    if options.basic_info {
        db.record_basic_info(song)?;
    }
    let Some(analysis) = analysis else {
        return Ok(0);
    };
    if options.occurrences {
        db.record_chord_occurrences(song.id, &analysis.occurrences)?;
    }
    if options.progressions {
        let added = db.record_progressions(song.id, &analysis.progressions)?;
        log::debug!(
            "Song {}: {} progressions ({} new)",
            song.id,
            analysis.progressions.len(),
            added
        );
        return Ok(added as u64);
    }
    Ok(0)
}
