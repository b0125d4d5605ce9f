pub mod literal;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Malformed record at line {line}: {message}")]
    MalformedRecord { line: u64, message: String },
}

pub type Result<T> = std::result::Result<T, DatasetError>;

/// Column order of the chords-and-lyrics CSV.
const COL_ID: usize = 0;
const COL_ARTIST: usize = 1;
const COL_TITLE: usize = 2;
const COL_SPOTIFY_ID: usize = 3;
const COL_GENRES: usize = 4;
const COL_CHORDS: usize = 5;

/// One dataset row.
#[derive(Debug, Clone, PartialEq)]
pub struct SongRecord {
    pub id: i64,
    pub artist_name: String,
    pub song_title: String,
    pub spotify_artist_id: String,
    pub genres: Vec<String>,
    /// Line index → raw chord/lyric text.
    pub chords: BTreeMap<u32, String>,
}

/// Which song ids to read: `start <= id < end`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RowRange {
    pub start: i64,
    pub end: Option<i64>,
}

impl RowRange {
    pub fn new(start: Option<i64>, end: Option<i64>) -> Self {
        Self {
            start: start.unwrap_or(0),
            end,
        }
    }
}

/// Streams [`SongRecord`]s from the dataset CSV (header row skipped).
///
/// Rows are expected in ascending id order: reading stops at the first id
/// at or past `range.end`. A row that doesn't parse is yielded as
/// `MalformedRecord` and reading continues with the next one. A read failure
/// is yielded as `Io` and ends the stream.
pub struct SongReader<R> {
    records: csv::StringRecordsIntoIter<R>,
    range: RowRange,
    done: bool,
}

impl SongReader<File> {
    pub fn open(path: &Path, range: RowRange) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(file, range))
    }
}

impl<R: Read> SongReader<R> {
    pub fn from_reader(reader: R, range: RowRange) -> Self {
        let records = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader)
            .into_records();
        Self {
            records,
            range,
            done: false,
        }
    }
}

impl<R: Read> Iterator for SongReader<R> {
    type Item = Result<SongRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let record = match self.records.next()? {
                Ok(r) => r,
                Err(e) if e.is_io_error() => {
                    self.done = true;
                    return Some(Err(DatasetError::Io(e.into())));
                }
                Err(e) => return Some(Err(e.into())),
            };
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let id = match parse_id(&record, line) {
                Ok(id) => id,
                Err(e) => return Some(Err(e)),
            };
            if self.range.end.is_some_and(|end| id >= end) {
                self.done = true;
                break;
            }
            if id < self.range.start {
                continue;
            }
            return Some(parse_record(id, &record, line));
        }
        None
    }
}

fn malformed(line: u64, message: impl Into<String>) -> DatasetError {
    DatasetError::MalformedRecord {
        line,
        message: message.into(),
    }
}

fn field<'r>(record: &'r csv::StringRecord, index: usize, line: u64) -> Result<&'r str> {
    record
        .get(index)
        .ok_or_else(|| malformed(line, format!("missing column {index}")))
}

fn parse_id(record: &csv::StringRecord, line: u64) -> Result<i64> {
    let raw = field(record, COL_ID, line)?;
    raw.trim()
        .parse()
        .map_err(|_| malformed(line, format!("bad song id {raw:?}")))
}

fn parse_record(id: i64, record: &csv::StringRecord, line: u64) -> Result<SongRecord> {
    let genres = literal::parse_str_list(field(record, COL_GENRES, line)?)
        .map_err(|e| malformed(line, format!("genres: {e}")))?;
    let chords = literal::parse_line_map(field(record, COL_CHORDS, line)?)
        .map_err(|e| malformed(line, format!("chords: {e}")))?;

    Ok(SongRecord {
        id,
        artist_name: field(record, COL_ARTIST, line)?.to_string(),
        song_title: field(record, COL_TITLE, line)?.to_string(),
        spotify_artist_id: field(record, COL_SPOTIFY_ID, line)?.to_string(),
        genres,
        chords,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
,artist_name,song_name,artist_id,genres,chords
0,The Beatles,Let It Be,3WrFJ7ztbogyGnTHbHJFl2,\"['beatlesque', 'rock']\",\"{0: 'C G Am F', 1: 'When I find myself', 2: 'C G F C'}\"
1,Adele,Someone Like You,4dpARuHxo51G3z768sgnrY,\"['pop', 'uk pop']\",\"{0: 'A C#m F#m D'}\"
2,Nobody,Broken,xyz,not a list,\"{}\"
3,Queen,Bohemian Rhapsody,1dfeR4HaWDbWqFHLkxsg1d,['rock'],\"{0: 'Bb Gm Cm F7'}\"
5,Oasis,Wonderwall,2DaxqgrOhkeH0fpeiQq2f4,[],\"{0: 'Em7 G Dsus4 A7sus4'}\"
";

    fn read_all(range: RowRange) -> Vec<Result<SongRecord>> {
        SongReader::from_reader(SAMPLE.as_bytes(), range).collect()
    }

    #[test]
    fn test_reads_all_rows() {
        let rows = read_all(RowRange::default());
        assert_eq!(rows.len(), 5);
        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.id, 0);
        assert_eq!(first.artist_name, "The Beatles");
        assert_eq!(first.song_title, "Let It Be");
        assert_eq!(first.genres, vec!["beatlesque", "rock"]);
        assert_eq!(first.chords[&1], "When I find myself");
    }

    #[test]
    fn test_malformed_row_does_not_stop_reading() {
        let rows = read_all(RowRange::default());
        assert!(matches!(
            rows[2],
            Err(DatasetError::MalformedRecord { line: 4, .. })
        ));
        assert_eq!(rows[3].as_ref().unwrap().song_title, "Bohemian Rhapsody");
    }

    #[test]
    fn test_range_start_and_end() {
        let ids: Vec<i64> = read_all(RowRange::new(Some(1), Some(4)))
            .into_iter()
            .filter_map(|r| r.ok())
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_end_stops_at_first_id_past_range() {
        let rows = read_all(RowRange::new(None, Some(1)));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].as_ref().unwrap().id, 0);
    }

    #[test]
    fn test_open_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("songs.csv");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(SAMPLE.as_bytes())
            .unwrap();

        let songs: Vec<SongRecord> = SongReader::open(&path, RowRange::new(Some(5), None))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].song_title, "Wonderwall");
        assert!(songs[0].genres.is_empty());
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk gone"))
        }
    }

    #[test]
    fn test_read_failure_is_io_error() {
        let rows: Vec<_> = SongReader::from_reader(BrokenReader, RowRange::default()).collect();
        assert_eq!(rows.len(), 1);
        match &rows[0] {
            Err(DatasetError::Io(e)) => assert!(e.to_string().contains("disk gone")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_open_missing_file() {
        let err = SongReader::open(Path::new("/nonexistent/songs.csv"), RowRange::default());
        assert!(matches!(err, Err(DatasetError::Io(_))));
    }
}
