use anyhow::{Context, Result};
use chordstat::analysis::analyze_song;
use chordstat::dataset::RowRange;
use chordstat::importer::{self, ImportOptions};
use chordstat::theory::ChordQuality;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chordstat", version, about = "Chord/lyric dataset importer and chord statistics")]
struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Dataset location and song id range shared by the import commands.
#[derive(clap::Args)]
struct DatasetArgs {
    /// Chords-and-lyrics CSV (defaults to config dataset_path)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// First song id to read
    #[arg(long)]
    start: Option<i64>,

    /// Stop at this song id (exclusive)
    #[arg(long)]
    end: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record chord qualities found in the dataset so they can be categorized
    Qualities {
        #[command(flatten)]
        dataset: DatasetArgs,
    },

    /// Import songs and chord statistics (all kinds if no flag is given)
    Import {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Number of parallel workers (0 = auto-detect from config)
        #[arg(short = 'j', long, default_value = "0")]
        jobs: usize,

        /// Record song title, artist, and genres
        #[arg(long)]
        basic_info: bool,

        /// Record chord occurrence counts
        #[arg(long)]
        occurrences: bool,

        /// Record repeated chord progressions
        #[arg(long)]
        progressions: bool,
    },

    /// Assign a category to a chord quality (e.g. `categorize m7 minor`)
    Categorize {
        /// Quality text as it appears after the root ("" for a bare triad)
        quality: String,

        #[arg(value_enum)]
        category: ChordQuality,
    },

    /// List chord qualities that still need a category
    Uncategorized {
        /// Number of results
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },

    /// Show the progressions shared by the most songs
    Progressions {
        /// Number of results
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Parse a line of chords and show what progression detection finds
    Analyze {
        /// Chord text, e.g. "C G Am F C G Am F"
        text: String,
    },

    /// Show database statistics
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = chordstat::config::AppConfig::load();

    // Resolve database path: CLI > config > XDG default
    let db_path = cli
        .db_path
        .or(config.db_path.clone())
        .unwrap_or_else(chordstat::config::default_db_path);
    log::info!("Database: {}", db_path.display());

    let db = chordstat::db::Database::open(&db_path).context("Failed to open database")?;

    let dataset_path = |args: &DatasetArgs| -> Result<PathBuf> {
        args.csv
            .clone()
            .or(config.dataset_path.clone())
            .context("No dataset given. Pass --csv or set dataset_path in config.")
    };

    match cli.command {
        Commands::Qualities { dataset } => {
            let path = dataset_path(&dataset)?;
            let range = RowRange::new(dataset.start, dataset.end);
            let result = importer::record_qualities(&db, &path, range)
                .context("Quality pass failed")?;
            println!("Songs read:       {}", result.songs);
            println!("Total qualities:  {}", result.seen);
            println!("Qualities added:  {}", result.added);
            if result.errors > 0 {
                println!("Malformed rows:   {}", result.errors);
            }
        }

        Commands::Import {
            dataset,
            jobs,
            basic_info,
            occurrences,
            progressions,
        } => {
            let path = dataset_path(&dataset)?;
            let range = RowRange::new(dataset.start, dataset.end);
            let workers = if jobs > 0 { jobs } else { config.resolve_workers() };
            let options = ImportOptions::from_flags(basic_info, occurrences, progressions);
            let result = importer::import_songs(
                &db,
                &path,
                range,
                options,
                &config.progressions,
                workers,
            )
            .context("Import failed")?;
            println!(
                "Import complete: {} imported, {} failed, {} new progressions, {} unresolved chord tokens",
                result.imported, result.failed, result.progressions_added, result.unresolved_tokens
            );
        }

        Commands::Categorize { quality, category } => {
            let previous = db
                .set_quality_category(&quality, category)
                .context("Failed to update chord quality")?;
            match previous {
                Some(prev) if prev != category => {
                    println!("{quality:?}: {prev} -> {category}")
                }
                Some(_) => println!("{quality:?} is already {category}"),
                None => println!("{quality:?}: added as {category}"),
            }
        }

        Commands::Uncategorized { limit } => {
            let qualities = db
                .uncategorized_qualities(limit)
                .context("Failed to list chord qualities")?;
            if qualities.is_empty() {
                println!("All chord qualities are categorized.");
            }
            for q in qualities {
                println!("{q:?}");
            }
        }

        Commands::Progressions { limit } => {
            let top = db.top_progressions(limit).context("Failed to list progressions")?;
            if top.is_empty() {
                println!("No progressions recorded yet.");
                return Ok(());
            }
            println!("{:>6}  {:>3}  Progression", "Songs", "Len");
            println!("{}", "-".repeat(40));
            for p in &top {
                println!("{:>6}  {:>3}  {}", p.songs, p.progression.len(), p.progression);
            }
        }

        Commands::Analyze { text } => {
            let table = db.load_quality_table().context("Failed to load chord qualities")?;
            let lines = BTreeMap::from([(0, text)]);
            let analysis = analyze_song(0, &lines, &table, &config.progressions)
                .context("Invalid progression bounds in config")?;

            println!("Chords ({}):", analysis.chord_count);
            for (chord, count) in &analysis.occurrences {
                println!("  {:<8} {:<11} {}", chord.to_string(), chord.quality.to_string(), count);
            }
            if analysis.unresolved > 0 {
                println!("Unresolved tokens: {}", analysis.unresolved);
            }
            println!();
            if analysis.progressions.is_empty() {
                println!("No repeated progressions.");
            } else {
                println!("Progressions:");
                for p in &analysis.progressions {
                    println!("  {p}");
                }
            }
        }

        Commands::Stats => {
            let stats = db.stats().context("Failed to get stats")?;
            println!("Chord Statistics");
            println!("================");
            println!("Songs:            {}", stats.total_songs);
            println!("Artists:          {}", stats.total_artists);
            println!("Genres:           {}", stats.total_genres);
            println!(
                "Chord qualities:  {} ({} uncategorized)",
                stats.total_qualities, stats.uncategorized_qualities
            );
            println!("Chords counted:   {}", stats.total_chords);
            println!("Progressions:     {}", stats.total_progressions);
            println!();

            if !stats.categories.is_empty() {
                println!("Categories:");
                for (category, count) in &stats.categories {
                    println!("  {:<12} {}", category.to_string(), count);
                }
                println!();
            }

            if !stats.genres.is_empty() {
                println!("Genres (by artists):");
                for (genre, count) in &stats.genres {
                    println!("  {:<30} {}", genre, count);
                }
            }
        }
    }

    Ok(())
}
