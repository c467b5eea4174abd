use clap::{Parser, Subcommand};
use kamatama_dict::model::{KanjiCharacter, PhraseEntry};
use kamatama_dict::{Dictionary, DictionaryConfig, IngestionStatus};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Offline Japanese-English dictionary.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file, overriding the configuration
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "summary")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the dictionary database
    Init,
    /// Load any corpus that is not yet installed
    Ingest {
        /// Character corpus file or URL
        #[arg(long)]
        characters: Option<String>,
        /// Phrase corpus file or URL
        #[arg(long)]
        phrases: Option<String>,
    },
    /// Search phrases by kana, romaji or kanji
    Search {
        query: String,
    },
    /// Find kanji by reading
    Kanji {
        reading: String,
    },
    /// Find kanji carrying every given radical
    Radicals {
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Show one phrase entry
    Entry {
        sequence_number: i64,
    },
    /// Show installation state and record counts
    Status,
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Full,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "full" => Ok(OutputFormat::Full),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[derive(Serialize)]
struct StatusOutput {
    ingestion: IngestionStatus,
    store: kamatama_dict::storage::StoreStatistics,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn load_config(args: &Args) -> anyhow::Result<DictionaryConfig> {
    let mut config = match &args.config {
        Some(path) => DictionaryConfig::from_file(path)?,
        None => DictionaryConfig::default(),
    };
    if let Some(database) = &args.database {
        config = config.with_database_path(database);
    }
    Ok(config)
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = load_config(&args)?;

    if let Commands::Ingest {
        characters,
        phrases,
    } = &args.command
    {
        if let Some(location) = characters {
            config = config.with_character_location(location);
        }
        if let Some(location) = phrases {
            config = config.with_phrase_location(location);
        }
    }

    let dictionary = Dictionary::open(config).await?;
    let result = execute(&dictionary, &args).await;
    dictionary.close().await;
    result
}

async fn execute(dictionary: &Dictionary, args: &Args) -> anyhow::Result<()> {
    let format = &args.format;
    match &args.command {
        Commands::Init => {
            println!(
                "Initialized dictionary database at {}",
                dictionary.config().database_path.display()
            );
        }
        Commands::Ingest { .. } => {
            let last_percent = AtomicU64::new(u64::MAX);
            let total = dictionary.config().expected_characters
                + dictionary.config().expected_phrases;
            let report = dictionary
                .ingest_with_progress(|progress| {
                    let percent = progress * 100 / total.max(1);
                    if last_percent.swap(percent, Ordering::Relaxed) != percent {
                        eprintln!("Loading: {progress}/{total} ({percent}%)");
                    }
                })
                .await?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                _ => {
                    for corpus in [&report.characters, &report.phrases] {
                        match corpus.loaded {
                            Some(loaded) => {
                                println!("Loaded {loaded} {} records", corpus.corpus)
                            }
                            None => println!(
                                "Skipped {} corpus ({} records already installed)",
                                corpus.corpus, corpus.present
                            ),
                        }
                    }
                    println!("Finished in {}s", report.elapsed().num_seconds());
                }
            }
        }
        Commands::Search { query } => {
            warn_if_not_ready(dictionary);
            dictionary.set_query(query.as_str()).await;
            let state = dictionary.snapshot();
            print_phrases(&state.results, format)?;
            if *format != OutputFormat::Json && !state.kanji_results.is_empty() {
                println!();
                print_characters(&state.kanji_results, format)?;
            }
        }
        Commands::Kanji { reading } => {
            warn_if_not_ready(dictionary);
            dictionary.set_query(reading.as_str()).await;
            print_characters(&dictionary.snapshot().kanji_results, format)?;
        }
        Commands::Radicals { codes } => {
            warn_if_not_ready(dictionary);
            for code in codes {
                dictionary.toggle_radical_query(code).await;
            }
            print_characters(&dictionary.snapshot().radical_results, format)?;
        }
        Commands::Entry { sequence_number } => {
            dictionary.set_current_entry(Some(*sequence_number)).await;
            match dictionary.snapshot().current_entry {
                Some(entry) => print_phrases(&[entry], format)?,
                None => anyhow::bail!("No entry with sequence number {sequence_number}"),
            }
        }
        Commands::Status => {
            let output = StatusOutput {
                ingestion: dictionary.ingestion_status().borrow().clone(),
                store: dictionary.statistics().await?,
            };
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
                _ => {
                    println!("Corpora: {}", output.ingestion);
                    println!(
                        "Database: {}",
                        output.store.database_path.as_deref().unwrap_or("(memory)")
                    );
                    println!("Schema version: {}", output.store.schema_version);
                    for (store, count) in &output.store.counts {
                        println!("  {store}: {count}");
                    }
                    if !output.store.missing_indexes.is_empty() {
                        println!(
                            "Missing indexes: {}",
                            output.store.missing_indexes.join(", ")
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

fn warn_if_not_ready(dictionary: &Dictionary) {
    let status = dictionary.ingestion_status().borrow().clone();
    if !status.is_ready() {
        eprintln!("Warning: dictionary is {status}; run `kamatama ingest` first");
    }
}

fn print_phrases(entries: &[PhraseEntry], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Summary => {
            println!("Found {} entries:", entries.len());
            for entry in entries {
                let written: Vec<&str> = entry.kanji.iter().map(|k| k.value.as_str()).collect();
                let readings: Vec<&str> = entry.reading.iter().map(|r| r.value.as_str()).collect();
                let glosses: Vec<&str> = entry.glosses().take(3).collect();
                println!(
                    "  {} | {} | {} | {}",
                    entry.sequence_number,
                    written.join("、"),
                    readings.join("、"),
                    glosses.join("; ")
                );
            }
        }
        OutputFormat::Full => {
            for entry in entries {
                println!("Entry: {}", entry.sequence_number);
                for kanji in &entry.kanji {
                    println!("  Written: {} {}", kanji.value, kanji.priority.join(" "));
                }
                for reading in &entry.reading {
                    println!("  Reading: {} {}", reading.value, reading.priority.join(" "));
                }
                for (i, sense) in entry.sense.iter().enumerate() {
                    let glosses: Vec<&str> =
                        sense.glossary.iter().map(|g| g.value.as_str()).collect();
                    println!(
                        "  {}. [{}] {}",
                        i + 1,
                        sense.part_of_speech.join(", "),
                        glosses.join("; ")
                    );
                }
                println!("---");
            }
        }
    }
    Ok(())
}

fn print_characters(characters: &[KanjiCharacter], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(characters)?),
        OutputFormat::Summary => {
            println!("Found {} kanji:", characters.len());
            for character in characters {
                let meanings: Vec<&str> = character.meanings().take(3).collect();
                println!("  {} | {}", character.literal, meanings.join("; "));
            }
        }
        OutputFormat::Full => {
            for character in characters {
                println!("Kanji: {}", character.literal);
                let strokes: Vec<String> = character
                    .misc
                    .stroke_count
                    .iter()
                    .map(u32::to_string)
                    .collect();
                println!("  Strokes: {}", strokes.join(", "));
                if let Some(grade) = character.misc.grade {
                    println!("  Grade: {grade}");
                }
                if let Some(jlpt) = character.misc.jlpt {
                    println!("  JLPT: {jlpt}");
                }
                let radicals: Vec<&str> = character.radical_codes().collect();
                println!("  Radicals: {}", radicals.join(", "));
                let meanings: Vec<&str> = character.meanings().collect();
                println!("  Meanings: {}", meanings.join("; "));
                println!("---");
            }
        }
    }
    Ok(())
}
