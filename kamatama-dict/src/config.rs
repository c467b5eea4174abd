//! Dictionary configuration, loadable from TOML.
//!
//! ```toml
//! database_path = "data/kamatama.db"
//! character_location = "https://example.org/dict/kanjidic2.json"
//! phrase_location = "dict/JMdict.json"
//! range_limit = 30
//! ```
//!
//! Every key is optional; missing keys take the defaults below.

use crate::error::{DictError, Result};
use crate::ingestion::Corpus;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Number of characters in the distributed KANJIDIC2 corpus.
pub const EXPECTED_CHARACTERS: u64 = 13_108;
/// Number of entries in the distributed JMdict corpus.
pub const EXPECTED_PHRASES: u64 = 190_269;
/// Rows taken from each prefix range scan.
pub const DEFAULT_RANGE_LIMIT: usize = 30;
/// Bytes per read when streaming a corpus from disk.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// File path or http(s) URL of the character corpus
    pub character_location: String,
    /// File path or http(s) URL of the phrase corpus
    pub phrase_location: String,
    /// A corpus with at least this many records is considered installed
    pub expected_characters: u64,
    pub expected_phrases: u64,
    pub range_limit: usize,
    /// Index name-only (nanori) readings of characters
    pub include_name_readings: bool,
    pub chunk_size: usize,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("kamatama.db"),
            character_location: "dict/kanjidic2.json".to_string(),
            phrase_location: "dict/JMdict.json".to_string(),
            expected_characters: EXPECTED_CHARACTERS,
            expected_phrases: EXPECTED_PHRASES,
            range_limit: DEFAULT_RANGE_LIMIT,
            include_name_readings: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl DictionaryConfig {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| DictError::invalid_config(format!("malformed TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    pub fn with_character_location(mut self, location: impl Into<String>) -> Self {
        self.character_location = location.into();
        self
    }

    pub fn with_phrase_location(mut self, location: impl Into<String>) -> Self {
        self.phrase_location = location.into();
        self
    }

    /// Override the record counts that mark each corpus as installed.
    pub fn with_expected_totals(mut self, characters: u64, phrases: u64) -> Self {
        self.expected_characters = characters;
        self.expected_phrases = phrases;
        self
    }

    pub fn with_range_limit(mut self, limit: usize) -> Self {
        self.range_limit = limit;
        self
    }

    pub fn with_name_readings(mut self, include: bool) -> Self {
        self.include_name_readings = include;
        self
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.range_limit == 0 {
            return Err(DictError::invalid_config("range_limit must be positive"));
        }
        if self.chunk_size == 0 {
            return Err(DictError::invalid_config("chunk_size must be positive"));
        }
        for (name, location) in [
            ("character_location", &self.character_location),
            ("phrase_location", &self.phrase_location),
        ] {
            if location.trim().is_empty() {
                return Err(DictError::invalid_config(format!("{name} is empty")));
            }
        }
        Ok(())
    }

    pub fn location(&self, corpus: Corpus) -> &str {
        match corpus {
            Corpus::Characters => &self.character_location,
            Corpus::Phrases => &self.phrase_location,
        }
    }

    pub fn expected_total(&self, corpus: Corpus) -> u64 {
        match corpus {
            Corpus::Characters => self.expected_characters,
            Corpus::Phrases => self.expected_phrases,
        }
    }
}
