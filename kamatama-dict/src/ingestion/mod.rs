//! Corpus ingestion: streaming sources, per-record transforms and the bulk
//! loader that writes both into the store.
//!
//! ```text
//! CorpusSource ──bytes──> extract_records ──batches──> transform ──> put_batch
//! ```
//!
//! Each batch is committed before the next one is pulled, so an interrupted
//! load keeps everything up to its last batch and a later load simply
//! overwrites those records again.

use crate::model::{CharacterQuery, KanjiCharacter, PhraseEntry, PhraseQuery};
use crate::storage::{IndexedBatch, StoreName};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

pub mod indexer;
pub mod loader;
pub mod source;

pub use indexer::{CharacterTransform, phrase_query};
pub use loader::{BulkLoader, CorpusReport, IngestReport};
pub use source::{ByteStream, CorpusSource, FileSource, HttpSource, LocationSource};

/// One of the two distributed corpora.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Corpus {
    Characters,
    Phrases,
}

impl Corpus {
    /// Container holding the source records; its size decides whether the
    /// corpus is installed.
    pub fn primary_store(self) -> StoreName {
        match self {
            Corpus::Characters => StoreName::AllCharacters,
            Corpus::Phrases => StoreName::AllPhrases,
        }
    }

    /// Containers a load of this corpus writes to.
    pub fn stores(self) -> &'static [StoreName] {
        match self {
            Corpus::Characters => &[StoreName::AllCharacters, StoreName::CharacterQueryIndex],
            Corpus::Phrases => &[StoreName::AllPhrases, StoreName::PhraseQueryIndex],
        }
    }
}

impl fmt::Display for Corpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Corpus::Characters => f.write_str("character"),
            Corpus::Phrases => f.write_str("phrase"),
        }
    }
}

/// A record type that can be streamed from a corpus and stored with its
/// derived query record.
pub trait CorpusRecord: DeserializeOwned + Send + 'static {
    type Query: Send;

    const CORPUS: Corpus;

    fn into_batch(records: Vec<(Self, Option<Self::Query>)>) -> IndexedBatch;
}

impl CorpusRecord for PhraseEntry {
    type Query = PhraseQuery;

    const CORPUS: Corpus = Corpus::Phrases;

    fn into_batch(records: Vec<(Self, Option<PhraseQuery>)>) -> IndexedBatch {
        IndexedBatch::Phrases(records)
    }
}

impl CorpusRecord for KanjiCharacter {
    type Query = CharacterQuery;

    const CORPUS: Corpus = Corpus::Characters;

    fn into_batch(records: Vec<(Self, Option<CharacterQuery>)>) -> IndexedBatch {
        IndexedBatch::Characters(records)
    }
}
