//! Storage abstraction for dictionary records and their search keys
//!
//! The store holds four containers: the two corpora and the query records
//! derived from them. Multi-valued search keys (readings, radicals, exact and
//! partial phrase keys) live in secondary index tables that can be range
//! scanned.
//!
//! ## Architecture
//!
//! ```text
//! PhraseStore ────┐
//!                 ├─ DictionaryStore ── SqliteDictionaryStore
//! CharacterStore ─┘
//! ```
//!
//! Callers hold the store as `Arc<dyn DictionaryStore>`; the loader writes
//! through [`DictionaryStore::put_batch`] and the query engine only reads.

use crate::error::Result;
use crate::model::{CharacterQuery, KanjiCharacter, PhraseEntry, PhraseQuery, SequenceNumber};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub mod schema;
pub mod sqlite_store;

pub use sqlite_store::SqliteDictionaryStore;

/// The four record containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreName {
    AllCharacters,
    CharacterQueryIndex,
    AllPhrases,
    PhraseQueryIndex,
}

impl StoreName {
    pub const ALL: [StoreName; 4] = [
        StoreName::AllCharacters,
        StoreName::CharacterQueryIndex,
        StoreName::AllPhrases,
        StoreName::PhraseQueryIndex,
    ];

    pub fn table(self) -> &'static str {
        match self {
            StoreName::AllCharacters => "all_characters",
            StoreName::CharacterQueryIndex => "character_query_index",
            StoreName::AllPhrases => "all_phrases",
            StoreName::PhraseQueryIndex => "phrase_query_index",
        }
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Which phrase key index a range scan runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseIndex {
    /// Whole normalized forms and readings
    Exact,
    /// Proper suffixes of the exact keys
    Partial,
}

impl PhraseIndex {
    pub fn table(self) -> &'static str {
        match self {
            PhraseIndex::Exact => "phrase_exact",
            PhraseIndex::Partial => "phrase_partial",
        }
    }
}

/// Records to write in one transaction, each paired with its derived query
/// record when the transform produced one.
#[derive(Debug, Clone)]
pub enum IndexedBatch {
    Phrases(Vec<(PhraseEntry, Option<PhraseQuery>)>),
    Characters(Vec<(KanjiCharacter, Option<CharacterQuery>)>),
}

impl IndexedBatch {
    pub fn len(&self) -> usize {
        match self {
            IndexedBatch::Phrases(records) => records.len(),
            IndexedBatch::Characters(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Containers the batch's transaction spans.
    pub fn stores(&self) -> &'static [StoreName] {
        match self {
            IndexedBatch::Phrases(_) => &[StoreName::AllPhrases, StoreName::PhraseQueryIndex],
            IndexedBatch::Characters(_) => {
                &[StoreName::AllCharacters, StoreName::CharacterQueryIndex]
            }
        }
    }
}

/// Record counts and schema details for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatistics {
    pub schema_version: i64,
    pub database_path: Option<String>,
    pub counts: BTreeMap<StoreName, u64>,
    /// Secondary indexes that are missing from the schema
    pub missing_indexes: Vec<String>,
}

/// Phrase record lookups.
#[async_trait]
pub trait PhraseStore: Send + Sync {
    async fn get_phrase(&self, sequence_number: SequenceNumber) -> Result<Option<PhraseEntry>>;

    async fn get_phrase_query(
        &self,
        sequence_number: SequenceNumber,
    ) -> Result<Option<PhraseQuery>>;

    /// Entries with an exact key equal to `key`
    async fn phrases_with_exact(&self, key: &str) -> Result<Vec<SequenceNumber>>;

    /// Entries whose `index` keys fall in `[lower, upper)`, in key order, at
    /// most `limit` index rows.
    async fn phrases_in_range(
        &self,
        index: PhraseIndex,
        lower: &str,
        upper: &str,
        limit: usize,
    ) -> Result<Vec<SequenceNumber>>;
}

/// Kanji character lookups.
#[async_trait]
pub trait CharacterStore: Send + Sync {
    async fn get_character(&self, literal: &str) -> Result<Option<KanjiCharacter>>;

    async fn get_character_query(&self, literal: &str) -> Result<Option<CharacterQuery>>;

    /// Literals with a normalized reading equal to `reading`
    async fn characters_with_reading(&self, reading: &str) -> Result<Vec<String>>;

    /// Literals carrying the radical code `radical`
    async fn characters_with_radical(&self, radical: &str) -> Result<Vec<String>>;
}

/// Full store interface used by the loader and the query engine.
#[async_trait]
pub trait DictionaryStore: PhraseStore + CharacterStore + Send + Sync {
    /// Number of records in one container
    async fn count(&self, store: StoreName) -> Result<u64>;

    /// Upsert every record of the batch and replace its query record and
    /// index entries, in a single transaction.
    async fn put_batch(&self, batch: IndexedBatch) -> Result<()>;

    async fn statistics(&self) -> Result<StoreStatistics>;

    /// Close the underlying connections. The store is unusable afterwards.
    async fn close(&self);
}
