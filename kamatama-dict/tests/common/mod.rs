#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use kamatama_dict::ingestion::{ByteStream, CorpusSource};
use kamatama_dict::storage::SqliteDictionaryStore;
use kamatama_dict::{DictError, Dictionary, DictionaryConfig};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

pub const CHARACTERS: &str = "memory://kanjidic2.json";
pub const PHRASES: &str = "memory://JMdict.json";

/// Serves in-memory corpora cut into fixed-size chunks.
pub struct MemorySource {
    bodies: HashMap<String, Vec<u8>>,
    chunk_size: usize,
}

impl MemorySource {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            bodies: HashMap::new(),
            chunk_size,
        }
    }

    pub fn with_body(mut self, location: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(location.to_string(), body);
        self
    }

    /// Both sample corpora at their usual locations.
    pub fn samples(chunk_size: usize) -> Self {
        Self::new(chunk_size)
            .with_body(CHARACTERS, serde_json::to_vec_pretty(&sample_characters()).unwrap())
            .with_body(PHRASES, serde_json::to_vec_pretty(&sample_phrases()).unwrap())
    }
}

#[async_trait]
impl CorpusSource for MemorySource {
    async fn open(&self, location: &str) -> kamatama_dict::Result<ByteStream> {
        let body = self
            .bodies
            .get(location)
            .cloned()
            .ok_or_else(|| DictError::unavailable(location, "not found"))?;
        let chunks: Vec<std::io::Result<Bytes>> = body
            .chunks(self.chunk_size)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        Ok(futures::stream::iter(chunks).boxed())
    }
}

pub fn sample_phrases() -> Value {
    json!([
        {
            "sequenceNumber": 1358280,
            "kanji": [{"value": "食べる", "priority": ["ichi1", "news1"]}, {"value": "喰べる"}],
            "reading": [{"value": "たべる", "priority": ["ichi1"]}],
            "sense": [
                {"partOfSpeech": ["v1", "vt"], "glossary": [{"value": "to eat"}]},
                {"partOfSpeech": ["v1"], "glossary": [{"value": "to live on (e.g. a salary)"}]}
            ]
        },
        {
            "sequenceNumber": 1358300,
            "kanji": [{"value": "食べ物"}],
            "reading": [{"value": "たべもの"}],
            "sense": [{"partOfSpeech": ["n"], "glossary": [{"value": "food"}]}]
        },
        {
            "sequenceNumber": 1594600,
            "kanji": [{"value": "調べる"}],
            "reading": [{"value": "しらべる"}],
            "sense": [{"partOfSpeech": ["v1"], "glossary": [{"value": "to examine"}, {"value": "to investigate"}]}]
        },
        {
            "sequenceNumber": 1038410,
            "kanji": [{"value": "珈琲"}],
            "reading": [{"value": "コーヒー"}],
            "sense": [{"partOfSpeech": ["n"], "glossary": [{"value": "coffee"}],
                       "sourceLanguage": [{"language": "dut", "value": "koffie"}]}]
        },
        {
            "sequenceNumber": 1578850,
            "kanji": [{"value": "行く"}],
            "reading": [{"value": "いく"}, {"value": "ゆく"}],
            "sense": [{"partOfSpeech": ["v5k-s"], "glossary": [{"value": "to go"}]}]
        }
    ])
}

pub fn sample_characters() -> Value {
    json!([
        {
            "literal": "食",
            "radical": [{"type": "classical", "value": "184"}],
            "misc": {"grade": 2, "strokeCount": [9], "jlpt": 4},
            "readingMeaning": [
                {"reading": [{"type": "ja_on", "value": "ショク"}, {"type": "ja_kun", "value": "た.べる"},
                             {"type": "ja_kun", "value": "く.う"}],
                 "meaning": [{"value": "eat"}, {"value": "food"}]},
                {"value": "あき"}
            ]
        },
        {
            "literal": "飲",
            "radical": [{"type": "classical", "value": "184"}, {"type": "classical", "value": "76"}],
            "readingMeaning": [
                {"reading": [{"type": "ja_on", "value": "イン"}, {"type": "ja_kun", "value": "の.む"}],
                 "meaninig": [{"value": "drink"}]}
            ]
        },
        {
            "literal": "欠",
            "radical": [{"type": "classical", "value": "76"}],
            "readingMeaning": [
                {"reading": [{"type": "ja_on", "value": "ケツ"}, {"type": "ja_kun", "value": "か.ける"}],
                 "meaning": [{"value": "lack"}]}
            ]
        },
        {
            "literal": "調",
            "radical": [{"type": "classical", "value": "149"}],
            "readingMeaning": [
                {"reading": [{"type": "ja_on", "value": "チョウ"}, {"type": "ja_kun", "value": "しら.べる"}],
                 "meaning": [{"value": "investigate"}]}
            ]
        },
        {
            "literal": "行",
            "radical": [{"type": "classical", "value": "144"}],
            "readingMeaning": [
                {"reading": [{"type": "ja_on", "value": "コウ"}, {"type": "ja_kun", "value": "い.く"},
                             {"type": "ja_kun", "value": "ゆ.く"}],
                 "meaning": [{"value": "going"}]}
            ]
        }
    ])
}

pub fn sample_config() -> DictionaryConfig {
    DictionaryConfig::new("unused.db")
        .with_character_location(CHARACTERS)
        .with_phrase_location(PHRASES)
        .with_expected_totals(5, 5)
}

pub async fn memory_store() -> Arc<SqliteDictionaryStore> {
    Arc::new(SqliteDictionaryStore::open_memory().await.unwrap())
}

/// A dictionary over a fresh in-memory store, not yet ingested.
pub async fn memory_dictionary(chunk_size: usize) -> (Dictionary, Arc<SqliteDictionaryStore>) {
    let store = memory_store().await;
    let dictionary = Dictionary::with_parts(
        store.clone(),
        Arc::new(MemorySource::samples(chunk_size)),
        sample_config(),
    )
    .await
    .unwrap();
    (dictionary, store)
}
