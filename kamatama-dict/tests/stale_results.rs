//! Lookups that finish after a newer lookup on the same channel must not
//! overwrite its results.

mod common;

use async_trait::async_trait;
use common::{MemorySource, memory_store, sample_config};
use kamatama_dict::Result;
use kamatama_dict::ingestion::BulkLoader;
use kamatama_dict::model::{CharacterQuery, KanjiCharacter, PhraseEntry, PhraseQuery, SequenceNumber};
use kamatama_dict::retrieval::QueryEngine;
use kamatama_dict::storage::{
    CharacterStore, DictionaryStore, IndexedBatch, PhraseIndex, PhraseStore, SqliteDictionaryStore,
    StoreName, StoreStatistics,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Notify;

/// Holds back one particular lookup until released.
struct GatedStore {
    inner: Arc<SqliteDictionaryStore>,
    gated_key: Option<String>,
    gated_entry: Option<SequenceNumber>,
    gated_character: Option<String>,
    entered: Notify,
    release: Notify,
}

impl GatedStore {
    fn new(inner: Arc<SqliteDictionaryStore>) -> Self {
        Self {
            inner,
            gated_key: None,
            gated_entry: None,
            gated_character: None,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    async fn hold(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[async_trait]
impl PhraseStore for GatedStore {
    async fn get_phrase(&self, sequence_number: SequenceNumber) -> Result<Option<PhraseEntry>> {
        if self.gated_entry == Some(sequence_number) {
            self.hold().await;
        }
        self.inner.get_phrase(sequence_number).await
    }

    async fn get_phrase_query(
        &self,
        sequence_number: SequenceNumber,
    ) -> Result<Option<PhraseQuery>> {
        self.inner.get_phrase_query(sequence_number).await
    }

    async fn phrases_with_exact(&self, key: &str) -> Result<Vec<SequenceNumber>> {
        if self.gated_key.as_deref() == Some(key) {
            self.hold().await;
        }
        self.inner.phrases_with_exact(key).await
    }

    async fn phrases_in_range(
        &self,
        index: PhraseIndex,
        lower: &str,
        upper: &str,
        limit: usize,
    ) -> Result<Vec<SequenceNumber>> {
        self.inner.phrases_in_range(index, lower, upper, limit).await
    }
}

#[async_trait]
impl CharacterStore for GatedStore {
    async fn get_character(&self, literal: &str) -> Result<Option<KanjiCharacter>> {
        if self.gated_character.as_deref() == Some(literal) {
            self.hold().await;
        }
        self.inner.get_character(literal).await
    }

    async fn get_character_query(&self, literal: &str) -> Result<Option<CharacterQuery>> {
        self.inner.get_character_query(literal).await
    }

    async fn characters_with_reading(&self, reading: &str) -> Result<Vec<String>> {
        self.inner.characters_with_reading(reading).await
    }

    async fn characters_with_radical(&self, radical: &str) -> Result<Vec<String>> {
        self.inner.characters_with_radical(radical).await
    }
}

#[async_trait]
impl DictionaryStore for GatedStore {
    async fn count(&self, store: StoreName) -> Result<u64> {
        self.inner.count(store).await
    }

    async fn put_batch(&self, batch: IndexedBatch) -> Result<()> {
        self.inner.put_batch(batch).await
    }

    async fn statistics(&self) -> Result<StoreStatistics> {
        self.inner.statistics().await
    }

    async fn close(&self) {
        self.inner.close().await
    }
}

async fn loaded_store() -> Arc<SqliteDictionaryStore> {
    let store = memory_store().await;
    BulkLoader::new(
        store.clone(),
        Arc::new(MemorySource::samples(128)),
        sample_config(),
    )
    .load_if_needed(|_| {})
    .await
    .unwrap();
    store
}

#[tokio::test]
async fn test_slow_query_does_not_overwrite_newer_results() {
    let mut gated = GatedStore::new(loaded_store().await);
    gated.gated_key = Some("たべる".to_string());
    let store = Arc::new(gated);
    let engine = Arc::new(QueryEngine::new(store.clone()));

    let slow = tokio::spawn({
        let engine = engine.clone();
        async move { engine.set_query("taberu").await }
    });
    store.entered.notified().await;

    engine.set_query("tabemono").await;
    let newer = engine.snapshot();
    assert_eq!(newer.query, "tabemono");
    assert_eq!(
        newer.results.iter().map(|e| e.sequence_number).collect::<Vec<_>>(),
        vec![1358300]
    );

    store.release.notify_one();
    slow.await.unwrap();

    let state = engine.snapshot();
    assert_eq!(state, newer);
    assert!(state.kanji_results.is_empty());
}

#[tokio::test]
async fn test_cleared_query_discards_in_flight_lookup() {
    let mut gated = GatedStore::new(loaded_store().await);
    gated.gated_key = Some("いく".to_string());
    let store = Arc::new(gated);
    let engine = Arc::new(QueryEngine::new(store.clone()));

    let slow = tokio::spawn({
        let engine = engine.clone();
        async move { engine.set_query("iku").await }
    });
    store.entered.notified().await;

    engine.set_query("").await;
    store.release.notify_one();
    slow.await.unwrap();

    let state = engine.snapshot();
    assert_eq!(state.query, "");
    assert!(state.results.is_empty());
}

#[tokio::test]
async fn test_slow_entry_does_not_replace_newer_selection() {
    let mut gated = GatedStore::new(loaded_store().await);
    gated.gated_entry = Some(1358280);
    let store = Arc::new(gated);
    let engine = Arc::new(QueryEngine::new(store.clone()));

    let slow = tokio::spawn({
        let engine = engine.clone();
        async move { engine.set_current_entry(Some(1358280)).await }
    });
    store.entered.notified().await;

    engine.set_current_entry(Some(1594600)).await;
    store.release.notify_one();
    slow.await.unwrap();

    let current = engine.snapshot().current_entry.map(|e| e.sequence_number);
    assert_eq!(current, Some(1594600));
}

#[tokio::test]
async fn test_slow_radical_toggle_does_not_overwrite_newer_selection() {
    let mut gated = GatedStore::new(loaded_store().await);
    gated.gated_character = Some("食".to_string());
    let store = Arc::new(gated);
    let engine = Arc::new(QueryEngine::new(store.clone()));

    // resolving 食 for the single-radical result stalls
    let slow = tokio::spawn({
        let engine = engine.clone();
        async move { engine.toggle_radical_query("184").await }
    });
    store.entered.notified().await;

    engine.toggle_radical_query("76").await;
    let newer = engine.snapshot();
    let literals: Vec<&str> = newer.radical_results.iter().map(|c| c.literal.as_str()).collect();
    assert_eq!(literals, vec!["飲"]);
    assert_eq!(
        newer.radical_query,
        BTreeSet::from(["184".to_string(), "76".to_string()])
    );

    store.release.notify_one();
    slow.await.unwrap();
    assert_eq!(engine.snapshot(), newer);
}
