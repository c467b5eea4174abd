use super::indexer::{CharacterTransform, phrase_query};
use super::source::CorpusSource;
use super::{Corpus, CorpusRecord};
use crate::config::DictionaryConfig;
use crate::error::{DictError, Result};
use crate::model::{KanjiCharacter, PhraseEntry};
use crate::storage::DictionaryStore;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use kamatama_stream::extract_records;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info};

/// Outcome of one corpus within [`BulkLoader::load_if_needed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusReport {
    pub corpus: Corpus,
    /// Records present before loading
    pub present: u64,
    pub expected: u64,
    /// Records streamed in, `None` when the corpus was already installed
    pub loaded: Option<u64>,
}

impl CorpusReport {
    pub fn skipped(&self) -> bool {
        self.loaded.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub characters: CorpusReport,
    pub phrases: CorpusReport,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl IngestReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Streams corpora into the store, one transaction per batch.
#[derive(Clone)]
pub struct BulkLoader {
    store: Arc<dyn DictionaryStore>,
    source: Arc<dyn CorpusSource>,
    config: DictionaryConfig,
}

impl BulkLoader {
    pub fn new(
        store: Arc<dyn DictionaryStore>,
        source: Arc<dyn CorpusSource>,
        config: DictionaryConfig,
    ) -> Self {
        Self {
            store,
            source,
            config,
        }
    }

    /// Stream every record at `location` into the store.
    ///
    /// Each batch is transformed, written and committed before the next one is
    /// pulled; `on_progress` then receives the running record count. Empty
    /// batches open no transaction. On a stream or database failure the
    /// batches already committed stay in place.
    pub async fn load<R, F, P>(&self, location: &str, transform: F, mut on_progress: P) -> Result<u64>
    where
        R: CorpusRecord,
        F: Fn(&R) -> Option<R::Query>,
        P: FnMut(u64),
    {
        info!(
            "Loading {} corpus from {} into {:?}",
            R::CORPUS,
            location,
            R::CORPUS.stores()
        );
        let chunks = self.source.open(location).await?;
        let mut batches = Box::pin(extract_records::<R, _, _, _>(chunks));

        let mut count = 0u64;
        while let Some(batch) = batches.next().await {
            let records = batch.map_err(|e| DictError::stream(R::CORPUS, e))?;
            if records.is_empty() {
                continue;
            }

            let indexed: Vec<(R, Option<R::Query>)> = records
                .into_iter()
                .map(|record| {
                    let query = transform(&record);
                    (record, query)
                })
                .collect();
            let size = indexed.len() as u64;
            self.store.put_batch(R::into_batch(indexed)).await?;

            count += size;
            debug!("Committed {} {} records ({} total)", size, R::CORPUS, count);
            on_progress(count);
        }

        info!("Loaded {} {} records", count, R::CORPUS);
        Ok(count)
    }

    /// Load each corpus whose primary store holds fewer records than
    /// expected, both concurrently.
    ///
    /// `on_progress` receives the combined count: a skipped corpus contributes
    /// what is already present, each corpus is capped at its expected total,
    /// and the value never decreases.
    pub async fn load_if_needed<P>(&self, on_progress: P) -> Result<IngestReport>
    where
        P: Fn(u64),
    {
        let started_at = Utc::now();
        let characters = self.corpus_state(Corpus::Characters).await?;
        let phrases = self.corpus_state(Corpus::Phrases).await?;

        let emit = || {
            on_progress(
                characters.progress.load(Ordering::SeqCst) + phrases.progress.load(Ordering::SeqCst),
            )
        };
        emit();

        let transform = CharacterTransform::new(self.config.include_name_readings);
        let load_characters = async {
            if characters.installed() {
                info!("Character corpus already installed ({} records)", characters.present);
                return Ok(None);
            }
            self.load::<KanjiCharacter, _, _>(
                self.config.location(Corpus::Characters),
                |character| transform.apply(character),
                |count| {
                    characters.advance(count);
                    emit();
                },
            )
            .await
            .map(Some)
        };
        let load_phrases = async {
            if phrases.installed() {
                info!("Phrase corpus already installed ({} records)", phrases.present);
                return Ok(None);
            }
            self.load::<PhraseEntry, _, _>(
                self.config.location(Corpus::Phrases),
                phrase_query,
                |count| {
                    phrases.advance(count);
                    emit();
                },
            )
            .await
            .map(Some)
        };

        let (loaded_characters, loaded_phrases) = futures::join!(load_characters, load_phrases);
        for (corpus, result) in [
            (Corpus::Characters, &loaded_characters),
            (Corpus::Phrases, &loaded_phrases),
        ] {
            if let Err(e) = result {
                error!("Failed to load {} corpus: {}", corpus, e);
            }
        }

        Ok(IngestReport {
            characters: characters.report(loaded_characters?),
            phrases: phrases.report(loaded_phrases?),
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn corpus_state(&self, corpus: Corpus) -> Result<CorpusState> {
        let present = self.store.count(corpus.primary_store()).await?;
        let expected = self.config.expected_total(corpus);
        Ok(CorpusState {
            corpus,
            present,
            expected,
            progress: AtomicU64::new(present.min(expected)),
        })
    }
}

/// Per-corpus bookkeeping for a combined load.
struct CorpusState {
    corpus: Corpus,
    present: u64,
    expected: u64,
    progress: AtomicU64,
}

impl CorpusState {
    fn installed(&self) -> bool {
        self.present >= self.expected
    }

    /// Reloads overwrite from the start of the corpus, so only counts above
    /// the current value move progress.
    fn advance(&self, count: u64) {
        self.progress
            .fetch_max(count.min(self.expected), Ordering::SeqCst);
    }

    fn report(&self, loaded: Option<u64>) -> CorpusReport {
        CorpusReport {
            corpus: self.corpus,
            present: self.present,
            expected: self.expected,
            loaded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::ByteStream;
    use crate::storage::{SqliteDictionaryStore, StoreName};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves fixed bodies split into `chunk_size` pieces.
    struct StaticSource {
        bodies: HashMap<String, Vec<u8>>,
        chunk_size: usize,
    }

    #[async_trait]
    impl CorpusSource for StaticSource {
        async fn open(&self, location: &str) -> Result<ByteStream> {
            let body = self
                .bodies
                .get(location)
                .cloned()
                .ok_or_else(|| DictError::unavailable(location, "no such corpus"))?;
            let chunks: Vec<std::io::Result<Bytes>> = body
                .chunks(self.chunk_size)
                .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
                .collect();
            Ok(futures::stream::iter(chunks).boxed())
        }
    }

    fn phrases_json(count: i64) -> Vec<u8> {
        let entries: Vec<serde_json::Value> = (1..=count)
            .map(|i| {
                serde_json::json!({
                    "sequenceNumber": i,
                    "reading": [{"value": format!("よみ{i}")}],
                    "sense": [{"glossary": [{"value": format!("gloss {i}")}]}]
                })
            })
            .collect();
        serde_json::to_vec(&entries).unwrap()
    }

    async fn loader(chunk_size: usize) -> (BulkLoader, Arc<SqliteDictionaryStore>) {
        let store = Arc::new(SqliteDictionaryStore::open_memory().await.unwrap());
        let bodies = HashMap::from([
            ("phrases".to_string(), phrases_json(12)),
            (
                "characters".to_string(),
                r#"[{"literal":"食","readingMeaning":[{"reading":[{"type":"ja_on","value":"ショク"}]}]}]"#
                    .as_bytes()
                    .to_vec(),
            ),
        ]);
        let config = DictionaryConfig::default()
            .with_phrase_location("phrases")
            .with_character_location("characters")
            .with_expected_totals(1, 12);
        let loader = BulkLoader::new(
            store.clone(),
            Arc::new(StaticSource { bodies, chunk_size }),
            config,
        );
        (loader, store)
    }

    #[tokio::test]
    async fn test_load_reports_running_count() -> anyhow::Result<()> {
        let (loader, store) = loader(64).await;
        let mut seen = Vec::new();
        let count = loader
            .load::<PhraseEntry, _, _>("phrases", phrase_query, |n| seen.push(n))
            .await?;

        assert_eq!(count, 12);
        assert_eq!(seen.last(), Some(&12));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(store.count(StoreName::AllPhrases).await?, 12);
        assert_eq!(store.count(StoreName::PhraseQueryIndex).await?, 12);
        Ok(())
    }

    #[tokio::test]
    async fn test_unavailable_location() {
        let (loader, _store) = loader(64).await;
        let result = loader
            .load::<PhraseEntry, _, _>("missing", phrase_query, |_| {})
            .await;
        assert!(matches!(result, Err(DictError::StreamUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_load_if_needed_skips_installed_corpora() -> anyhow::Result<()> {
        let (loader, _store) = loader(50).await;
        let first = loader.load_if_needed(|_| {}).await?;
        assert_eq!(first.characters.loaded, Some(1));
        assert_eq!(first.phrases.loaded, Some(12));

        let progress = Mutex::new(Vec::new());
        let second = loader
            .load_if_needed(|n| progress.lock().unwrap().push(n))
            .await?;
        assert!(second.characters.skipped());
        assert!(second.phrases.skipped());
        assert_eq!(second.phrases.present, 12);
        assert_eq!(*progress.lock().unwrap(), vec![13]);
        Ok(())
    }
}
