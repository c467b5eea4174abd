//! The dictionary facade: one store shared by the loader and the query engine.

use crate::config::DictionaryConfig;
use crate::error::Result;
use crate::ingestion::{
    BulkLoader, Corpus, CorpusSource, FileSource, HttpSource, IngestReport, LocationSource,
};
use crate::model::SequenceNumber;
use crate::retrieval::{DictionaryState, QueryEngine, QueryUpdate};
use crate::status::IngestionStatus;
use crate::storage::{DictionaryStore, SqliteDictionaryStore, StoreStatistics};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

pub struct Dictionary {
    store: Arc<dyn DictionaryStore>,
    loader: BulkLoader,
    engine: QueryEngine,
    status: watch::Sender<IngestionStatus>,
    config: DictionaryConfig,
}

impl Dictionary {
    /// Open the on-disk store named by `config` and read corpora from its
    /// configured locations.
    pub async fn open(config: DictionaryConfig) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(SqliteDictionaryStore::open(&config.database_path).await?);
        let source = Arc::new(LocationSource::new(
            HttpSource::default(),
            FileSource::new(config.chunk_size),
        ));
        Self::with_parts(store, source, config).await
    }

    /// Wire a dictionary from an already opened store and a corpus source.
    pub async fn with_parts(
        store: Arc<dyn DictionaryStore>,
        source: Arc<dyn CorpusSource>,
        config: DictionaryConfig,
    ) -> Result<Self> {
        let mut installed = true;
        for corpus in [Corpus::Characters, Corpus::Phrases] {
            let present = store.count(corpus.primary_store()).await?;
            installed &= present >= config.expected_total(corpus);
        }
        let initial = if installed {
            IngestionStatus::Ready
        } else {
            IngestionStatus::NotInstalled
        };
        info!("Dictionary opened, corpora {}", initial);

        Ok(Self {
            loader: BulkLoader::new(store.clone(), source, config.clone()),
            engine: QueryEngine::new(store.clone()).with_range_limit(config.range_limit),
            status: watch::Sender::new(initial),
            store,
            config,
        })
    }

    /// Load whichever corpora are not yet installed.
    pub async fn ingest(&self) -> Result<IngestReport> {
        self.ingest_with_progress(|_| {}).await
    }

    /// Like [`ingest`](Self::ingest), reporting the combined record count of
    /// both corpora as it grows.
    pub async fn ingest_with_progress<P>(&self, on_progress: P) -> Result<IngestReport>
    where
        P: Fn(u64),
    {
        let total = self.config.expected_characters + self.config.expected_phrases;
        let result = self
            .loader
            .load_if_needed(|progress| {
                self.status
                    .send_replace(IngestionStatus::Loading { progress, total });
                on_progress(progress);
            })
            .await;

        match &result {
            Ok(report) => {
                info!("Ingestion finished in {}s", report.elapsed().num_seconds());
                self.status.send_replace(IngestionStatus::Ready);
            }
            Err(e) => {
                error!("Ingestion failed: {}", e);
                self.status.send_replace(IngestionStatus::Failed {
                    message: e.to_string(),
                });
            }
        }
        result
    }

    pub async fn set_query(&self, update: impl Into<QueryUpdate>) {
        self.engine.set_query(update).await
    }

    pub async fn set_current_entry(&self, sequence_number: Option<SequenceNumber>) {
        self.engine.set_current_entry(sequence_number).await
    }

    pub async fn toggle_radical_query(&self, radical: &str) {
        self.engine.toggle_radical_query(radical).await
    }

    pub fn subscribe(&self) -> watch::Receiver<DictionaryState> {
        self.engine.subscribe()
    }

    pub fn snapshot(&self) -> DictionaryState {
        self.engine.snapshot()
    }

    pub fn ingestion_status(&self) -> watch::Receiver<IngestionStatus> {
        self.status.subscribe()
    }

    pub async fn statistics(&self) -> Result<StoreStatistics> {
        self.store.statistics().await
    }

    pub fn config(&self) -> &DictionaryConfig {
        &self.config
    }

    pub async fn close(&self) {
        self.store.close().await
    }
}
