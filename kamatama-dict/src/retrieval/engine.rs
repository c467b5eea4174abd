use super::radical::RadicalMultiset;
use super::request::{RequestCounter, RequestId};
use super::state::{DictionaryState, QueryUpdate};
use crate::config::DEFAULT_RANGE_LIMIT;
use crate::error::Result;
use crate::model::{KanjiCharacter, PhraseEntry, SequenceNumber};
use crate::storage::{DictionaryStore, PhraseIndex};
use futures::future::try_join_all;
use kamatama_kana::normalize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

/// Appended to a prefix to form the exclusive upper bound of its key range.
pub const RANGE_END: char = '\u{FFFF}';

/// Turns query, radical and entry selections into store lookups and
/// publishes the results.
///
/// Each result channel has its own request counter. A lookup publishes only
/// if no newer lookup was started on its channel in the meantime, so results
/// of superseded queries never overwrite newer ones regardless of the order
/// in which lookups finish.
pub struct QueryEngine {
    store: Arc<dyn DictionaryStore>,
    range_limit: usize,
    state: watch::Sender<DictionaryState>,
    phrase_requests: RequestCounter,
    kanji_requests: RequestCounter,
    radical_requests: RequestCounter,
    entry_requests: RequestCounter,
    radicals: Mutex<RadicalMultiset>,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn DictionaryStore>) -> Self {
        Self {
            store,
            range_limit: DEFAULT_RANGE_LIMIT,
            state: watch::Sender::new(DictionaryState::default()),
            phrase_requests: RequestCounter::default(),
            kanji_requests: RequestCounter::default(),
            radical_requests: RequestCounter::default(),
            entry_requests: RequestCounter::default(),
            radicals: Mutex::new(RadicalMultiset::default()),
        }
    }

    pub fn with_range_limit(mut self, limit: usize) -> Self {
        self.range_limit = limit;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<DictionaryState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> DictionaryState {
        self.state.borrow().clone()
    }

    /// Update the query and refresh phrase and kanji results concurrently.
    pub async fn set_query(&self, update: impl Into<QueryUpdate>) {
        let update = update.into();
        let mut query = String::new();
        let mut phrase_id = RequestId::default();
        let mut kanji_id = RequestId::default();
        self.state.send_modify(|state| {
            state.query = update.apply(&state.query);
            query = state.query.clone();
            phrase_id = self.phrase_requests.begin();
            kanji_id = self.kanji_requests.begin();
        });

        let normalized = normalize(query.trim());
        debug!("Query {:?} normalized to {:?}", query, normalized);
        tokio::join!(
            self.refresh_phrases(&normalized, phrase_id),
            self.refresh_kanji(&normalized, kanji_id),
        );
    }

    /// Show the entry with `sequence_number`, or clear the selection.
    pub async fn set_current_entry(&self, sequence_number: Option<SequenceNumber>) {
        let id = self.entry_requests.begin();
        let entry = match sequence_number {
            None => None,
            Some(sequence_number) => match self.store.get_phrase(sequence_number).await {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Entry lookup for {} failed: {}", sequence_number, e);
                    return;
                }
            },
        };
        self.publish(&self.entry_requests, id, |state| {
            state.current_entry = entry;
        });
    }

    /// Add `radical` to the compound radical query, or remove it if selected.
    pub async fn toggle_radical_query(&self, radical: &str) {
        let id = self.radical_requests.begin();
        let (selected, literals) = {
            let mut radicals = self.radicals.lock().await;
            if !radicals.remove(radical) {
                let carriers = match self.store.characters_with_radical(radical).await {
                    Ok(carriers) => carriers,
                    Err(e) => {
                        warn!("Radical lookup for {} failed: {}", radical, e);
                        return;
                    }
                };
                radicals.add(radical, carriers);
            }
            (radicals.selected(), radicals.matches())
        };

        let characters = match self.resolve_characters(literals).await {
            Ok(characters) => characters,
            Err(e) => {
                warn!("Resolving radical matches failed: {}", e);
                return;
            }
        };
        self.publish(&self.radical_requests, id, |state| {
            state.radical_query = selected;
            state.radical_results = characters;
        });
    }

    async fn refresh_phrases(&self, query: &str, id: RequestId) {
        let results = if query.is_empty() {
            Vec::new()
        } else {
            match self.lookup_phrases(query).await {
                Ok(results) => results,
                Err(e) => {
                    warn!("Phrase lookup for {:?} failed: {}", query, e);
                    return;
                }
            }
        };
        self.publish(&self.phrase_requests, id, |state| state.results = results);
    }

    async fn refresh_kanji(&self, query: &str, id: RequestId) {
        let results = if query.is_empty() {
            Vec::new()
        } else {
            match self.lookup_kanji(query).await {
                Ok(results) => results,
                Err(e) => {
                    warn!("Kanji lookup for {:?} failed: {}", query, e);
                    return;
                }
            }
        };
        self.publish(&self.kanji_requests, id, |state| {
            state.kanji_results = results;
        });
    }

    /// Exact matches, then exact-key prefix matches, then partial-key prefix
    /// matches, each entry once.
    pub async fn lookup_phrases(&self, query: &str) -> Result<Vec<PhraseEntry>> {
        let upper = format!("{query}{RANGE_END}");
        let (exact, exact_range, partial_range) = tokio::try_join!(
            self.store.phrases_with_exact(query),
            self.store
                .phrases_in_range(PhraseIndex::Exact, query, &upper, self.range_limit),
            self.store
                .phrases_in_range(PhraseIndex::Partial, query, &upper, self.range_limit),
        )?;

        let mut seen = HashSet::new();
        let ids: Vec<SequenceNumber> = exact
            .into_iter()
            .chain(exact_range)
            .chain(partial_range)
            .filter(|id| seen.insert(*id))
            .collect();
        let entries = try_join_all(ids.into_iter().map(|id| self.store.get_phrase(id))).await?;
        Ok(entries.into_iter().flatten().collect())
    }

    pub async fn lookup_kanji(&self, reading: &str) -> Result<Vec<KanjiCharacter>> {
        let literals = self.store.characters_with_reading(reading).await?;
        self.resolve_characters(literals).await
    }

    async fn resolve_characters(&self, literals: Vec<String>) -> Result<Vec<KanjiCharacter>> {
        let characters = try_join_all(
            literals
                .iter()
                .map(|literal| self.store.get_character(literal)),
        )
        .await?;
        Ok(characters.into_iter().flatten().collect())
    }

    /// Apply `update` unless a newer request was issued on `counter`.
    fn publish<F>(&self, counter: &RequestCounter, id: RequestId, update: F) -> bool
    where
        F: FnOnce(&mut DictionaryState),
    {
        self.state.send_if_modified(|state| {
            if !counter.is_current(id) {
                debug!("Discarding stale results of {:?}", id);
                return false;
            }
            update(state);
            true
        })
    }
}
