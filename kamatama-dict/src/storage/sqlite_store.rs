//! SQLite implementation of the dictionary store traits.

use super::schema::{
    self, CHARACTER_RADICAL, CHARACTER_READING, PHRASE_EXACT, PHRASE_PARTIAL, SECONDARY_INDEXES,
    SecondaryIndex,
};
use super::{
    CharacterStore, DictionaryStore, IndexedBatch, PhraseIndex, PhraseStore, StoreName,
    StoreStatistics,
};
use crate::error::Result;
use crate::model::{CharacterQuery, KanjiCharacter, PhraseEntry, PhraseQuery, SequenceNumber};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Primary key of a record, typed per container.
#[derive(Debug, Clone, Copy)]
enum Owner<'a> {
    Literal(&'a str),
    Sequence(SequenceNumber),
}

impl Owner<'_> {
    fn column(self) -> &'static str {
        match self {
            Owner::Literal(_) => "literal",
            Owner::Sequence(_) => "sequence_number",
        }
    }
}

/// Dictionary store backed by a single SQLite database.
#[derive(Clone, Debug)]
pub struct SqliteDictionaryStore {
    pool: SqlitePool,
    path: Option<PathBuf>,
    indexes: BTreeSet<&'static str>,
}

impl SqliteDictionaryStore {
    /// Open (creating if needed) an on-disk store at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(path)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .busy_timeout(Duration::from_secs(5))
                .create_if_missing(true),
        )
        .await?;
        Self::with_pool(pool, Some(path.to_path_buf())).await
    }

    /// Open a private in-memory store, mostly for tests.
    pub async fn open_memory() -> Result<Self> {
        // every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool, None).await
    }

    async fn with_pool(pool: SqlitePool, path: Option<PathBuf>) -> Result<Self> {
        schema::initialize(&pool).await?;
        let indexes = schema::available_indexes(&pool).await?;
        for index in &SECONDARY_INDEXES {
            if !indexes.contains(index.table) {
                warn!(
                    "Index {} is unavailable, lookups through it return nothing",
                    index.table
                );
            }
        }

        match &path {
            Some(path) => info!("Opened dictionary store at {}", path.display()),
            None => debug!("Opened in-memory dictionary store"),
        }
        Ok(Self {
            pool,
            path,
            indexes,
        })
    }

    fn has_index(&self, index: &SecondaryIndex) -> bool {
        self.indexes.contains(index.table)
    }

    async fn fetch_record<T: DeserializeOwned>(
        &self,
        store: StoreName,
        owner: Owner<'_>,
    ) -> Result<Option<T>> {
        let sql = format!(
            "SELECT record FROM {} WHERE {} = ?1",
            store.table(),
            owner.column()
        );
        let query = sqlx::query_scalar::<_, String>(&sql);
        let query = match owner {
            Owner::Literal(literal) => query.bind(literal),
            Owner::Sequence(sequence) => query.bind(sequence),
        };
        match query.fetch_optional(&self.pool).await? {
            Some(record) => Ok(Some(serde_json::from_str(&record)?)),
            None => Ok(None),
        }
    }

    async fn literals_for_key(&self, index: &SecondaryIndex, key: &str) -> Result<Vec<String>> {
        if !self.has_index(index) {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {owner} FROM {table} WHERE {key_column} = ?1 ORDER BY {owner}",
            owner = index.owner_column,
            table = index.table,
            key_column = index.key_column,
        );
        Ok(sqlx::query_scalar::<_, String>(&sql)
            .bind(key)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn put_phrases(&self, records: &[(PhraseEntry, Option<PhraseQuery>)]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (entry, query) in records {
            let owner = Owner::Sequence(entry.sequence_number);
            upsert_record(
                &mut tx,
                StoreName::AllPhrases,
                owner,
                &serde_json::to_string(entry)?,
            )
            .await?;

            match query {
                Some(query) => {
                    upsert_record(
                        &mut tx,
                        StoreName::PhraseQueryIndex,
                        owner,
                        &serde_json::to_string(query)?,
                    )
                    .await?;
                    self.replace_keys(&mut tx, &PHRASE_EXACT, owner, &query.exact)
                        .await?;
                    self.replace_keys(&mut tx, &PHRASE_PARTIAL, owner, &query.partial)
                        .await?;
                }
                None => {
                    delete_record(&mut tx, StoreName::PhraseQueryIndex, owner).await?;
                    self.replace_keys(&mut tx, &PHRASE_EXACT, owner, &BTreeSet::new())
                        .await?;
                    self.replace_keys(&mut tx, &PHRASE_PARTIAL, owner, &BTreeSet::new())
                        .await?;
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn put_characters(
        &self,
        records: &[(KanjiCharacter, Option<CharacterQuery>)],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (character, query) in records {
            let owner = Owner::Literal(&character.literal);
            upsert_record(
                &mut tx,
                StoreName::AllCharacters,
                owner,
                &serde_json::to_string(character)?,
            )
            .await?;
            let radicals: BTreeSet<String> =
                character.radical_codes().map(str::to_string).collect();
            self.replace_keys(&mut tx, &CHARACTER_RADICAL, owner, &radicals)
                .await?;

            match query {
                Some(query) => {
                    upsert_record(
                        &mut tx,
                        StoreName::CharacterQueryIndex,
                        owner,
                        &serde_json::to_string(query)?,
                    )
                    .await?;
                    self.replace_keys(&mut tx, &CHARACTER_READING, owner, &query.readings)
                        .await?;
                }
                None => {
                    delete_record(&mut tx, StoreName::CharacterQueryIndex, owner).await?;
                    self.replace_keys(&mut tx, &CHARACTER_READING, owner, &BTreeSet::new())
                        .await?;
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }

    /// Drop every key `owner` has in `index` and insert `keys` instead.
    async fn replace_keys(
        &self,
        conn: &mut SqliteConnection,
        index: &SecondaryIndex,
        owner: Owner<'_>,
        keys: &BTreeSet<String>,
    ) -> Result<()> {
        if !self.has_index(index) {
            return Ok(());
        }

        let delete = format!(
            "DELETE FROM {} WHERE {} = ?1",
            index.table, index.owner_column
        );
        let insert = format!(
            "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
            index.table, index.key_column, index.owner_column
        );

        let query = sqlx::query(&delete);
        let query = match owner {
            Owner::Literal(literal) => query.bind(literal),
            Owner::Sequence(sequence) => query.bind(sequence),
        };
        query.execute(&mut *conn).await?;

        for key in keys {
            let query = sqlx::query(&insert).bind(key.as_str());
            let query = match owner {
                Owner::Literal(literal) => query.bind(literal),
                Owner::Sequence(sequence) => query.bind(sequence),
            };
            query.execute(&mut *conn).await?;
        }
        Ok(())
    }
}

async fn upsert_record(
    conn: &mut SqliteConnection,
    store: StoreName,
    owner: Owner<'_>,
    record: &str,
) -> Result<()> {
    let column = owner.column();
    let sql = format!(
        "INSERT INTO {table} ({column}, record) VALUES (?1, ?2)
         ON CONFLICT({column}) DO UPDATE SET record = excluded.record",
        table = store.table(),
    );
    let query = sqlx::query(&sql);
    let query = match owner {
        Owner::Literal(literal) => query.bind(literal),
        Owner::Sequence(sequence) => query.bind(sequence),
    };
    query.bind(record).execute(&mut *conn).await?;
    Ok(())
}

/// Remove a derived record whose source no longer produces one.
async fn delete_record(
    conn: &mut SqliteConnection,
    store: StoreName,
    owner: Owner<'_>,
) -> Result<()> {
    let sql = format!("DELETE FROM {} WHERE {} = ?1", store.table(), owner.column());
    let query = sqlx::query(&sql);
    let query = match owner {
        Owner::Literal(literal) => query.bind(literal),
        Owner::Sequence(sequence) => query.bind(sequence),
    };
    query.execute(&mut *conn).await?;
    Ok(())
}

#[async_trait]
impl PhraseStore for SqliteDictionaryStore {
    async fn get_phrase(&self, sequence_number: SequenceNumber) -> Result<Option<PhraseEntry>> {
        self.fetch_record(StoreName::AllPhrases, Owner::Sequence(sequence_number))
            .await
    }

    async fn get_phrase_query(
        &self,
        sequence_number: SequenceNumber,
    ) -> Result<Option<PhraseQuery>> {
        self.fetch_record(StoreName::PhraseQueryIndex, Owner::Sequence(sequence_number))
            .await
    }

    async fn phrases_with_exact(&self, key: &str) -> Result<Vec<SequenceNumber>> {
        if !self.has_index(&PHRASE_EXACT) {
            return Ok(Vec::new());
        }
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT sequence_number FROM phrase_exact WHERE key = ?1 ORDER BY sequence_number",
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn phrases_in_range(
        &self,
        index: PhraseIndex,
        lower: &str,
        upper: &str,
        limit: usize,
    ) -> Result<Vec<SequenceNumber>> {
        let secondary = match index {
            PhraseIndex::Exact => &PHRASE_EXACT,
            PhraseIndex::Partial => &PHRASE_PARTIAL,
        };
        if !self.has_index(secondary) {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT sequence_number FROM {} WHERE key >= ?1 AND key < ?2
             ORDER BY key, sequence_number LIMIT ?3",
            index.table()
        );
        Ok(sqlx::query_scalar::<_, i64>(&sql)
            .bind(lower)
            .bind(upper)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl CharacterStore for SqliteDictionaryStore {
    async fn get_character(&self, literal: &str) -> Result<Option<KanjiCharacter>> {
        self.fetch_record(StoreName::AllCharacters, Owner::Literal(literal))
            .await
    }

    async fn get_character_query(&self, literal: &str) -> Result<Option<CharacterQuery>> {
        self.fetch_record(StoreName::CharacterQueryIndex, Owner::Literal(literal))
            .await
    }

    async fn characters_with_reading(&self, reading: &str) -> Result<Vec<String>> {
        self.literals_for_key(&CHARACTER_READING, reading).await
    }

    async fn characters_with_radical(&self, radical: &str) -> Result<Vec<String>> {
        self.literals_for_key(&CHARACTER_RADICAL, radical).await
    }
}

#[async_trait]
impl DictionaryStore for SqliteDictionaryStore {
    async fn count(&self, store: StoreName) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", store.table());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn put_batch(&self, batch: IndexedBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        match &batch {
            IndexedBatch::Phrases(records) => self.put_phrases(records).await?,
            IndexedBatch::Characters(records) => self.put_characters(records).await?,
        }
        debug!(
            "Committed {} records into {:?}",
            batch.len(),
            batch.stores()
        );
        Ok(())
    }

    async fn statistics(&self) -> Result<StoreStatistics> {
        let mut counts = BTreeMap::new();
        for store in StoreName::ALL {
            counts.insert(store, self.count(store).await?);
        }
        Ok(StoreStatistics {
            schema_version: schema::schema_version(&self.pool).await?,
            database_path: self.path.as_ref().map(|p| p.display().to_string()),
            counts,
            missing_indexes: SECONDARY_INDEXES
                .iter()
                .filter(|index| !self.has_index(index))
                .map(|index| index.table.to_string())
                .collect(),
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;
    use tracing_test::traced_test;

    fn phrase(sequence_number: i64, kanji: &str, reading: &str) -> PhraseEntry {
        serde_json::from_value(json!({
            "sequenceNumber": sequence_number,
            "kanji": [{"value": kanji}],
            "reading": [{"value": reading}],
            "sense": [{"glossary": [{"value": "gloss"}]}]
        }))
        .unwrap()
    }

    fn phrase_query(sequence_number: i64, keys: &[&str]) -> PhraseQuery {
        PhraseQuery::from_exact(
            sequence_number,
            keys.iter().map(|k| k.to_string()).collect(),
        )
    }

    fn character(literal: &str, radical: &str) -> KanjiCharacter {
        serde_json::from_value(json!({
            "literal": literal,
            "radical": [{"type": "classical", "value": radical}]
        }))
        .unwrap()
    }

    fn character_query(literal: &str, readings: &[&str]) -> CharacterQuery {
        CharacterQuery {
            literal: literal.to_string(),
            readings: readings.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_put_and_get_phrase() -> anyhow::Result<()> {
        let store = SqliteDictionaryStore::open_memory().await?;
        let entry = phrase(1358280, "食べる", "たべる");
        let query = phrase_query(1358280, &["食べる", "たべる"]);
        store
            .put_batch(IndexedBatch::Phrases(vec![(entry.clone(), Some(query.clone()))]))
            .await?;

        assert_eq!(store.get_phrase(1358280).await?, Some(entry));
        assert_eq!(store.get_phrase_query(1358280).await?, Some(query));
        assert_eq!(store.get_phrase(1).await?, None);
        assert_eq!(store.phrases_with_exact("たべる").await?, vec![1358280]);
        assert_eq!(store.count(StoreName::AllPhrases).await?, 1);
        assert_eq!(store.count(StoreName::PhraseQueryIndex).await?, 1);
        assert_eq!(store.count(StoreName::AllCharacters).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_put_replaces_index_entries() -> anyhow::Result<()> {
        let store = SqliteDictionaryStore::open_memory().await?;
        store
            .put_batch(IndexedBatch::Phrases(vec![(
                phrase(5, "古", "ふるい"),
                Some(phrase_query(5, &["ふるい"])),
            )]))
            .await?;
        store
            .put_batch(IndexedBatch::Phrases(vec![(
                phrase(5, "新", "あたらしい"),
                Some(phrase_query(5, &["あたらしい"])),
            )]))
            .await?;

        assert!(store.phrases_with_exact("ふるい").await?.is_empty());
        assert_eq!(store.phrases_with_exact("あたらしい").await?, vec![5]);
        let stale = store
            .phrases_in_range(PhraseIndex::Partial, "るい", "るい\u{FFFF}", 30)
            .await?;
        assert!(stale.is_empty());
        assert_eq!(store.count(StoreName::AllPhrases).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_range_scan_bounds_and_limit() -> anyhow::Result<()> {
        let store = SqliteDictionaryStore::open_memory().await?;
        let records = (0..40)
            .map(|i| {
                let reading = format!("たべ{i:02}");
                (phrase(i, "食", &reading), Some(phrase_query(i, &[reading.as_str()])))
            })
            .chain(std::iter::once((
                phrase(100, "束", "たば"),
                Some(phrase_query(100, &["たば"])),
            )))
            .collect();
        store.put_batch(IndexedBatch::Phrases(records)).await?;

        let hits = store
            .phrases_in_range(PhraseIndex::Exact, "たべ", "たべ\u{FFFF}", 30)
            .await?;
        assert_eq!(hits.len(), 30);
        assert_eq!(hits[0], 0);
        assert!(!hits.contains(&100));

        let partial = store
            .phrases_in_range(PhraseIndex::Partial, "べ0", "べ0\u{FFFF}", 30)
            .await?;
        assert_eq!(partial, (0..10).collect::<Vec<_>>());
        Ok(())
    }

    #[tokio::test]
    async fn test_character_indexes() -> anyhow::Result<()> {
        let store = SqliteDictionaryStore::open_memory().await?;
        store
            .put_batch(IndexedBatch::Characters(vec![
                (character("食", "184"), Some(character_query("食", &["しょく", "たべる"]))),
                (character("飯", "184"), Some(character_query("飯", &["はん"]))),
                (character("〆", "4"), None),
            ]))
            .await?;

        assert_eq!(store.characters_with_reading("たべる").await?, vec!["食"]);
        assert_eq!(
            store.characters_with_radical("184").await?,
            vec!["食", "飯"]
        );
        assert_eq!(store.characters_with_radical("4").await?, vec!["〆"]);
        assert_eq!(store.count(StoreName::AllCharacters).await?, 3);
        assert_eq!(store.count(StoreName::CharacterQueryIndex).await?, 2);
        assert!(store.get_character_query("〆").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_rewrite_without_readings_drops_old_index() -> anyhow::Result<()> {
        let store = SqliteDictionaryStore::open_memory().await?;
        store
            .put_batch(IndexedBatch::Characters(vec![(
                character("彦", "59"),
                Some(character_query("彦", &["げん", "ひこ"])),
            )]))
            .await?;
        store
            .put_batch(IndexedBatch::Characters(vec![(character("彦", "59"), None)]))
            .await?;

        assert!(store.characters_with_reading("ひこ").await?.is_empty());
        assert!(store.characters_with_reading("げん").await?.is_empty());
        assert!(store.get_character_query("彦").await?.is_none());
        assert_eq!(store.count(StoreName::CharacterQueryIndex).await?, 0);
        assert_eq!(store.characters_with_radical("59").await?, vec!["彦"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_rewrite_without_phrase_query_drops_old_keys() -> anyhow::Result<()> {
        let store = SqliteDictionaryStore::open_memory().await?;
        store
            .put_batch(IndexedBatch::Phrases(vec![(
                phrase(7, "猫", "ねこ"),
                Some(phrase_query(7, &["ねこ"])),
            )]))
            .await?;
        store
            .put_batch(IndexedBatch::Phrases(vec![(phrase(7, "猫", "ねこ"), None)]))
            .await?;

        assert!(store.phrases_with_exact("ねこ").await?.is_empty());
        let partial = store
            .phrases_in_range(PhraseIndex::Partial, "こ", "こ\u{FFFF}", 30)
            .await?;
        assert!(partial.is_empty());
        assert!(store.get_phrase_query(7).await?.is_none());
        assert!(store.get_phrase(7).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_reopen_initialized_store_is_noop() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("dictionary.db");

        let store = SqliteDictionaryStore::open(&path).await?;
        store
            .put_batch(IndexedBatch::Phrases(vec![(
                phrase(9, "猫", "ねこ"),
                Some(phrase_query(9, &["ねこ"])),
            )]))
            .await?;
        store.close().await;

        let reopened = SqliteDictionaryStore::open(&path).await?;
        let stats = reopened.statistics().await?;
        assert_eq!(stats.schema_version, schema::SCHEMA_VERSION);
        assert_eq!(stats.counts[&StoreName::AllPhrases], 1);
        assert!(stats.missing_indexes.is_empty());
        assert_eq!(reopened.phrases_with_exact("ねこ").await?, vec![9]);
        reopened.close().await;
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failed_index_creation_is_not_fatal() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dictionary.db");

        // occupy the partial index's name with a view so its creation fails
        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(&path)
                .create_if_missing(true),
        )
        .await?;
        sqlx::query("CREATE VIEW phrase_partial AS SELECT 1 AS key")
            .execute(&pool)
            .await?;
        pool.close().await;

        let store = SqliteDictionaryStore::open(&path).await?;
        assert!(logs_contain("Failed to create index phrase_partial"));

        store
            .put_batch(IndexedBatch::Phrases(vec![(
                phrase(3, "犬", "いぬ"),
                Some(phrase_query(3, &["いぬ"])),
            )]))
            .await?;
        assert_eq!(store.phrases_with_exact("いぬ").await?, vec![3]);
        assert!(
            store
                .phrases_in_range(PhraseIndex::Partial, "ぬ", "ぬ\u{FFFF}", 30)
                .await?
                .is_empty()
        );

        let stats = store.statistics().await?;
        assert_eq!(stats.missing_indexes, vec!["phrase_partial".to_string()]);
        Ok(())
    }
}
