//! Versioned SQLite schema for the dictionary store.
//!
//! ```sql
//! -- primary containers: one JSON record per key
//! CREATE TABLE all_characters (literal TEXT PRIMARY KEY, record TEXT NOT NULL);
//! CREATE TABLE character_query_index (literal TEXT PRIMARY KEY, record TEXT NOT NULL);
//! CREATE TABLE all_phrases (sequence_number INTEGER PRIMARY KEY, record TEXT NOT NULL);
//! CREATE TABLE phrase_query_index (sequence_number INTEGER PRIMARY KEY, record TEXT NOT NULL);
//!
//! -- secondary multi-valued indexes: one row per (key, owner)
//! CREATE TABLE character_radical (radical TEXT, literal TEXT, PRIMARY KEY (radical, literal));
//! CREATE TABLE character_reading (reading TEXT, literal TEXT, PRIMARY KEY (reading, literal));
//! CREATE TABLE phrase_exact (key TEXT, sequence_number INTEGER, PRIMARY KEY (key, sequence_number));
//! CREATE TABLE phrase_partial (key TEXT, sequence_number INTEGER, PRIMARY KEY (key, sequence_number));
//! ```
//!
//! The schema is created once and stamped into `PRAGMA user_version`.
//! Opening a stamped database does nothing.

use sqlx::SqlitePool;
use std::collections::BTreeSet;
use tracing::{debug, error, info};

/// Version written to `PRAGMA user_version` after creation.
pub const SCHEMA_VERSION: i64 = 1;

const CONTAINERS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS all_characters (
        literal TEXT PRIMARY KEY NOT NULL,
        record TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS character_query_index (
        literal TEXT PRIMARY KEY NOT NULL,
        record TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS all_phrases (
        sequence_number INTEGER PRIMARY KEY NOT NULL,
        record TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS phrase_query_index (
        sequence_number INTEGER PRIMARY KEY NOT NULL,
        record TEXT NOT NULL
    )
    "#,
];

/// A multi-valued index: a `(key, owner)` table plus an owner lookup used
/// when an owner's keys are replaced.
#[derive(Debug, Clone, Copy)]
pub struct SecondaryIndex {
    pub table: &'static str,
    pub key_column: &'static str,
    pub owner_column: &'static str,
    pub owner_type: &'static str,
}

impl SecondaryIndex {
    fn statements(&self) -> [String; 2] {
        let SecondaryIndex {
            table,
            key_column,
            owner_column,
            owner_type,
        } = self;
        [
            format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    {key_column} TEXT NOT NULL,
                    {owner_column} {owner_type} NOT NULL,
                    PRIMARY KEY ({key_column}, {owner_column})
                ) WITHOUT ROWID"
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_{owner_column} ON {table}({owner_column})"
            ),
        ]
    }
}

pub const CHARACTER_RADICAL: SecondaryIndex = SecondaryIndex {
    table: "character_radical",
    key_column: "radical",
    owner_column: "literal",
    owner_type: "TEXT",
};

pub const CHARACTER_READING: SecondaryIndex = SecondaryIndex {
    table: "character_reading",
    key_column: "reading",
    owner_column: "literal",
    owner_type: "TEXT",
};

pub const PHRASE_EXACT: SecondaryIndex = SecondaryIndex {
    table: "phrase_exact",
    key_column: "key",
    owner_column: "sequence_number",
    owner_type: "INTEGER",
};

pub const PHRASE_PARTIAL: SecondaryIndex = SecondaryIndex {
    table: "phrase_partial",
    key_column: "key",
    owner_column: "sequence_number",
    owner_type: "INTEGER",
};

pub const SECONDARY_INDEXES: [SecondaryIndex; 4] = [
    CHARACTER_RADICAL,
    CHARACTER_READING,
    PHRASE_EXACT,
    PHRASE_PARTIAL,
];

pub async fn schema_version(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("PRAGMA user_version")
        .fetch_one(pool)
        .await
}

/// Create the schema unless the database is already stamped.
///
/// Container creation failures are returned. A secondary index that fails to
/// create is logged and skipped; the store then treats it as missing.
pub async fn initialize(pool: &SqlitePool) -> sqlx::Result<()> {
    let version = schema_version(pool).await?;
    if version >= SCHEMA_VERSION {
        debug!("Schema already at version {}", version);
        return Ok(());
    }

    info!("Creating dictionary schema version {}", SCHEMA_VERSION);
    for statement in CONTAINERS {
        sqlx::query(statement).execute(pool).await?;
    }

    for index in &SECONDARY_INDEXES {
        if let Err(e) = create_secondary_index(pool, index).await {
            error!("Failed to create index {}: {}", index.table, e);
        }
    }

    sqlx::query(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_secondary_index(pool: &SqlitePool, index: &SecondaryIndex) -> sqlx::Result<()> {
    for statement in index.statements() {
        sqlx::query(&statement).execute(pool).await?;
    }
    Ok(())
}

/// Secondary index tables that exist as real tables.
pub async fn available_indexes(pool: &SqlitePool) -> sqlx::Result<BTreeSet<&'static str>> {
    let tables: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(pool)
            .await?;
    Ok(SECONDARY_INDEXES
        .iter()
        .map(|index| index.table)
        .filter(|table| tables.iter().any(|name| name == table))
        .collect())
}
