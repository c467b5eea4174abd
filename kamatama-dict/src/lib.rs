//! kamatama-dict: an offline Japanese-English dictionary engine.
//!
//! The engine ingests the JMdict phrase corpus and the KANJIDIC2 character
//! corpus into a local SQLite store, streaming each multi-megabyte JSON array
//! record by record, and answers prefix and substring queries while the user
//! types.
//!
//! ## Components
//!
//! - **storage**: the store traits and their SQLite implementation
//! - **ingestion**: corpus sources, search key derivation and the bulk loader
//! - **retrieval**: the query engine and its observable state
//! - **Dictionary**: the facade wiring all three around one shared store
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kamatama_dict::{Dictionary, DictionaryConfig};
//!
//! # async fn example() -> kamatama_dict::Result<()> {
//! let dictionary = Dictionary::open(DictionaryConfig::new("kamatama.db")).await?;
//! dictionary.ingest().await?;
//! dictionary.set_query("taberu").await;
//! for entry in dictionary.snapshot().results {
//!     println!("{}", entry.sequence_number);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dictionary;
pub mod error;
pub mod ingestion;
pub mod model;
pub mod retrieval;
pub mod status;
pub mod storage;

pub use config::DictionaryConfig;
pub use dictionary::Dictionary;
pub use error::{DictError, Result};
pub use retrieval::{DictionaryState, QueryUpdate};
pub use status::IngestionStatus;
