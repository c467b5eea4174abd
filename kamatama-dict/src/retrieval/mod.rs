//! Interactive lookups over the dictionary store.
//!
//! The [`QueryEngine`] owns the observable [`DictionaryState`]. Callers push
//! query changes, radical toggles and entry selections; subscribers receive
//! the resulting state through a `tokio::sync::watch` channel.
//!
//! Phrase, kanji, radical and current-entry results are independent
//! channels, each guarded by its own [`RequestCounter`].

pub mod engine;
pub mod radical;
pub mod request;
pub mod state;

pub use engine::{QueryEngine, RANGE_END};
pub use radical::RadicalMultiset;
pub use request::{RequestCounter, RequestId};
pub use state::{DictionaryState, QueryUpdate};
