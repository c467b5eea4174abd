use super::SequenceNumber;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Search keys derived from a phrase entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseQuery {
    pub sequence_number: SequenceNumber,
    /// Normalized written forms and readings
    pub exact: BTreeSet<String>,
    /// Proper non-empty suffixes of every exact key
    pub partial: BTreeSet<String>,
}

impl PhraseQuery {
    /// Build the query record for `exact`, filling `partial` with every
    /// proper suffix of each key.
    pub fn from_exact(sequence_number: SequenceNumber, exact: BTreeSet<String>) -> Self {
        let partial = exact.iter().flat_map(|key| proper_suffixes(key)).collect();
        Self {
            sequence_number,
            exact,
            partial,
        }
    }
}

/// Search keys derived from a kanji character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterQuery {
    pub literal: String,
    pub readings: BTreeSet<String>,
}

/// Suffixes of `key` starting after the first character, split on char
/// boundaries.
pub fn proper_suffixes(key: &str) -> impl Iterator<Item = String> + '_ {
    key.char_indices().skip(1).map(|(i, _)| key[i..].to_string())
}
