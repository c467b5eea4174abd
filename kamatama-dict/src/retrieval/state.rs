use crate::model::{KanjiCharacter, PhraseEntry};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Everything a subscriber renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DictionaryState {
    /// The query as typed, before normalization
    pub query: String,
    pub results: Vec<PhraseEntry>,
    pub kanji_results: Vec<KanjiCharacter>,
    pub radical_query: BTreeSet<String>,
    pub radical_results: Vec<KanjiCharacter>,
    pub current_entry: Option<PhraseEntry>,
}

/// A change to the query text.
pub enum QueryUpdate {
    Replace(String),
    /// Computed from the current query at the moment it is applied
    Update(Box<dyn FnOnce(&str) -> String + Send>),
}

impl QueryUpdate {
    pub fn update<F>(f: F) -> Self
    where
        F: FnOnce(&str) -> String + Send + 'static,
    {
        QueryUpdate::Update(Box::new(f))
    }

    pub(crate) fn apply(self, current: &str) -> String {
        match self {
            QueryUpdate::Replace(query) => query,
            QueryUpdate::Update(f) => f(current),
        }
    }
}

impl fmt::Debug for QueryUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryUpdate::Replace(query) => f.debug_tuple("Replace").field(query).finish(),
            QueryUpdate::Update(_) => f.write_str("Update(..)"),
        }
    }
}

impl From<String> for QueryUpdate {
    fn from(query: String) -> Self {
        QueryUpdate::Replace(query)
    }
}

impl From<&str> for QueryUpdate {
    fn from(query: &str) -> Self {
        QueryUpdate::Replace(query.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_update() {
        assert_eq!(QueryUpdate::from("taberu").apply("x"), "taberu");
        let append = QueryUpdate::update(|current| format!("{current}ru"));
        assert_eq!(append.apply("tabe"), "taberu");
    }
}
