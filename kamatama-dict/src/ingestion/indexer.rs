//! Derivation of search keys from source records.

use crate::model::{CharacterQuery, KanjiCharacter, PhraseEntry, PhraseQuery, ReadingMeaning};
use kamatama_kana::normalize;
use std::collections::BTreeSet;
use tracing::warn;

/// Exact keys are every written form and reading normalized to hiragana;
/// partial keys are their proper suffixes.
pub fn phrase_query(entry: &PhraseEntry) -> Option<PhraseQuery> {
    if let Err(problem) = entry.validate() {
        warn!("Phrase {} is incomplete: {}", entry.sequence_number, problem);
    }

    let exact: BTreeSet<String> = entry
        .forms()
        .map(normalize)
        .filter(|key| !key.is_empty())
        .collect();
    Some(PhraseQuery::from_exact(entry.sequence_number, exact))
}

/// Builds the reading index record of a kanji character.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharacterTransform {
    pub include_name_readings: bool,
}

impl CharacterTransform {
    pub fn new(include_name_readings: bool) -> Self {
        Self {
            include_name_readings,
        }
    }

    /// On and kun readings (plus nanori when enabled), normalized. `None`
    /// when the character has no such reading.
    pub fn apply(&self, character: &KanjiCharacter) -> Option<CharacterQuery> {
        let mut readings = BTreeSet::new();
        for reading_meaning in &character.reading_meaning {
            match reading_meaning {
                ReadingMeaning::Group(group) => {
                    readings.extend(
                        group
                            .reading
                            .iter()
                            .filter(|reading| reading.kind.is_japanese())
                            .map(|reading| normalize_reading(&reading.value)),
                    );
                }
                ReadingMeaning::NameOnly(name) if self.include_name_readings => {
                    readings.insert(normalize_reading(&name.value));
                }
                ReadingMeaning::NameOnly(_) => {}
            }
        }
        readings.retain(|reading: &String| !reading.is_empty());

        if readings.is_empty() {
            return None;
        }
        Some(CharacterQuery {
            literal: character.literal.clone(),
            readings,
        })
    }
}

/// Drop okurigana (`.`) and affix (`-`) markers, then normalize.
fn normalize_reading(reading: &str) -> String {
    let bare: String = reading.chars().filter(|c| !matches!(c, '.' | '-')).collect();
    normalize(&bare)
}
