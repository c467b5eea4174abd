//! Dictionary records and the search keys derived from them.
//!
//! Source records mirror the JSON shape of the distributed corpora (camelCase
//! keys, most fields optional). Query records are derived at load time and
//! stored next to their source record.

pub mod kanji;
pub mod phrase;
pub mod query;

pub use kanji::{
    KanjiCharacter, KanjiMeaning, KanjiReading, NameOnlyReading, ReadingMeaning,
    ReadingMeaningGroup, ReadingType, TypedValue,
};
pub use phrase::{Gloss, KanjiElement, PhraseEntry, ReadingElement, SequenceNumber, Sense};
pub use query::{CharacterQuery, PhraseQuery};
