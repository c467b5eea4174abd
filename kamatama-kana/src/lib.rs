//! kamatama-kana: phonetic normalization for dictionary keys and queries.
//!
//! Every searchable string in kamatama, whether it comes from the corpus or
//! from the search box, is folded to a single hiragana representation before it
//! touches an index:
//!
//! ```
//! use kamatama_kana::to_hiragana;
//!
//! assert_eq!(to_hiragana("タベル"), "たべる");
//! assert_eq!(to_hiragana("taberu"), "たべる");
//! assert_eq!(to_hiragana("食べる"), "食べる");
//! ```

mod romaji;
mod table;
pub mod unicode;

use unicode_normalization::UnicodeNormalization;

pub use romaji::romaji_to_hiragana;
pub use unicode::katakana_to_hiragana;

/// Convert katakana and romaji to hiragana, passing through everything that
/// has no hiragana spelling.
pub fn to_hiragana(text: &str) -> String {
    romaji_to_hiragana(&katakana_to_hiragana(text))
}

/// NFKC-fold `text` (half-width katakana, full-width ASCII) and then convert
/// it with [`to_hiragana`]. This is the normalization applied to both index
/// keys and queries.
pub fn normalize(text: &str) -> String {
    let folded: String = text.nfkc().collect();
    to_hiragana(&folded)
}
