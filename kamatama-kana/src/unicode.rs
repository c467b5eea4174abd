//! Character-level Unicode classification for Japanese text.

/// Offset between a katakana code point and its hiragana counterpart.
const KATAKANA_OFFSET: u32 = 0x60;

/// Hiragana block (U+3040..U+309F).
pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

/// Katakana block (U+30A0..U+30FF), including the prolonged sound mark ー.
pub fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c)
}

pub fn is_kanji(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
        || ('\u{3400}'..='\u{4DBF}').contains(&c)
        || ('\u{20000}'..='\u{2A6DF}').contains(&c)
}

pub fn is_kana(c: char) -> bool {
    is_hiragana(c) || is_katakana(c)
}

/// Katakana that have a direct hiragana counterpart: ァ..ヶ plus the
/// iteration marks ヽ and ヾ.
fn has_hiragana_form(c: char) -> bool {
    ('\u{30A1}'..='\u{30F6}').contains(&c) || c == 'ヽ' || c == 'ヾ'
}

/// Convert katakana to hiragana. Characters without a hiragana form
/// (ー, ヷ, ASCII, kanji, ...) are passed through unchanged.
pub fn katakana_to_hiragana(s: &str) -> String {
    s.chars()
        .map(|c| {
            if has_hiragana_form(c) {
                char::from_u32(c as u32 - KATAKANA_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_katakana_to_hiragana() {
        assert_eq!(katakana_to_hiragana("タベル"), "たべる");
        assert_eq!(katakana_to_hiragana("ラーメン"), "らーめん");
        assert_eq!(katakana_to_hiragana("ヴァイオリン"), "ゔぁいおりん");
        assert_eq!(katakana_to_hiragana("ヾ"), "ゞ");
        assert_eq!(katakana_to_hiragana("食べる"), "食べる");
        assert_eq!(katakana_to_hiragana(""), "");
    }

    #[test]
    fn test_untranslatable_katakana_pass_through() {
        assert_eq!(katakana_to_hiragana("ヷ"), "ヷ");
        assert_eq!(katakana_to_hiragana("・"), "・");
    }

    #[test]
    fn test_char_classification() {
        assert!(is_hiragana('あ'));
        assert!(!is_hiragana('ア'));
        assert!(is_katakana('ア'));
        assert!(is_katakana('ー'));
        assert!(is_kana('ん'));
        assert!(is_kanji('漢'));
        assert!(!is_kanji('a'));
    }
}
