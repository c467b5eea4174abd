use std::collections::HashMap;
use std::sync::OnceLock;

use crate::table::{MAPPINGS, MAX_KEY_LEN};

fn mappings() -> &'static HashMap<&'static str, &'static str> {
    static INSTANCE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    INSTANCE.get_or_init(|| MAPPINGS.iter().copied().collect())
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'i' | 'u' | 'e' | 'o')
}

fn is_consonant(c: char) -> bool {
    c.is_ascii_lowercase() && !is_vowel(c)
}

fn is_romaji(c: char) -> bool {
    c.is_ascii_lowercase() || c == '-' || c == '\''
}

/// Convert romaji spelled anywhere in `input` to hiragana.
///
/// ASCII letters are case-folded first. Anything that does not spell a kana
/// (kana, kanji, digits, stray consonants) is copied to the output unchanged,
/// so partially typed input such as `"tab"` becomes `"たb"`.
pub fn romaji_to_hiragana(input: &str) -> String {
    let table = mappings();
    let chars: Vec<char> = input.chars().map(|c| c.to_ascii_lowercase()).collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !is_romaji(c) {
            out.push(c);
            i += 1;
            continue;
        }

        if c == 'n' {
            match chars.get(i + 1).copied() {
                // "nn" before a vowel or y: the second n starts the next mora ("konnichi")
                Some('n') => {
                    let next_starts_mora = chars
                        .get(i + 2)
                        .is_some_and(|&after| is_vowel(after) || after == 'y');
                    out.push('ん');
                    i += if next_starts_mora { 1 } else { 2 };
                    continue;
                }
                Some('\'') => {
                    out.push('ん');
                    i += 2;
                    continue;
                }
                Some(next) if is_vowel(next) || next == 'y' => {}
                _ => {
                    out.push('ん');
                    i += 1;
                    continue;
                }
            }
        }

        // Sokuon: doubled consonant, or "tch" as in "matcha".
        if is_consonant(c) {
            if let Some(&next) = chars.get(i + 1) {
                if next == c || (c == 't' && next == 'c') {
                    out.push('っ');
                    i += 1;
                    continue;
                }
            }
        }

        let longest = MAX_KEY_LEN.min(chars.len() - i);
        let matched = (1..=longest).rev().find_map(|len| {
            let key: String = chars[i..i + len].iter().collect();
            table.get(key.as_str()).map(|kana| (*kana, len))
        });

        match matched {
            Some((kana, len)) => {
                out.push_str(kana);
                i += len;
            }
            None => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}
