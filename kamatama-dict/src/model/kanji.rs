use serde::{Deserialize, Deserializer, Serialize, de};

/// Radical classification used for compound radical search.
pub const CLASSICAL_RADICAL: &str = "classical";

/// A `{type, value}` pair as used by codepoints, radicals and variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KanjiMisc {
    pub grade: Option<u8>,
    pub stroke_count: Vec<u32>,
    pub variant: Vec<TypedValue>,
    pub freq: Option<u32>,
    pub radical_name: Vec<String>,
    pub jlpt: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryReference {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default)]
    pub m_vol: Option<u32>,
    #[serde(default)]
    pub m_page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCode {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default)]
    pub skip_misclass: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingType {
    Pinyin,
    KoreanR,
    KoreanH,
    Vietnam,
    JaOn,
    JaKun,
    #[serde(other)]
    Other,
}

impl ReadingType {
    /// On'yomi and kun'yomi, the readings searched by the character index.
    pub fn is_japanese(self) -> bool {
        matches!(self, ReadingType::JaOn | ReadingType::JaKun)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KanjiReading {
    #[serde(rename = "type")]
    pub kind: ReadingType,
    pub value: String,
    #[serde(default)]
    pub on_type: Option<String>,
    #[serde(default)]
    pub r_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanjiMeaning {
    #[serde(default)]
    pub language: Option<String>,
    pub value: String,
}

/// Readings grouped with the meanings they carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingMeaningGroup {
    pub reading: Vec<KanjiReading>,
    #[serde(default, alias = "meaninig")]
    pub meaning: Vec<KanjiMeaning>,
}

/// A reading only used in names (nanori).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameOnlyReading {
    pub value: String,
}

/// One element of a character's `readingMeaning` list.
///
/// The corpus does not tag these. The presence of a `reading` key is the
/// discriminant: with it the element must parse as a group, without it as a
/// name-only reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReadingMeaning {
    Group(ReadingMeaningGroup),
    NameOnly(NameOnlyReading),
}

impl<'de> Deserialize<'de> for ReadingMeaning {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.get("reading").is_some() {
            serde_json::from_value(value)
                .map(ReadingMeaning::Group)
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(ReadingMeaning::NameOnly)
                .map_err(de::Error::custom)
        }
    }
}

/// A KANJIDIC2 character as distributed in the character corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KanjiCharacter {
    pub literal: String,
    #[serde(default)]
    pub codepoint: Vec<TypedValue>,
    #[serde(default)]
    pub radical: Vec<TypedValue>,
    #[serde(default)]
    pub misc: KanjiMisc,
    #[serde(default)]
    pub dictionary_number: Vec<DictionaryReference>,
    #[serde(default)]
    pub query_code: Vec<QueryCode>,
    #[serde(default)]
    pub reading_meaning: Vec<ReadingMeaning>,
}

impl KanjiCharacter {
    /// Classical radical codes this character is indexed under.
    pub fn radical_codes(&self) -> impl Iterator<Item = &str> {
        self.radical
            .iter()
            .filter(|r| r.kind == CLASSICAL_RADICAL)
            .map(|r| r.value.as_str())
    }

    /// English meanings across all reading/meaning groups.
    pub fn meanings(&self) -> impl Iterator<Item = &str> {
        self.reading_meaning
            .iter()
            .filter_map(|rm| match rm {
                ReadingMeaning::Group(group) => Some(group),
                ReadingMeaning::NameOnly(_) => None,
            })
            .flat_map(|group| {
                group
                    .meaning
                    .iter()
                    .filter(|m| m.language.is_none())
                    .map(|m| m.value.as_str())
            })
    }
}
