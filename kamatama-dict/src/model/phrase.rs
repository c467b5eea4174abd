use serde::{Deserialize, Serialize};

/// Stable JMdict entry identifier.
pub type SequenceNumber = i64;

/// A written (kanji) form of a phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KanjiElement {
    pub value: String,
    #[serde(default)]
    pub information: Vec<String>,
    /// Priority tags such as `news1` or `ichi1`
    #[serde(default)]
    pub priority: Vec<String>,
}

/// A phonetic (kana) reading of a phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingElement {
    pub value: String,
    /// The reading is not a true reading of any written form
    #[serde(default)]
    pub no_kanji: bool,
    /// Written forms this reading is restricted to
    #[serde(default)]
    pub restriction: Vec<String>,
    #[serde(default)]
    pub information: Vec<String>,
    #[serde(default)]
    pub priority: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLanguage {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    /// `full` or `part`
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub wasei: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gloss {
    pub value: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// One meaning of a phrase: glossary text plus categorical tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sense {
    /// Written forms this sense is restricted to
    pub kanji: Vec<String>,
    /// Readings this sense is restricted to
    pub reading: Vec<String>,
    pub reference: Vec<String>,
    pub antonym: Vec<String>,
    pub part_of_speech: Vec<String>,
    pub field: Vec<String>,
    pub misc: Vec<String>,
    pub source_language: Vec<SourceLanguage>,
    pub dialect: Vec<String>,
    pub glossary: Vec<Gloss>,
    pub information: Vec<String>,
}

/// A JMdict entry as distributed in the phrase corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseEntry {
    pub sequence_number: SequenceNumber,
    #[serde(default)]
    pub kanji: Vec<KanjiElement>,
    #[serde(default)]
    pub reading: Vec<ReadingElement>,
    #[serde(default)]
    pub sense: Vec<Sense>,
}

impl PhraseEntry {
    /// Every surface form and reading, written forms first.
    pub fn forms(&self) -> impl Iterator<Item = &str> {
        self.kanji
            .iter()
            .map(|k| k.value.as_str())
            .chain(self.reading.iter().map(|r| r.value.as_str()))
    }

    /// Entries must carry at least one reading and one sense.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.reading.is_empty() {
            Err("entry has no reading")
        } else if self.sense.is_empty() {
            Err("entry has no sense")
        } else {
            Ok(())
        }
    }

    /// Glosses of every sense, in order.
    pub fn glosses(&self) -> impl Iterator<Item = &str> {
        self.sense
            .iter()
            .flat_map(|s| s.glossary.iter().map(|g| g.value.as_str()))
    }
}
