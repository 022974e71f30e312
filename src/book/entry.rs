//! The dictionary entry record.
//!
//! [`Entry`] serializes with short field names (`pos`, `pron`, `def`), the
//! layout of `wordbook.json` files — saved collections and exports share
//! one format.

use serde::{Deserialize, Serialize};

/// One dictionary record: headword, optional tags, definition, examples.
///
/// `word` and `definition` are required for entries added through the form;
/// entries loaded from a stored collection are taken as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// The headword.
    pub word: String,

    /// Short part-of-speech tag (e.g. `"noun"`).
    #[serde(rename = "pos", default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,

    /// Pronunciation hint (e.g. `"/kæt/"`).
    #[serde(rename = "pron", default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,

    /// The definition text.
    #[serde(rename = "def")]
    pub definition: String,

    /// Usage examples, in display order.  May be empty.
    #[serde(default)]
    pub examples: Vec<String>,
}

impl Entry {
    /// Build a minimal entry with just a word and a definition.
    pub fn new(word: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            part_of_speech: None,
            pronunciation: None,
            definition: definition.into(),
            examples: Vec::new(),
        }
    }

    /// The examples joined into one utterance, the way the narrator reads
    /// them (`"First example. Second example."`).
    pub fn examples_utterance(&self) -> String {
        self.examples.join(". ")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
