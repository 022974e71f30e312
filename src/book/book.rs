//! The owned, append-only entry collection.
//!
//! [`Wordbook`] replaces a shared mutable global with a value the
//! application owns outright: created once at startup, mutated only through
//! [`append`](Wordbook::append), read by the filter.  Insertion order is
//! display order; entries are never edited or removed.

use thiserror::Error;

use super::entry::Entry;

/// Starter collection compiled into the binary, used on first run when no
/// saved collection exists yet.
const SEED_JSON: &str = include_str!("../../assets/wordbook.seed.json");

// ---------------------------------------------------------------------------
// BookError
// ---------------------------------------------------------------------------

/// Validation failures for the add-entry path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BookError {
    /// The entry's word is empty (or whitespace only).
    #[error("an entry needs a word")]
    MissingWord,

    /// The entry's definition is empty (or whitespace only).
    #[error("an entry needs a definition")]
    MissingDefinition,
}

// ---------------------------------------------------------------------------
// Wordbook
// ---------------------------------------------------------------------------

/// The full ordered collection of entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wordbook {
    entries: Vec<Entry>,
}

impl Wordbook {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap already-stored entries.
    ///
    /// Load paths trust their input: no validation is applied here, only
    /// [`append`](Wordbook::append) validates.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// The bundled starter collection.
    ///
    /// Falls back to an empty collection if the compiled-in seed asset does
    /// not parse, which would indicate a broken build rather than a user
    /// error.
    pub fn seed() -> Self {
        match serde_json::from_str::<Vec<Entry>>(SEED_JSON) {
            Ok(entries) => Self { entries },
            Err(e) => {
                log::warn!("bundled seed collection did not parse ({e}); starting empty");
                Self::new()
            }
        }
    }

    /// Append a new entry, validating the add-entry invariant: `word` and
    /// `definition` must be non-empty after trimming.
    ///
    /// On error the collection is unchanged.
    pub fn append(&mut self, entry: Entry) -> Result<(), BookError> {
        if entry.word.trim().is_empty() {
            return Err(BookError::MissingWord);
        }
        if entry.definition.trim().is_empty() {
            return Err(BookError::MissingDefinition);
        }
        self.entries.push(entry);
        Ok(())
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
