//! JSON persistence and export for the entry collection.
//!
//! [`BookStore`] owns the path of the saved collection file and treats it as
//! an opaque ordered list of entries.  `load` distinguishes "absent" (first
//! run — `Ok(None)`) from real failures; `save` is an idempotent full
//! rewrite, so saving the same collection twice produces the same file.
//!
//! Export serializes the current in-memory collection to pretty-printed
//! JSON — the same array layout the store reads back, and the same shape the
//! browser's downloadable `wordbook.json` had.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::book::Wordbook;
use super::entry::Entry;

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Failures of the collection store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The collection file exists but could not be read.
    #[error("could not read collection {path}: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The collection file exists but is not a valid entry list.
    #[error("collection {path} is not a valid entry list: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The collection could not be written.
    #[error("could not write collection {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// BookStore
// ---------------------------------------------------------------------------

/// Stores one named collection as a JSON file.
#[derive(Debug, Clone)]
pub struct BookStore {
    path: PathBuf,
}

impl BookStore {
    /// A store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the saved collection file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved collection.
    ///
    /// Returns `Ok(None)` when no file exists yet (first run).  A file that
    /// exists but cannot be read or parsed is an error — the caller decides
    /// how to degrade.
    pub fn load(&self) -> Result<Option<Wordbook>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let data = std::fs::read_to_string(&self.path).map_err(|source| {
            StoreError::Unavailable {
                path: self.path.display().to_string(),
                source,
            }
        })?;

        let entries: Vec<Entry> =
            serde_json::from_str(&data).map_err(|source| StoreError::Malformed {
                path: self.path.display().to_string(),
                source,
            })?;

        Ok(Some(Wordbook::from_entries(entries)))
    }

    /// Save the whole collection, creating parent directories as needed.
    pub fn save(&self, book: &Wordbook) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: self.path.display().to_string(),
                source,
            })?;
        }
        std::fs::write(&self.path, export_bytes(book)).map_err(|source| StoreError::Write {
            path: self.path.display().to_string(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Serialize `book` as pretty-printed JSON bytes.
///
/// Always reflects the collection passed in — there is no cached snapshot
/// anywhere in the store.
pub fn export_bytes(book: &Wordbook) -> Vec<u8> {
    // An entry list of strings and string vectors cannot fail to serialize.
    serde_json::to_vec_pretty(book.entries()).unwrap_or_default()
}

/// Write the exported collection to `path` (the user-facing download).
pub fn export_to(book: &Wordbook, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Write {
            path: path.display().to_string(),
            source,
        })?;
    }
    std::fs::write(path, export_bytes(book)).map_err(|source| StoreError::Write {
        path: path.display().to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_book() -> Wordbook {
        let mut book = Wordbook::new();
        book.append(Entry {
            word: "cat".into(),
            part_of_speech: Some("noun".into()),
            pronunciation: Some("/kæt/".into()),
            definition: "a feline".into(),
            examples: vec!["The cat sleeps.".into()],
        })
        .unwrap();
        book.append(Entry::new("dog", "a canine")).unwrap();
        book
    }

    #[test]
    fn load_missing_file_is_absent_not_error() {
        let dir = tempdir().expect("temp dir");
        let store = BookStore::new(dir.path().join("wordbook.json"));
        assert!(store.load().expect("absent is not an error").is_none());
    }

    #[test]
    fn save_then_load_round_trips_entries_and_order() {
        let dir = tempdir().expect("temp dir");
        let store = BookStore::new(dir.path().join("wordbook.json"));

        let book = sample_book();
        store.save(&book).expect("save");

        let loaded = store.load().expect("load").expect("present after save");
        assert_eq!(loaded, book);
        assert_eq!(loaded.entries()[0].word, "cat");
        assert_eq!(loaded.entries()[1].word, "dog");
    }

    #[test]
    fn save_is_idempotent() {
        let dir = tempdir().expect("temp dir");
        let store = BookStore::new(dir.path().join("wordbook.json"));

        let book = sample_book();
        store.save(&book).expect("first save");
        let first = std::fs::read(store.path()).expect("read");
        store.save(&book).expect("second save");
        let second = std::fs::read(store.path()).expect("read");

        assert_eq!(first, second);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempdir().expect("temp dir");
        let store = BookStore::new(dir.path().join("nested").join("deep").join("wordbook.json"));
        store.save(&sample_book()).expect("save into nested dir");
        assert!(store.path().exists());
    }

    #[test]
    fn load_malformed_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("wordbook.json");
        std::fs::write(&path, "{ not json").expect("write junk");

        let store = BookStore::new(&path);
        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn export_bytes_is_pretty_json_of_current_entries() {
        let book = sample_book();
        let bytes = export_bytes(&book);
        let text = String::from_utf8(bytes).expect("utf-8");

        // Pretty output spans multiple lines and carries the short field names.
        assert!(text.lines().count() > 1);
        assert!(text.contains("\"word\": \"cat\""));
        assert!(text.contains("\"def\": \"a canine\""));

        // And it parses back to the same collection.
        let parsed: Vec<Entry> = serde_json::from_str(&text).expect("parse back");
        assert_eq!(parsed, book.entries());
    }

    #[test]
    fn export_reflects_appends_made_after_a_save() {
        let dir = tempdir().expect("temp dir");
        let store = BookStore::new(dir.path().join("wordbook.json"));

        let mut book = sample_book();
        store.save(&book).expect("save");

        // Mutate in memory only, then export — the export must include the
        // new entry even though the store file does not.
        book.append(Entry::new("newt", "a small amphibian")).unwrap();
        let text = String::from_utf8(export_bytes(&book)).unwrap();
        assert!(text.contains("newt"));
    }

    #[test]
    fn export_to_writes_the_file() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("downloads").join("wordbook.json");

        export_to(&sample_book(), &path).expect("export");
        let parsed: Vec<Entry> =
            serde_json::from_slice(&std::fs::read(&path).expect("read")).expect("parse");
        assert_eq!(parsed.len(), 2);
    }
}
