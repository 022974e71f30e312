//! Substring filter over the entry collection.
//!
//! [`filter`] is a pure function of `(entries, query)`: it returns the
//! entries whose searchable text contains the normalized query, in the
//! collection's original order.  It never fails — an empty result is a
//! valid answer, not an error.
//!
//! The searchable text of an entry is its word, its definition, and its
//! examples joined with spaces, all compared lowercased.

use crate::book::Entry;

/// Normalize a raw query string: trim surrounding whitespace, lowercase.
///
/// An empty normalized query matches every entry.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Does `entry` match the already-normalized `needle`?
fn entry_matches(entry: &Entry, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    entry.word.to_lowercase().contains(needle)
        || entry.definition.to_lowercase().contains(needle)
        || entry.examples.join(" ").to_lowercase().contains(needle)
}

/// Filter `entries` down to those matching `query`.
///
/// The result is a stable subsequence of `entries` — matching entries keep
/// their relative order and are never resorted.
///
/// ```
/// use wordbook::book::Entry;
/// use wordbook::search::filter;
///
/// let entries = vec![
///     Entry::new("cat", "a feline"),
///     Entry::new("dog", "a canine"),
/// ];
///
/// let hits = filter(&entries, "fe");
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].word, "cat");
/// ```
pub fn filter<'a>(entries: &'a [Entry], query: &str) -> Vec<&'a Entry> {
    let needle = normalize_query(query);
    entries
        .iter()
        .filter(|entry| entry_matches(entry, &needle))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
