//! The entry collection: records, ownership, persistence and export.
//!
//! * [`Entry`] — one dictionary record.
//! * [`Wordbook`] — the ordered, append-only collection the app owns.
//! * [`BookStore`] — JSON persistence keyed by a fixed collection name.
//! * [`export_bytes`] / [`export_to`] — the user-facing download.

pub mod book;
pub mod entry;
pub mod store;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use book::{BookError, Wordbook};
pub use entry::Entry;
pub use store::{export_bytes, export_to, BookStore, StoreError};
