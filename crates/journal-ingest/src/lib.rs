//! Journal entry extraction.
//!
//! Reads the `Date`, `Account`, `Amount` and `Description` columns of a
//! SQLite table into [`journal_model::RawRecord`]s without interpreting them.

pub mod error;
pub mod source;

pub use error::IngestError;
pub use source::{DEFAULT_TABLE, JournalSource, read_journal_entries};
