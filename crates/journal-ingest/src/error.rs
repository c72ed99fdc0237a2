//! Error types for journal extraction.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading journal entries.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The database file does not exist.
    #[error("database not found: {path}")]
    DatabaseNotFound { path: PathBuf },

    /// Table names are interpolated into SQL, so only plain identifiers pass.
    #[error("invalid table name '{name}'")]
    InvalidTableName { name: String },

    /// Opening, preparing or stepping a query failed.
    #[error("SQLite error on {path}: {source}")]
    Sqlite {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

/// Convenience alias for ingest results.
pub type Result<T> = std::result::Result<T, IngestError>;
