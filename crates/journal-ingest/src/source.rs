//! SQLite journal source.

use std::path::{Path, PathBuf};

use journal_model::RawRecord;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row};
use tracing::{debug, info};

use crate::error::{IngestError, Result};

/// Table read when none is configured.
pub const DEFAULT_TABLE: &str = "journal_entries";

/// A read-only handle on a journal database.
#[derive(Debug)]
pub struct JournalSource {
    conn: Connection,
    path: PathBuf,
    table: String,
}

impl JournalSource {
    /// Open an existing database read-only.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::DatabaseNotFound`] when the file is missing and
    /// [`IngestError::Sqlite`] when SQLite cannot open it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(IngestError::DatabaseNotFound {
                path: path.to_path_buf(),
            });
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|source| IngestError::Sqlite {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened journal database");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
            table: DEFAULT_TABLE.to_string(),
        })
    }

    /// Read from `table` instead of [`DEFAULT_TABLE`].
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidTableName`] unless the name is made of
    /// ASCII letters, digits and underscores and does not start with a digit.
    pub fn with_table(mut self, table: &str) -> Result<Self> {
        let valid = !table.is_empty()
            && !table.starts_with(|c: char| c.is_ascii_digit())
            && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(IngestError::InvalidTableName {
                name: table.to_string(),
            });
        }
        self.table = table.to_string();
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Number of rows in the table.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Sqlite`] if the query fails.
    pub fn count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", self.table);
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|source| self.sqlite_error(source))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Read every row in rowid order.
    ///
    /// Values are handed over as text without validation: TEXT unchanged,
    /// INTEGER and REAL in decimal form, BLOB as lossy UTF-8, NULL as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Sqlite`] if the table or one of the four
    /// columns is missing, or reading a row fails.
    pub fn read_all(&self) -> Result<Vec<RawRecord>> {
        let sql = format!(
            "SELECT Date, Account, Amount, Description FROM \"{}\" ORDER BY rowid",
            self.table
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|source| self.sqlite_error(source))?;
        let rows = stmt
            .query_map([], raw_record_from_row)
            .map_err(|source| self.sqlite_error(source))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|source| self.sqlite_error(source))?);
        }
        info!(
            path = %self.path.display(),
            table = %self.table,
            records = records.len(),
            "extracted journal entries"
        );
        Ok(records)
    }

    fn sqlite_error(&self, source: rusqlite::Error) -> IngestError {
        IngestError::Sqlite {
            path: self.path.clone(),
            source,
        }
    }
}

/// Open `path` and read every entry of the default table.
///
/// # Errors
///
/// See [`JournalSource::open`] and [`JournalSource::read_all`].
pub fn read_journal_entries(path: impl AsRef<Path>) -> Result<Vec<RawRecord>> {
    JournalSource::open(path)?.read_all()
}

fn raw_record_from_row(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        date: value_to_text(row.get_ref(0)?),
        account: value_to_text(row.get_ref(1)?),
        amount: value_to_text(row.get_ref(2)?),
        description: value_to_text(row.get_ref(3)?),
    })
}

fn value_to_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(number) => Some(number.to_string()),
        ValueRef::Real(number) => Some(number.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_coercion() {
        assert_eq!(value_to_text(ValueRef::Null), None);
        assert_eq!(value_to_text(ValueRef::Integer(101)).as_deref(), Some("101"));
        assert_eq!(value_to_text(ValueRef::Real(100.5)).as_deref(), Some("100.5"));
        assert_eq!(
            value_to_text(ValueRef::Text(b"2024-01-01")).as_deref(),
            Some("2024-01-01")
        );
        assert_eq!(value_to_text(ValueRef::Blob(b"abc")).as_deref(), Some("abc"));
    }

    #[test]
    fn test_missing_database() {
        let err = JournalSource::open("/definitely/not/here.db").unwrap_err();
        assert!(matches!(err, IngestError::DatabaseNotFound { .. }));
    }
}
