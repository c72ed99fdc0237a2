//! Integration tests for reading journal databases.

use std::path::{Path, PathBuf};

use journal_ingest::{IngestError, JournalSource, read_journal_entries};
use rusqlite::{Connection, params};
use tempfile::TempDir;

fn create_db(dir: &Path, table: &str) -> PathBuf {
    let path = dir.join("journal.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE {table} (Date TEXT, Account TEXT, Amount TEXT, Description TEXT);"
    ))
    .unwrap();
    path
}

#[test]
fn reads_rows_in_insertion_order() {
    let dir = TempDir::new().unwrap();
    let path = create_db(dir.path(), "journal_entries");
    let conn = Connection::open(&path).unwrap();
    for (date, account, amount, description) in [
        ("2024-01-01", "101", "100.50", "Opening balance"),
        ("12/31/2023", "202", "1,20", "Deposit"),
        ("31-12-2023", "303", "-25.50", "Withdrawal"),
    ] {
        conn.execute(
            "INSERT INTO journal_entries VALUES (?1, ?2, ?3, ?4)",
            params![date, account, amount, description],
        )
        .unwrap();
    }
    drop(conn);

    let records = read_journal_entries(&path).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].date.as_deref(), Some("2024-01-01"));
    assert_eq!(records[1].amount.as_deref(), Some("1,20"));
    assert_eq!(records[2].description.as_deref(), Some("Withdrawal"));
}

#[test]
fn non_text_values_are_coerced() {
    let dir = TempDir::new().unwrap();
    let path = create_db(dir.path(), "journal_entries");
    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "INSERT INTO journal_entries VALUES ('2024-01-01', 101, 100.5, NULL)",
        [],
    )
    .unwrap();
    drop(conn);

    let records = read_journal_entries(&path).unwrap();
    assert_eq!(records[0].account.as_deref(), Some("101"));
    assert_eq!(records[0].amount.as_deref(), Some("100.5"));
    assert_eq!(records[0].description, None);
}

#[test]
fn empty_table_yields_no_records() {
    let dir = TempDir::new().unwrap();
    let path = create_db(dir.path(), "journal_entries");
    let source = JournalSource::open(&path).unwrap();
    assert_eq!(source.count().unwrap(), 0);
    assert!(source.read_all().unwrap().is_empty());
}

#[test]
fn custom_table_name() {
    let dir = TempDir::new().unwrap();
    let path = create_db(dir.path(), "ledger_2024");
    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "INSERT INTO ledger_2024 VALUES ('2024-01-01', '101', '1', 'x')",
        [],
    )
    .unwrap();
    drop(conn);

    let source = JournalSource::open(&path)
        .unwrap()
        .with_table("ledger_2024")
        .unwrap();
    assert_eq!(source.table(), "ledger_2024");
    assert_eq!(source.count().unwrap(), 1);
    assert_eq!(source.read_all().unwrap().len(), 1);
}

#[test]
fn unsafe_table_names_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = create_db(dir.path(), "journal_entries");
    for name in ["", "entries; DROP TABLE x", "1st", "a\"b"] {
        let err = JournalSource::open(&path)
            .unwrap()
            .with_table(name)
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidTableName { .. }), "{name:?}");
    }
}

#[test]
fn missing_table_is_a_sqlite_error() {
    let dir = TempDir::new().unwrap();
    let path = create_db(dir.path(), "other");
    let err = read_journal_entries(&path).unwrap_err();
    assert!(matches!(err, IngestError::Sqlite { .. }));
}

#[test]
fn missing_file_is_not_created() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.db");
    let err = JournalSource::open(&path).unwrap_err();
    assert!(matches!(err, IngestError::DatabaseNotFound { .. }));
    assert!(!path.exists());
}
