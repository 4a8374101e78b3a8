//! Append-only outcome records.
//!
//! One [`OutcomeRecord`] is appended per successfully stamped file. The
//! SQLite-backed [`SqliteRecordSink`] is a session: it is opened once at the
//! start of a batch, every append is committed before returning, and it is
//! closed when the batch ends.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identifier::Identifier;

/// Default store file, relative to the working directory.
pub const DEFAULT_STORE_PATH: &str = "codeabar.db";

/// Table holding one row per processed file.
pub const TABLE_NAME: &str = "codeabar";

/// On-disk representation of `process_date`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Durable log entry for one successfully processed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Source filename (no directory)
    pub file_name: String,
    /// Payload encoded into the stamped barcode
    pub identifier: Identifier,
    /// Local wall-clock time the file was processed
    pub processed_at: NaiveDateTime,
}

impl OutcomeRecord {
    /// Record stamped with the current local time.
    pub fn now(file_name: impl Into<String>, identifier: Identifier) -> Self {
        Self {
            file_name: file_name.into(),
            identifier,
            processed_at: Local::now().naive_local(),
        }
    }
}

/// A record read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
    /// Auto-incremented row id
    pub id: i64,
    /// The appended record
    #[serde(flatten)]
    pub record: OutcomeRecord,
}

/// Destination for outcome records.
pub trait RecordSink {
    /// Durably append one record.
    fn append(&mut self, record: &OutcomeRecord) -> Result<()>;

    /// End the session.
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// SQLite session over the record table.
#[derive(Debug)]
pub struct SqliteRecordSink {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteRecordSink {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let sink = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        sink.init_schema()?;
        log::debug!("Opened record store {}", path.display());
        Ok(sink)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let sink = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        sink.init_schema()?;
        Ok(sink)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {TABLE_NAME} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_name TEXT,
                barcode_num TEXT,
                process_date TIMESTAMP
            )"
        ))?;
        Ok(())
    }

    /// Store file location, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// All records in insertion order.
    pub fn records(&self) -> Result<Vec<StoredRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, file_name, barcode_num, process_date FROM {TABLE_NAME} ORDER BY id"
        ))?;
        let rows = stmt.query_map([], |row| {
            let barcode: String = row.get(2)?;
            let date: String = row.get(3)?;
            let processed_at = NaiveDateTime::parse_from_str(&date, TIMESTAMP_FORMAT)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
            let identifier = Identifier::new(barcode).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(
                    2,
                    "barcode_num".to_string(),
                    rusqlite::types::Type::Null,
                )
            })?;
            Ok(StoredRecord {
                id: row.get(0)?,
                record: OutcomeRecord {
                    file_name: row.get(1)?,
                    identifier,
                    processed_at,
                },
            })
        })?;
        let records = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {TABLE_NAME}"),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Write every record to `path` as a JSON array; returns the record count.
    pub fn export_json(&self, path: impl AsRef<Path>) -> Result<usize> {
        let records = self.records()?;
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(&mut writer, &records)?;
        writer.flush()?;
        Ok(records.len())
    }
}

impl RecordSink for SqliteRecordSink {
    fn append(&mut self, record: &OutcomeRecord) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO {TABLE_NAME} (file_name, barcode_num, process_date) VALUES (?1, ?2, ?3)"
            ),
            params![
                record.file_name,
                record.identifier.as_str(),
                record.processed_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }
}
