//! Document storage and upserts.
//!
//! Layout inside the configured schema:
//!
//! * `documents(id, collection)`: one row per stored record
//! * `fields(document_id, collection, key, value, position)`: one row per
//!   field, `position` preserving the record's key order
//!
//! Upserts merge by overwrite via `ON CONFLICT (document_id, key)`.

use std::path::Path;

use duckdb::{Connection, params};
use pdf_records_record_models::{Keyword, Record};

use crate::DbError;
use crate::config::{StoreConfig, StoreLocation};

/// Counts reported by [`DocumentStore::upsert_records`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Records stored as new documents.
    pub inserted: u64,
    /// Records merged into an existing document.
    pub updated: u64,
}

/// An open connection to the document store.
///
/// The connection is released by [`DocumentStore::close`], or when the
/// store is dropped on any other path.
pub struct DocumentStore {
    conn: Connection,
    uri: String,
    schema: String,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("uri", &self.uri)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl DocumentStore {
    /// Opens (or creates) the store described by `config`, verifies the
    /// connection and ensures the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connect`] if the database cannot be opened or
    /// pinged, [`DbError::Io`] if its directory cannot be created and
    /// [`DbError::Database`] if schema creation fails.
    pub fn open(config: &StoreConfig) -> Result<Self, DbError> {
        let connect_error = |source: duckdb::Error| DbError::Connect {
            uri: config.uri().to_owned(),
            source,
        };

        let conn = match config.location() {
            StoreLocation::Memory => Connection::open_in_memory().map_err(connect_error)?,
            StoreLocation::File(path) => {
                if let Some(parent) = path.parent() {
                    ensure_dir(parent)?;
                }
                Connection::open(&path).map_err(connect_error)?
            }
        };

        conn.query_row("SELECT 1", params![], |row| row.get::<_, i32>(0))
            .map_err(connect_error)?;

        let store = Self {
            conn,
            uri: config.uri().to_owned(),
            schema: config.database().to_owned(),
        };
        store.create_schema()?;

        log::info!("Connected to document store: {} ({})", store.schema, store.uri);

        Ok(store)
    }

    fn create_schema(&self) -> Result<(), DbError> {
        let s = &self.schema;
        self.conn.execute_batch(&format!(
            "CREATE SCHEMA IF NOT EXISTS \"{s}\";

             CREATE TABLE IF NOT EXISTS \"{s}\".documents (
                 id BIGINT NOT NULL PRIMARY KEY,
                 collection TEXT NOT NULL
             );

             CREATE TABLE IF NOT EXISTS \"{s}\".fields (
                 document_id BIGINT NOT NULL,
                 collection TEXT NOT NULL,
                 key TEXT NOT NULL,
                 value TEXT NOT NULL,
                 position BIGINT NOT NULL,
                 PRIMARY KEY (document_id, key)
             );"
        ))?;
        Ok(())
    }

    /// Upserts `records` into `collection`, deduplicating on `dedup_key`.
    ///
    /// For each record, the first document in the collection whose
    /// `dedup_key` field equals the record's value is merged with the
    /// record: present fields overwrite, absent fields stay untouched. With
    /// no such document the record is inserted. Records without the dedup
    /// key are inserted unconditionally. Records are processed in order,
    /// so repeated keys within one batch merge into the first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on the first failed statement; records before it
    /// stay written.
    pub fn upsert_records(
        &self,
        collection: &str,
        dedup_key: &Keyword,
        records: &[Record],
    ) -> Result<UpsertOutcome, DbError> {
        let mut outcome = UpsertOutcome::default();

        if records.is_empty() {
            log::info!("No records to insert.");
            return Ok(outcome);
        }

        for record in records {
            let existing = match record.get(dedup_key.as_str()) {
                Some(value) => self.find_document(collection, dedup_key.as_str(), value)?,
                None => {
                    log::debug!("Record has no '{dedup_key}' field; inserting without lookup");
                    None
                }
            };

            if let Some(id) = existing {
                self.write_fields(id, collection, record)?;
                outcome.updated += 1;
            } else {
                self.insert_document(collection, record)?;
                outcome.inserted += 1;
            }
        }

        log::info!(
            "Inserted {} new records, updated {} existing records.",
            outcome.inserted,
            outcome.updated
        );

        Ok(outcome)
    }

    /// Finds the oldest document in `collection` whose `key` field equals
    /// `value`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn find_document(
        &self,
        collection: &str,
        key: &str,
        value: &str,
    ) -> Result<Option<i64>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT document_id FROM \"{}\".fields
             WHERE collection = ? AND key = ? AND value = ?
             ORDER BY document_id
             LIMIT 1",
            self.schema
        ))?;

        let mut rows = stmt.query(params![collection, key, value])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn insert_document(&self, collection: &str, record: &Record) -> Result<i64, DbError> {
        // Single writer per run, so MAX + 1 cannot race.
        let id: i64 = self.conn.query_row(
            &format!(
                "SELECT COALESCE(MAX(id), 0) + 1 FROM \"{}\".documents",
                self.schema
            ),
            params![],
            |row| row.get(0),
        )?;

        self.conn.execute(
            &format!(
                "INSERT INTO \"{}\".documents (id, collection) VALUES (?, ?)",
                self.schema
            ),
            params![id, collection],
        )?;

        self.write_fields(id, collection, record)?;

        Ok(id)
    }

    /// Writes every field of `record` onto document `id`.
    ///
    /// Existing keys keep their position and get the new value; new keys
    /// are appended after the current last field.
    fn write_fields(&self, id: i64, collection: &str, record: &Record) -> Result<(), DbError> {
        let next_position: i64 = self.conn.query_row(
            &format!(
                "SELECT COALESCE(MAX(position), -1) + 1 FROM \"{}\".fields WHERE document_id = ?",
                self.schema
            ),
            params![id],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(&format!(
            "INSERT INTO \"{}\".fields (document_id, collection, key, value, position)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (document_id, key) DO UPDATE SET value = EXCLUDED.value",
            self.schema
        ))?;

        for (offset, (key, value)) in (0_i64..).zip(record.iter()) {
            stmt.execute(params![
                id,
                collection,
                key.as_str(),
                value,
                next_position + offset
            ])?;
        }

        Ok(())
    }

    /// Reads back every document in `collection`, oldest first, with keys
    /// in stored order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or a stored key is blank.
    pub fn documents(&self, collection: &str) -> Result<Vec<Record>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT d.id, f.key, f.value
             FROM \"{s}\".documents d
             LEFT JOIN \"{s}\".fields f ON f.document_id = d.id
             WHERE d.collection = ?
             ORDER BY d.id, f.position",
            s = self.schema
        ))?;

        let mut documents: Vec<Record> = Vec::new();
        let mut current_id: Option<i64> = None;

        let mut rows = stmt.query(params![collection])?;
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let key: Option<String> = row.get(1)?;
            let value: Option<String> = row.get(2)?;

            if current_id != Some(id) {
                documents.push(Record::new());
                current_id = Some(id);
            }

            if let (Some(key), Some(value), Some(document)) = (key, value, documents.last_mut()) {
                let keyword = Keyword::new(&key).map_err(|e| DbError::Conversion {
                    message: format!("document {id} has invalid key {key:?}: {e}"),
                })?;
                document.insert(keyword, value);
            }
        }

        Ok(documents)
    }

    /// Number of documents in `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn count_documents(&self, collection: &str) -> Result<u64, DbError> {
        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM \"{}\".documents WHERE collection = ?",
                self.schema
            ),
            params![collection],
            |row| row.get(0),
        )?;

        u64::try_from(count).map_err(|e| DbError::Conversion {
            message: format!("negative document count {count}: {e}"),
        })
    }

    /// Closes the connection, reporting any error raised while closing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Database`] if `DuckDB` fails to close cleanly.
    pub fn close(self) -> Result<(), DbError> {
        self.conn.close().map_err(|(_, e)| DbError::Database(e))?;
        log::info!("Document store connection closed.");
        Ok(())
    }
}

/// Ensures a directory exists, creating it if necessary.
fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
