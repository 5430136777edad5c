//! Record sinks: document store upserts or a JSON file dump.

use std::path::{Path, PathBuf};

use pdf_records_database::DocumentStore;
use pdf_records_record_models::{Keyword, Record};

use crate::IngestError;

/// What a sink did with a batch of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkReport {
    /// Newly stored records (inserts, or records written to the file).
    pub written: u64,
    /// Records merged into existing documents.
    pub updated: u64,
}

/// Destination for extracted records.
pub trait RecordSink {
    /// Human-readable description used in log messages.
    fn describe(&self) -> String;

    /// Persists `records`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] if the records cannot be written.
    fn write(&self, records: &[Record]) -> Result<SinkReport, IngestError>;
}

/// Upserts records into one collection of an open [`DocumentStore`].
#[derive(Debug)]
pub struct CollectionSink<'a> {
    store: &'a DocumentStore,
    collection: String,
    dedup_key: Keyword,
}

impl<'a> CollectionSink<'a> {
    /// Creates a sink writing to `collection`, matching documents on
    /// `dedup_key`.
    #[must_use]
    pub fn new(
        store: &'a DocumentStore,
        collection: impl Into<String>,
        dedup_key: Keyword,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            dedup_key,
        }
    }
}

impl RecordSink for CollectionSink<'_> {
    fn describe(&self) -> String {
        format!("collection '{}'", self.collection)
    }

    fn write(&self, records: &[Record]) -> Result<SinkReport, IngestError> {
        let outcome = self
            .store
            .upsert_records(&self.collection, &self.dedup_key, records)?;

        Ok(SinkReport {
            written: outcome.inserted,
            updated: outcome.updated,
        })
    }
}

/// Overwrites a JSON file with the full record list on every run.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Creates a sink writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSink for JsonFileSink {
    fn describe(&self) -> String {
        format!("JSON file {}", self.path.display())
    }

    fn write(&self, records: &[Record]) -> Result<SinkReport, IngestError> {
        Ok(SinkReport {
            written: write_json_file(&self.path, records)?,
            updated: 0,
        })
    }
}

/// Writes `records` to `path` as a pretty-printed JSON array.
///
/// Parent directories are created and an existing file is replaced.
/// Non-ASCII characters are written as-is.
///
/// Returns the number of records written.
///
/// # Errors
///
/// Returns [`IngestError::Output`] if the directory or file cannot be
/// written and [`IngestError::Serialize`] if serialization fails.
pub fn write_json_file(path: &Path, records: &[Record]) -> Result<u64, IngestError> {
    let output_error = |source: std::io::Error| IngestError::Output {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(output_error)?;
    }

    let json = serde_json::to_string_pretty(records).map_err(|source| IngestError::Serialize {
        count: records.len(),
        source,
    })?;
    std::fs::write(path, json).map_err(output_error)?;

    log::info!("Wrote {} records to {}", records.len(), path.display());

    Ok(records.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_records_database::StoreConfig;
    use std::fs;

    fn record(fields: &[(&str, &str)]) -> Record {
        fields
            .iter()
            .map(|(k, v)| (Keyword::new(k).unwrap(), (*v).to_owned()))
            .collect()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pdf_records_sink_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn json_file_round_trips() {
        let dir = scratch_dir("round_trip");
        let path = dir.join("nested").join("cars.json");
        let records = vec![
            record(&[("ID", "101"), ("Color", "Red"), ("Model", "Civic")]),
            record(&[("ID", "103"), ("Color", "Grün")]),
        ];

        let written = JsonFileSink::new(&path).write(&records).unwrap();

        assert_eq!(written, SinkReport { written: 2, updated: 0 });
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"Grün\""));
        assert!(contents.starts_with("[\n  {\n    \"ID\": \"101\""));
        let parsed: Vec<Record> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed, records);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn json_file_is_overwritten_not_merged() {
        let dir = scratch_dir("overwrite");
        let path = dir.join("out.json");

        write_json_file(&path, &[record(&[("ID", "1")]), record(&[("ID", "2")])]).unwrap();
        let count = write_json_file(&path, &[record(&[("ID", "3")])]).unwrap();

        assert_eq!(count, 1);
        let parsed: Vec<Record> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, vec![record(&[("ID", "3")])]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_result_writes_empty_array() {
        let dir = scratch_dir("empty");
        let path = dir.join("out.json");

        assert_eq!(write_json_file(&path, &[]).unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn collection_sink_reports_inserts_and_updates() {
        let store = DocumentStore::open(&StoreConfig::in_memory("pdf_data").unwrap()).unwrap();
        let sink = CollectionSink::new(&store, "cars", Keyword::new("ID").unwrap());
        let records = [record(&[("ID", "1")]), record(&[("ID", "2")])];

        assert_eq!(sink.write(&records).unwrap(), SinkReport { written: 2, updated: 0 });
        assert_eq!(sink.write(&records).unwrap(), SinkReport { written: 0, updated: 2 });
        assert_eq!(sink.describe(), "collection 'cars'");
    }
}
