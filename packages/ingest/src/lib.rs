#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Extracts keyword records from a directory of PDFs and writes them to a
//! document store collection or a JSON file.

pub mod config;
pub mod sink;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use pdf_records_database::{DbError, DocumentStore};
use pdf_records_extract::{ExtractError, RecordExtractor};
use pdf_records_pdf::progress::ProgressCallback;
use pdf_records_pdf::{PdfDirectory, PdfError, TextSource};
use pdf_records_record_models::{KeywordError, KeywordList};

pub use config::{IngestConfig, SinkConfig, SinkOptions};
pub use sink::{CollectionSink, JsonFileSink, RecordSink, SinkReport};

/// Errors that can occur during an ingest run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Invalid or contradictory options.
    #[error("{message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// The keyword list is unusable.
    #[error("Invalid keywords: {0}")]
    Keywords(#[from] KeywordError),

    /// The extractor could not be built.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Reading the PDFs failed.
    #[error(transparent)]
    Pdf(#[from] PdfError),

    /// A document store operation failed.
    #[error(transparent)]
    Database(#[from] DbError),

    /// The output file could not be written.
    #[error("Failed to write {}: {source}", .path.display())]
    Output {
        /// The output file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The records could not be serialized.
    #[error("Failed to serialize {count} records: {source}")]
    Serialize {
        /// Number of records being serialized.
        count: usize,
        /// Underlying serialization error.
        source: serde_json::Error,
    },
}

impl IngestError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Counts reported by a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Records extracted from the text.
    pub extracted: u64,
    /// Records newly stored.
    pub written: u64,
    /// Records merged into existing documents.
    pub updated: u64,
}

/// Fetches the text from `source`, extracts records for `keywords` and
/// hands them to `sink`.
///
/// The extractor is built before the source is read, so keyword problems
/// are reported without touching any files.
///
/// # Errors
///
/// Returns the first error from the extractor, the source or the sink.
/// Nothing is written when the source fails.
pub fn run(
    source: &dyn TextSource,
    keywords: &KeywordList,
    sink: &dyn RecordSink,
) -> Result<IngestSummary, IngestError> {
    let start = Instant::now();
    let extractor = RecordExtractor::new(keywords.clone())?;

    log::info!("Reading PDFs from {}", source.describe());
    let text = source.fetch_text()?;

    let records = extractor.extract(&text);
    log::info!("Found {} records", records.len());

    log::info!("Writing to {}", sink.describe());
    let report = sink.write(&records)?;

    log::info!(
        "Run complete: {} extracted, {} written, {} updated in {:.1}s",
        records.len(),
        report.written,
        report.updated,
        start.elapsed().as_secs_f64()
    );

    Ok(IngestSummary {
        extracted: records.len() as u64,
        written: report.written,
        updated: report.updated,
    })
}

/// Runs a fully configured ingest against the PDF directory in `config`.
///
/// In collection mode the store is opened before any PDF is read, so
/// connection problems fail fast, and it is closed again whether or not
/// the run succeeded.
///
/// # Errors
///
/// Returns [`IngestError`] if the store cannot be opened, the run fails,
/// or closing the store fails after an otherwise successful run.
pub fn ingest(
    config: &IngestConfig,
    progress: Arc<dyn ProgressCallback>,
) -> Result<IngestSummary, IngestError> {
    let source = PdfDirectory::new(&config.pdf_dir).with_progress(progress);

    match &config.sink {
        SinkConfig::JsonFile { path } => run(&source, &config.keywords, &JsonFileSink::new(path)),
        SinkConfig::Collection {
            store,
            collection,
            dedup_key,
        } => {
            let store = DocumentStore::open(store)?;

            let result = run(
                &source,
                &config.keywords,
                &CollectionSink::new(&store, collection.as_str(), dedup_key.clone()),
            );

            match (result, store.close()) {
                (Ok(summary), Ok(())) => Ok(summary),
                (Ok(_), Err(e)) => Err(e.into()),
                (Err(e), close) => {
                    if let Err(close_err) = close {
                        log::warn!("Failed to close document store: {close_err}");
                    }
                    Err(e)
                }
            }
        }
    }
}
