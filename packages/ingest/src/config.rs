//! Run configuration.
//!
//! Everything a run needs is resolved here once, before any I/O, so that
//! configuration mistakes fail fast.

use std::path::PathBuf;

use pdf_records_database::StoreConfig;
use pdf_records_record_models::{Keyword, KeywordList};

use crate::IngestError;

/// Where extracted records go. Exactly one per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    /// Upsert into a document store collection.
    Collection {
        /// Connection settings.
        store: StoreConfig,
        /// Collection name.
        collection: String,
        /// Keyword whose value identifies an existing document.
        dedup_key: Keyword,
    },
    /// Overwrite a JSON file with the full record list.
    JsonFile {
        /// Output path.
        path: PathBuf,
    },
}

/// Raw sink options as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct SinkOptions {
    /// `--collection`
    pub collection: Option<String>,
    /// `--json-file`
    pub json_file: Option<PathBuf>,
    /// `--dedup-key`; the anchor keyword when unset.
    pub dedup_key: Option<String>,
    /// `--database-uri`
    pub database_uri: Option<String>,
    /// `--database`
    pub database: Option<String>,
}

/// A fully validated run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Directory holding the PDF files.
    pub pdf_dir: PathBuf,
    /// Keywords to extract; the first one anchors records.
    pub keywords: KeywordList,
    /// Output target.
    pub sink: SinkConfig,
}

impl IngestConfig {
    /// Validates the raw options.
    ///
    /// Store settings are only resolved (overrides, then environment, then
    /// defaults) in collection mode; JSON mode ignores them.
    ///
    /// # Errors
    ///
    /// * [`IngestError::Keywords`] if `keywords` has no usable label or
    ///   contains duplicates
    /// * [`IngestError::Config`] if neither or both sinks are chosen, the
    ///   collection name is blank, or the dedup key is not a keyword
    /// * [`IngestError::Database`] if the store settings are invalid
    pub fn new(
        pdf_dir: impl Into<PathBuf>,
        keywords: &str,
        options: SinkOptions,
    ) -> Result<Self, IngestError> {
        let keywords: KeywordList = keywords.parse()?;

        let sink = match (options.collection, options.json_file) {
            (Some(_), Some(_)) => {
                return Err(IngestError::config(
                    "Cannot use both --collection and --json-file. Choose one.",
                ));
            }
            (None, None) => {
                return Err(IngestError::config(
                    "Either --collection or --json-file must be provided.",
                ));
            }
            (None, Some(path)) => SinkConfig::JsonFile { path },
            (Some(collection), None) => {
                let collection = collection.trim().to_owned();
                if collection.is_empty() {
                    return Err(IngestError::config("Collection name must not be empty."));
                }

                let dedup_key = match options.dedup_key.as_deref() {
                    None => keywords.anchor().clone(),
                    Some(label) => keywords.get(label).cloned().ok_or_else(|| {
                        IngestError::config(format!(
                            "Dedup key '{}' is not one of the keywords: {keywords}",
                            label.trim()
                        ))
                    })?,
                };

                let store = StoreConfig::resolve(options.database_uri, options.database)?;

                SinkConfig::Collection {
                    store,
                    collection,
                    dedup_key,
                }
            }
        };

        Ok(Self {
            pdf_dir: pdf_dir.into(),
            keywords,
            sink,
        })
    }
}
