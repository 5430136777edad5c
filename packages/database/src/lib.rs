#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `DuckDB` document store for extracted records.
//!
//! Records are schemaless (any subset of the configured keywords), so they
//! are stored as documents: one row per document in `documents`, one row
//! per field in `fields`. Documents are grouped into named collections and
//! upserted on an explicit dedup key.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `DATABASE_URI` | `data/pdf_records.duckdb` | `DuckDB` file path or `:memory:` |
//! | `DATABASE_NAME` | `pdf_data` | Schema holding the document tables |
//!
//! The `pdf_records` binary loads a `.env` file from the working directory
//! first; variables already set in the environment take precedence.

pub mod config;
pub mod store;

pub use config::{StoreConfig, StoreLocation};
pub use store::{DocumentStore, UpsertOutcome};

/// Errors that can occur during document store operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    /// Opening or pinging the database failed.
    #[error("Failed to connect to {uri}: {source}")]
    Connect {
        /// The connection URI that was used.
        uri: String,
        /// Underlying `DuckDB` error.
        source: duckdb::Error,
    },

    /// The connection URI is empty.
    #[error("Invalid database URI: {uri:?}")]
    InvalidUri {
        /// The rejected URI.
        uri: String,
    },

    /// The database name is not a plain identifier.
    #[error("Invalid database name {name:?}: expected letters, digits and underscores")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// Stored data could not be converted back into a record.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// An I/O operation failed (e.g., creating the database directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
