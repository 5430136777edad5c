#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the PDF record extraction tool.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use pdf_records_cli_utils::{IndicatifProgress, init_logger};
use pdf_records_ingest::{IngestConfig, IngestError, IngestSummary, SinkConfig, SinkOptions};

#[derive(Parser, Debug)]
#[command(
    name = "pdf_records",
    about = "Extract keyword records from PDF files into a document store or a JSON file"
)]
#[command(group(
    ArgGroup::new("output")
        .required(true)
        .args(["collection", "json_file"])
))]
struct Cli {
    /// Directory containing the PDF files
    #[arg(long)]
    pdf_dir: PathBuf,

    /// Comma-separated keywords; the first one starts a new record (e.g. "ID,Color,Model")
    #[arg(long)]
    keywords: String,

    /// Document store collection to upsert records into
    #[arg(long)]
    collection: Option<String>,

    /// JSON file to write records to (overwritten)
    #[arg(long)]
    json_file: Option<PathBuf>,

    /// Keyword identifying an existing document (defaults to the first keyword)
    #[arg(long, requires = "collection")]
    dedup_key: Option<String>,

    /// `DuckDB` file path or :memory: (overrides `DATABASE_URI`)
    #[arg(long)]
    database_uri: Option<String>,

    /// Schema holding the collections (overrides `DATABASE_NAME`)
    #[arg(long)]
    database: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<IngestConfig, IngestError> {
        IngestConfig::new(
            self.pdf_dir,
            &self.keywords,
            SinkOptions {
                collection: self.collection,
                json_file: self.json_file,
                dedup_key: self.dedup_key,
                database_uri: self.database_uri,
                database: self.database,
            },
        )
    }
}

fn describe_output(sink: &SinkConfig) -> String {
    match sink {
        SinkConfig::Collection {
            store, collection, ..
        } => format!("collection '{collection}' in {}", store.database()),
        SinkConfig::JsonFile { path } => format!("JSON file {}", path.display()),
    }
}

fn execute(
    cli: Cli,
    env_file: Result<PathBuf, dotenvy::Error>,
) -> Result<IngestSummary, IngestError> {
    let multi = init_logger();
    match env_file {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) => log::debug!("No .env file loaded: {e}"),
    }

    let config = cli.into_config()?;

    println!("Processing PDFs from: {}", config.pdf_dir.display());
    println!("Keywords: {}", config.keywords);
    println!("Output: {}", describe_output(&config.sink));

    let progress = IndicatifProgress::documents_bar(&multi, "Extracting text");

    pdf_records_ingest::ingest(&config, progress)
}

fn main() -> ExitCode {
    // Variables already set in the process environment win over the file.
    let env_file = dotenvy::dotenv();
    let cli = Cli::parse();

    match execute(cli, env_file) {
        Ok(summary) => {
            if summary.updated > 0 {
                log::info!("Updated {} existing records", summary.updated);
            }
            println!("Successfully processed {} records.", summary.written);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
