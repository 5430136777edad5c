#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Text extraction from directories of PDF documents.
//!
//! Record extraction works on a single linear text blob. This crate
//! produces that blob from every `*.pdf` file in a directory using
//! pure-Rust text extraction ([`pdf_extract`]); no layout or table
//! information survives.
//!
//! The primary entry point is [`PdfDirectory`], which implements the
//! [`TextSource`] trait so the ingest pipeline can be driven by other
//! text sources in tests.

pub mod progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::progress::{ProgressCallback, null_progress};

/// Separator appended after each document's text.
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Errors specific to PDF text extraction.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// The source directory does not exist or is not a directory.
    #[error("Directory not found: {}", .path.display())]
    NotFound {
        /// The directory that was requested.
        path: PathBuf,
    },

    /// The directory contains no PDF files.
    #[error("No PDF files found in {}", .path.display())]
    NoInput {
        /// The directory that was scanned.
        path: PathBuf,
    },

    /// PDF text extraction failed.
    #[error("Error extracting text from {}: {message}", .path.display())]
    Extraction {
        /// The offending document.
        path: PathBuf,
        /// Description from the PDF parser.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// The file or directory being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Something that supplies one concatenated text blob for extraction.
pub trait TextSource {
    /// Human-readable description used in log messages.
    fn describe(&self) -> String;

    /// Produces the combined text.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if no input is available or any document
    /// cannot be read. No partial text is returned.
    fn fetch_text(&self) -> Result<String, PdfError>;
}

/// A directory of PDF files read as one text blob.
pub struct PdfDirectory {
    dir: PathBuf,
    progress: Arc<dyn ProgressCallback>,
}

impl PdfDirectory {
    /// Creates a text source over the PDFs in `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            progress: null_progress(),
        }
    }

    /// Reports one progress step per processed document.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }
}

impl std::fmt::Debug for PdfDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDirectory")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl TextSource for PdfDirectory {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn fetch_text(&self) -> Result<String, PdfError> {
        let files = list_pdfs(&self.dir)?;
        combine_documents(&files, self.progress.as_ref(), extract_text_from_pdf)
    }
}

/// Extracts every file in `files` with `extract` and concatenates the
/// texts in the given order, each followed by [`DOCUMENT_SEPARATOR`].
///
/// Reports one progress step per file.
///
/// # Errors
///
/// Returns the first error from `extract`; no partial text is returned.
pub fn combine_documents(
    files: &[PathBuf],
    progress: &dyn ProgressCallback,
    extract: impl Fn(&Path) -> Result<String, PdfError>,
) -> Result<String, PdfError> {
    progress.set_total(files.len() as u64);

    let mut combined = String::new();

    for path in files {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        log::info!("Processing {name}...");
        progress.set_message(format!("Processing {name}"));

        let text = extract(path)?;
        combined.push_str(&text);
        combined.push_str(DOCUMENT_SEPARATOR);

        progress.inc(1);
    }

    progress.finish(format!(
        "Extracted {} characters from {} PDF(s)",
        combined.len(),
        files.len()
    ));

    Ok(combined)
}

/// Lists the PDF files directly inside `dir`, sorted by file name.
///
/// The `.pdf` extension is matched case-insensitively; subdirectories are
/// not descended into.
///
/// # Errors
///
/// * [`PdfError::NotFound`] if `dir` is not an existing directory
/// * [`PdfError::NoInput`] if it contains no PDF files
/// * [`PdfError::Io`] if the listing fails
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, PdfError> {
    if !dir.is_dir() {
        return Err(PdfError::NotFound {
            path: dir.to_path_buf(),
        });
    }

    let io_error = |source: std::io::Error| PdfError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(PdfError::NoInput {
            path: dir.to_path_buf(),
        });
    }

    files.sort();
    log::debug!("Found {} PDF file(s) in {}", files.len(), dir.display());

    Ok(files)
}

/// Extracts all text from a single PDF file.
///
/// # Errors
///
/// Returns [`PdfError::Io`] if the file cannot be read and
/// [`PdfError::Extraction`] if it cannot be parsed as a PDF.
pub fn extract_text_from_pdf(path: &Path) -> Result<String, PdfError> {
    let bytes = std::fs::read(path).map_err(|source| PdfError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("Read {} bytes from {}", bytes.len(), path.display());

    let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| PdfError::Extraction {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    log::debug!(
        "Extracted {} characters of text from {}",
        text.len(),
        path.display()
    );

    Ok(text)
}
