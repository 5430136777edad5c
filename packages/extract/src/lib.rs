#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Keyword-delimited record extraction.
//!
//! Turns a linear text blob such as
//!
//! ```text
//! ID: 101 Color: Red Model: Civic Year: 2020 ID: 102 Color: Blue ...
//! ```
//!
//! into one [`Record`] per occurrence of the anchor keyword (`ID` above).
//! The only schema is the ordered [`KeywordList`]; every value runs from
//! `Keyword:` up to the next `AnyKeyword:` or the end of the record.
//!
//! The primary entry point is [`RecordExtractor`], which compiles the
//! matchers once and can be reused across texts.

pub mod extractor;

pub use extractor::RecordExtractor;
pub use pdf_records_record_models::{Keyword, KeywordError, KeywordList, Record};

/// Errors raised while setting up extraction.
///
/// Extraction itself never fails: text without matches simply yields no
/// records.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The keyword configuration is invalid (e.g. empty).
    #[error("Invalid keyword configuration: {0}")]
    Keywords(#[from] KeywordError),

    /// A keyword pattern failed to compile.
    #[error("Invalid keyword pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Extracts records from `text` using raw keyword labels.
///
/// The first label is the anchor. Convenience wrapper around
/// [`KeywordList::new`] and [`RecordExtractor::extract`].
///
/// # Errors
///
/// Returns [`ExtractError::Keywords`] if `labels` is empty or contains
/// duplicates; no text is scanned in that case.
pub fn extract_records<S: AsRef<str>>(
    labels: &[S],
    text: &str,
) -> Result<Vec<Record>, ExtractError> {
    let keywords = KeywordList::new(labels)?;
    let extractor = RecordExtractor::new(keywords)?;
    Ok(extractor.extract(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_keyword_list_is_a_configuration_error() {
        let labels: [&str; 0] = [];
        let result = extract_records(&labels, "ID: 1 Color: Red");
        assert!(matches!(
            result,
            Err(ExtractError::Keywords(KeywordError::NoKeywords))
        ));
    }

    #[test]
    fn extracts_with_raw_labels() {
        let records = extract_records(
            &["ProductID", "Name", "Price"],
            "ProductID: P-1 Name: Lamp Price: 12.50",
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Name"), Some("Lamp"));
        assert_eq!(records[0].get("Price"), Some("12.50"));
    }
}
