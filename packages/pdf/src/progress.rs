//! Progress reporting for document extraction.
//!
//! Extraction reports one step per document through [`ProgressCallback`]
//! without knowing how (or whether) progress is rendered. The CLI plugs in
//! an `indicatif` bar; tests and library callers use [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from a long-running extraction.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of documents that will be processed.
    fn set_total(&self, total: u64);

    /// Marks `delta` more documents as done.
    fn inc(&self, delta: u64);

    /// Replaces the message shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Completes the indicator with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
