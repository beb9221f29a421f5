//! Error types for the pagination core.

use thiserror::Error;

/// Result type alias for pagination operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while splitting, measuring or packing a document.
///
/// The splitter and packer return these without catching them; the
/// [`PaginationController`](crate::controller::PaginationController) is the
/// only place they are turned into a fallback page list.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading input files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The live measurement context is not mounted yet.
    #[error("Measurement context unavailable")]
    MeasurementUnavailable,

    /// The input document is missing or has no `content` array.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Unexpected failure inside the pack loop.
    #[error("Packing failed: {0}")]
    Packing(String),

    /// The injected block-to-markup renderer failed.
    #[error("Block render failed: {0}")]
    Render(String),

    /// The measurement oracle could not measure a block.
    #[error("Measurement failed: {0}")]
    Measure(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error only means "measure later" rather than a real fault.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::MeasurementUnavailable)
    }
}
