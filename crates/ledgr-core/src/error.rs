//! Error types for the ledgr-core library.

use thiserror::Error;

/// Main error type for the ledgr library.
#[derive(Error, Debug)]
pub enum LedgrError {
    /// Extraction strategy error.
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),

    /// Source document error.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Field parsing error.
    #[error("field error: {0}")]
    Field(#[from] FieldError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by extraction strategies.
///
/// The strategy selector never lets these escape; they are logged and the
/// strategy counts as having produced no rows.
#[derive(Error, Debug)]
pub enum StrategyError {
    /// The strategy could not read its input.
    #[error("I/O failure in {strategy}: {reason}")]
    Io { strategy: String, reason: String },

    /// The strategy read its input but could not parse it.
    #[error("{strategy} failed to parse document: {reason}")]
    Parse { strategy: String, reason: String },

    /// The document layout is not one the strategy understands.
    #[error("{0} does not support this document")]
    Unsupported(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// A raw field value that failed every known format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Date string matched none of the supported formats.
    #[error("unparseable date: {raw:?}")]
    UnparsedDate { raw: String },

    /// Amount string contained no number.
    #[error("unparseable amount: {raw:?}")]
    UnparsedAmount { raw: String },
}

/// Errors related to reading source documents.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Failed to open/parse the document.
    #[error("failed to parse document: {0}")]
    Parse(String),

    /// Failed to extract text from the document.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The document is empty or has no pages.
    #[error("document has no pages")]
    NoPages,
}

/// Result type for the ledgr library.
pub type Result<T> = std::result::Result<T, LedgrError>;
