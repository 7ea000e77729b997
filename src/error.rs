//! Error types for the BDIO chunked document format.

use crate::validate::ValidationError;
use thiserror::Error;

/// Errors surfaced by the writers, readers and the document assembler.
#[derive(Debug, Error)]
pub enum BdioError {
    /// A node (or the metadata envelope) cannot fit any entry, even a freshly
    /// opened one, or a read-side entry exceeds the uncompressed size budget.
    /// The estimated size is -1 when it is unknown.
    #[error("Entry {} exceeds the maximum uncompressed entry size (estimated size: {estimated_size})", entry_name.as_deref().unwrap_or("<unknown>"))]
    EntrySizeViolation {
        entry_name: Option<String>,
        estimated_size: i64,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Malformed entry bytes: unparsable envelope, wrong start token, missing
    /// `@graph`, or an unknown record tag/version in the binary encoding.
    #[error("Malformed entry: {0}")]
    FramingSyntax(String),

    /// An incompatible non-fragment identifier was encountered while merging
    /// metadata fragments.
    #[error("Metadata identifier mismatch: expected {expected:?}, got {actual:?}")]
    MetadataMismatch { expected: String, actual: String },

    /// Protocol misuse, e.g. `next` before `start` or a double `start`.
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    #[error("Archive I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for BdioError {
    fn from(err: serde_json::Error) -> Self {
        BdioError::FramingSyntax(err.to_string())
    }
}

impl From<bincode::Error> for BdioError {
    fn from(err: bincode::Error) -> Self {
        BdioError::FramingSyntax(err.to_string())
    }
}
