//! Cross-cutting error types for Atrium.
//!
//! These cover failures of the error subsystem itself (serializing a record,
//! drawing entropy for an ID). They are never stored as `ErrorRecord`s.

use thiserror::Error;

/// Errors that can be raised by any Atrium crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The OS random source could not be read.
    #[error("Entropy unavailable: {0}")]
    Entropy(String),
}
