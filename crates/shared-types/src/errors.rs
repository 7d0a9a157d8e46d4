//! # Error Types
//!
//! Errors shared by crates that parse primitive identifiers.

use thiserror::Error;

/// Hex decoding failures for addresses and hashes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    /// Input is not valid hex.
    #[error("Invalid hex: {0}")]
    Invalid(String),

    /// Input decoded to the wrong number of bytes.
    #[error("Wrong length: expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}
