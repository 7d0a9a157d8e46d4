//! ZKP error types.

use thiserror::Error;

/// Zero-knowledge proof errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZkpError {
    /// Leaf count exceeds the largest compiled circuit
    #[error("Tree needs {leaves} leaves, circuits support at most {max}")]
    TreeTooLarge {
        /// Requested leaves
        leaves: usize,
        /// Largest supported tree
        max: usize,
    },

    /// Public signal vector has the wrong arity for the circuit
    #[error("Expected {expected} public signals, got {actual}")]
    SignalLengthMismatch {
        /// Circuit arity
        expected: usize,
        /// Supplied arity
        actual: usize,
    },

    /// A root half does not fit in 128 bits
    #[error("Root half out of range: {0}")]
    HalfOutOfRange(String),

    /// More leaf values than the tree has slots
    #[error("Leaf overflow: {values} values for a {slots}-leaf tree")]
    LeafOverflow {
        /// Values supplied
        values: usize,
        /// Tree slots
        slots: usize,
    },
}
