//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Coordinates do not describe a point on secp256k1
    #[error("Invalid curve point")]
    InvalidPoint,

    /// The point at infinity cannot be used as a key or commitment
    #[error("Point at infinity")]
    PointAtInfinity,

    /// Scalar is zero or not below the group order
    #[error("Invalid scalar")]
    InvalidScalar,

    /// Signature equation does not hold
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Share indices must be nonzero and distinct
    #[error("Invalid share index: {0}")]
    InvalidShareIndex(u16),

    /// Threshold parameters are inconsistent
    #[error("Invalid threshold: {threshold} of {total}")]
    InvalidThreshold {
        /// Required signers
        threshold: usize,
        /// Total shares
        total: usize,
    },

    /// Nothing to aggregate
    #[error("Empty signer set")]
    EmptySignerSet,
}
