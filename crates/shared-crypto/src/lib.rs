//! # Shared Crypto - Bridge Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256 | Message digests, signer identities |
//! | `schnorr` | Schnorr over secp256k1 | Group-key signature recovery |
//! | `threshold` | Shamir shares + FROST-style signing | Quorum signatures |
//!
//! ## Security Properties
//!
//! - **Group key validation**: points are decoded and checked to lie on the curve
//! - **Challenge binding**: `c = keccak256(R ‖ P ‖ m)` binds nonce, key and message
//! - **Share hygiene**: secret shares and nonces are zeroized on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod schnorr;
pub mod threshold;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{address_from_point, keccak256, keccak256_concat};
pub use schnorr::{recover_signer, CurvePoint, GroupPublicKey, ThresholdSignature};
pub use threshold::{
    aggregate_commitments, aggregate_signature, deal_shares, lagrange_coefficient, partial_sign,
    KeyShare, PartialSignature, SigningNonce,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
