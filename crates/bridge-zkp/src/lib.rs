//! # Bridge ZKP: Proof Plumbing
//!
//! Everything the bridge needs to talk to its proof systems.
//!
//! ## Components
//!
//! - `field` - BN254 scalar field encoding of public signals
//! - `tree` - compiled balance-tree sizes and their signal arities
//! - `commitment` - keccak Merkle commitment over balance leaves
//! - `proof` - Groth16 / transition proof types, verifier oracles and the
//!   digest reference prover

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commitment;
pub mod errors;
pub mod field;
pub mod proof;
pub mod tree;

pub use commitment::StateCommitment;
pub use errors::ZkpError;
pub use field::{join_halves, split_hash, FieldElement, BN254_SCALAR_MODULUS};
pub use proof::{
    signal_digest, DigestGroth16Verifier, DigestProver, DigestTransitionVerifier, Groth16Proof,
    Groth16Verifier, TransitionProof, TransitionVerifier,
};
pub use tree::{TreeSize, MAX_TREE_LEAVES};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
