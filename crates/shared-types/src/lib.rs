//! # Shared Types Crate
//!
//! Primitive identifiers used across the bridge crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: address, hash and amount shapes are defined
//!   here and nowhere else.
//! - **Fixed-width identities**: every account and token is a 20-byte address,
//!   every commitment a 32-byte hash.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
