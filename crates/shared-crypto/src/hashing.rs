//! # Keccak-256 Hashing
//!
//! The bridge hashes everything that is signed or committed with Keccak-256 so
//! identities line up with Ethereum-style addresses.

use sha3::{Digest, Keccak256};
use shared_types::{Address, Hash};

/// Hash data with Keccak-256 (one-shot).
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash the concatenation of several byte slices without allocating.
pub fn keccak256_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Address of an uncompressed public key: `keccak256(x ‖ y)[12..]`.
pub fn address_from_point(x: &[u8; 32], y: &[u8; 32]) -> Address {
    let digest = keccak256_concat(&[&x[..], &y[..]]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);
    address
}
