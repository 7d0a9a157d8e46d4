//! # Balance Tree Commitment
//!
//! Reference commitment over `(key, balance)` leaves: leaves are
//! `keccak(key ‖ balance)`, empty slots (and `(0, 0)` leaves) are the zero
//! hash, and interior nodes
//! are `keccak(left ‖ right)`. The root is reduced into the BN254 field so it
//! can appear as the first public signal of the tree circuits.

use crate::errors::ZkpError;
use crate::field::FieldElement;
use crate::tree::TreeSize;
use shared_crypto::keccak256_concat;
use shared_types::{Hash, ZERO_HASH};

/// Keccak Merkle commitment to a padded balance tree.
#[derive(Clone, Debug)]
pub struct StateCommitment {
    root: Hash,
    size: TreeSize,
}

impl StateCommitment {
    /// Commit to `leaves` (token-major order), padding to `size`.
    pub fn commit(
        size: TreeSize,
        leaves: &[(FieldElement, FieldElement)],
    ) -> Result<Self, ZkpError> {
        if leaves.len() > size.leaves() {
            return Err(ZkpError::LeafOverflow {
                values: leaves.len(),
                slots: size.leaves(),
            });
        }

        let mut layer: Vec<Hash> = leaves
            .iter()
            .map(|(key, balance)| hash_leaf(key, balance))
            .collect();
        layer.resize(size.leaves(), ZERO_HASH);

        while layer.len() > 1 {
            layer = layer
                .chunks(2)
                .map(|pair| keccak256_concat(&[&pair[0][..], &pair[1][..]]))
                .collect();
        }

        Ok(Self {
            root: layer[0],
            size,
        })
    }

    /// Raw 32-byte root.
    pub fn root(&self) -> &Hash {
        &self.root
    }

    /// Root reduced into the field (the public signal form).
    pub fn field_root(&self) -> FieldElement {
        FieldElement::from_hash(&self.root)
    }

    /// Tree size committed to.
    pub fn size(&self) -> TreeSize {
        self.size
    }
}

fn hash_leaf(key: &FieldElement, balance: &FieldElement) -> Hash {
    if key.is_zero() && balance.is_zero() {
        return ZERO_HASH;
    }
    keccak256_concat(&[&key.to_hash()[..], &balance.to_hash()[..]])
}
