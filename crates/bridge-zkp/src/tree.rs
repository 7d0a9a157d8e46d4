//! # Circuit Tree Sizes
//!
//! Balance trees are compiled for a fixed set of leaf counts. A channel picks
//! the smallest tree that holds `participants × tokens` leaves.

use crate::errors::ZkpError;
use serde::{Deserialize, Serialize};

/// Largest compiled balance tree.
pub const MAX_TREE_LEAVES: usize = 128;

/// Supported balance-tree sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TreeSize {
    /// 16 leaves, 33 public signals
    Leaves16,
    /// 32 leaves, 65 public signals
    Leaves32,
    /// 64 leaves, 129 public signals
    Leaves64,
    /// 128 leaves, 257 public signals
    Leaves128,
}

impl TreeSize {
    /// All sizes, smallest first.
    pub const ALL: [TreeSize; 4] = [
        TreeSize::Leaves16,
        TreeSize::Leaves32,
        TreeSize::Leaves64,
        TreeSize::Leaves128,
    ];

    /// Smallest tree holding `leaves` slots.
    pub fn for_leaves(leaves: usize) -> Result<Self, ZkpError> {
        Self::ALL
            .into_iter()
            .find(|size| size.leaves() >= leaves)
            .ok_or(ZkpError::TreeTooLarge {
                leaves,
                max: MAX_TREE_LEAVES,
            })
    }

    /// Leaf count.
    pub fn leaves(self) -> usize {
        match self {
            TreeSize::Leaves16 => 16,
            TreeSize::Leaves32 => 32,
            TreeSize::Leaves64 => 64,
            TreeSize::Leaves128 => 128,
        }
    }

    /// Root, then one key and one balance per leaf.
    pub fn public_signal_len(self) -> usize {
        2 * self.leaves() + 1
    }
}

impl std::fmt::Display for TreeSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.leaves())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smallest_fitting_tree() {
        assert_eq!(TreeSize::for_leaves(3).unwrap(), TreeSize::Leaves16);
        assert_eq!(TreeSize::for_leaves(16).unwrap(), TreeSize::Leaves16);
        assert_eq!(TreeSize::for_leaves(17).unwrap(), TreeSize::Leaves32);
        assert_eq!(TreeSize::for_leaves(64).unwrap(), TreeSize::Leaves64);
        assert_eq!(TreeSize::for_leaves(128).unwrap(), TreeSize::Leaves128);
    }

    #[test]
    fn test_oversized_tree_rejected() {
        assert_eq!(
            TreeSize::for_leaves(129),
            Err(ZkpError::TreeTooLarge {
                leaves: 129,
                max: 128
            })
        );
    }

    #[test]
    fn test_signal_lengths() {
        let lens: Vec<usize> = TreeSize::ALL.iter().map(|s| s.public_signal_len()).collect();
        assert_eq!(lens, vec![33, 65, 129, 257]);
    }
}
