//! # BN254 Scalar Field
//!
//! Public signals of every bridge circuit live in the scalar field of BN254:
//!
//! ```text
//! r = 21888242871839275222246405745257275088548364400416034343698204186575808495617
//! ```
//!
//! Values larger than `r` (keccak roots, raw keys) are reduced before they are
//! handed to a verifier. 32-byte roots that must survive exactly are instead
//! carried as two 128-bit halves, each far below `r`.

use crate::errors::ZkpError;
use primitive_types::U256;
use shared_types::{hash_to_u256, u256_to_hash, Hash};
use std::ops::{Add, Sub};

/// BN254 scalar field prime (little-endian 64-bit limbs).
pub const BN254_SCALAR_MODULUS: U256 = U256([
    0x43e1_f593_f000_0001,
    0x2833_e848_79b9_7091,
    0xb850_45b6_8181_585d,
    0x3064_4e72_e131_a029,
]);

/// Element of the BN254 scalar field, always kept reduced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldElement(U256);

impl FieldElement {
    /// Create a field element (reduces mod r).
    pub fn new(value: U256) -> Self {
        Self(value % BN254_SCALAR_MODULUS)
    }

    /// Create from a u128 (always canonical).
    pub fn from_u128(value: u128) -> Self {
        Self(U256::from(value))
    }

    /// Interpret a 32-byte big-endian commitment and reduce it.
    pub fn from_hash(hash: &Hash) -> Self {
        Self::new(hash_to_u256(hash))
    }

    /// Zero element.
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    /// Raw canonical value.
    pub fn value(&self) -> U256 {
        self.0
    }

    /// Big-endian 32-byte encoding.
    pub fn to_hash(&self) -> Hash {
        u256_to_hash(self.0)
    }

    /// Check if zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<FieldElement> for U256 {
    fn from(elem: FieldElement) -> Self {
        elem.0
    }
}

impl Add for FieldElement {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        // Both operands are below r < 2^254, so the sum cannot overflow
        Self::new(self.0 + rhs.0)
    }
}

impl Sub for FieldElement {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        if self.0 >= rhs.0 {
            Self(self.0 - rhs.0)
        } else {
            Self(BN254_SCALAR_MODULUS - rhs.0 + self.0)
        }
    }
}

/// Split a 32-byte root into `(hi, lo)` 128-bit halves.
pub fn split_hash(hash: &Hash) -> (FieldElement, FieldElement) {
    let mut hi = [0u8; 16];
    let mut lo = [0u8; 16];
    hi.copy_from_slice(&hash[..16]);
    lo.copy_from_slice(&hash[16..]);
    (
        FieldElement::from_u128(u128::from_be_bytes(hi)),
        FieldElement::from_u128(u128::from_be_bytes(lo)),
    )
}

/// Rebuild a 32-byte root from two public-input halves.
pub fn join_halves(hi: U256, lo: U256) -> Result<Hash, ZkpError> {
    let limit = U256::one() << 128;
    if hi >= limit {
        return Err(ZkpError::HalfOutOfRange(format!("hi=0x{hi:x}")));
    }
    if lo >= limit {
        return Err(ZkpError::HalfOutOfRange(format!("lo=0x{lo:x}")));
    }
    let mut out = [0u8; 32];
    out[..16].copy_from_slice(&hi.low_u128().to_be_bytes());
    out[16..].copy_from_slice(&lo.low_u128().to_be_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modulus_decimal() {
        let decimal = U256::from_dec_str(
            "21888242871839275222246405745257275088548364400416034343698204186575808495617",
        )
        .unwrap();
        assert_eq!(decimal, BN254_SCALAR_MODULUS);
    }

    #[test]
    fn test_reduction_wraps_modulus() {
        assert!(FieldElement::new(BN254_SCALAR_MODULUS).is_zero());
        let above = FieldElement::new(BN254_SCALAR_MODULUS + U256::from(5u8));
        assert_eq!(above, FieldElement::from_u128(5));
    }

    #[test]
    fn test_all_ones_hash_is_reduced() {
        let elem = FieldElement::from_hash(&[0xFF; 32]);
        assert!(elem.value() < BN254_SCALAR_MODULUS);
    }

    #[test]
    fn test_sub_wraps() {
        let one = FieldElement::from_u128(1);
        let two = FieldElement::from_u128(2);
        assert_eq!((one - two) + two, one);
    }

    #[test]
    fn test_split_and_join() {
        let mut root = [0u8; 32];
        root[0] = 0xAB;
        root[31] = 0xCD;
        let (hi, lo) = split_hash(&root);
        assert_eq!(hi.value(), U256::from(0xABu8) << 120);
        assert_eq!(lo.value(), U256::from(0xCDu8));
        assert_eq!(join_halves(hi.value(), lo.value()).unwrap(), root);
    }

    #[test]
    fn test_join_rejects_wide_half() {
        let wide = U256::one() << 128;
        assert!(join_halves(wide, U256::zero()).is_err());
        assert!(join_halves(U256::zero(), wide).is_err());
    }
}
