//! # Threshold Signing
//!
//! Trusted-dealer Shamir sharing of the group secret plus a two-round
//! signing flow in the FROST shape:
//!
//! 1. every signer publishes `R_i = k_i·G`; the aggregator sums them into `R`
//! 2. every signer answers `z_i = k_i + c·λ_i·s_i` with `c` from [`challenge`]
//!
//! Summing the `z_i` yields a plain Schnorr signature under the group key,
//! which is what the bridge verifies. Nonces are derived from caller seeds
//! and must never be reused across messages.
//!
//! [`challenge`]: crate::schnorr::challenge

use crate::errors::CryptoError;
use crate::hashing::keccak256;
use crate::schnorr::{
    challenge, scalar_from_bytes_reduced, scalar_from_canonical, scalar_to_bytes, CurvePoint,
    GroupPublicKey, ThresholdSignature,
};
use k256::{ProjectivePoint, Scalar};
use serde::{Deserialize, Serialize};
use shared_types::Hash;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// One participant's share `s_i = f(i)` of the group secret.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyShare {
    index: u16,
    secret: [u8; 32],
}

impl KeyShare {
    /// Share index (the x coordinate, never zero).
    pub fn index(&self) -> u16 {
        self.index
    }

    /// Public verification share `s_i·G`.
    pub fn public_share(&self) -> Result<CurvePoint, CryptoError> {
        CurvePoint::from_projective(&(ProjectivePoint::GENERATOR * self.scalar()?))
    }

    fn scalar(&self) -> Result<Scalar, CryptoError> {
        scalar_from_canonical(&self.secret).ok_or(CryptoError::InvalidScalar)
    }
}

impl std::fmt::Debug for KeyShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyShare")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// Per-message secret nonce `k_i`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningNonce {
    secret: [u8; 32],
}

impl SigningNonce {
    /// Derive a nonce from caller-supplied entropy.
    pub fn from_seed(seed: &[u8]) -> Result<Self, CryptoError> {
        let scalar = scalar_from_bytes_reduced(&keccak256(seed));
        if scalar == Scalar::ZERO {
            return Err(CryptoError::InvalidScalar);
        }
        Ok(Self {
            secret: scalar_to_bytes(&scalar),
        })
    }

    /// Public commitment `R_i = k_i·G`.
    pub fn commitment(&self) -> Result<CurvePoint, CryptoError> {
        CurvePoint::from_projective(&(ProjectivePoint::GENERATOR * self.scalar()?))
    }

    fn scalar(&self) -> Result<Scalar, CryptoError> {
        scalar_from_canonical(&self.secret).ok_or(CryptoError::InvalidScalar)
    }
}

/// Signer's answer `z_i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialSignature {
    /// Share index of the signer.
    pub index: u16,
    /// Response scalar (big-endian).
    pub z: [u8; 32],
}

/// Split `secret` into `total` shares of a degree `coefficients.len()`
/// polynomial. Any `coefficients.len() + 1` shares can sign.
pub fn deal_shares(
    secret: &[u8; 32],
    coefficients: &[[u8; 32]],
    total: u16,
) -> Result<(GroupPublicKey, Vec<KeyShare>), CryptoError> {
    let threshold = coefficients.len() + 1;
    if total == 0 || threshold > usize::from(total) {
        return Err(CryptoError::InvalidThreshold {
            threshold,
            total: usize::from(total),
        });
    }

    let constant = scalar_from_bytes_reduced(secret);
    if constant == Scalar::ZERO {
        return Err(CryptoError::InvalidScalar);
    }
    let mut poly = Vec::with_capacity(threshold);
    poly.push(constant);
    poly.extend(coefficients.iter().map(scalar_from_bytes_reduced));

    let group_key = CurvePoint::from_projective(&(ProjectivePoint::GENERATOR * constant))?;
    let shares = (1..=total)
        .map(|index| {
            // Horner evaluation at x = index
            let x = Scalar::from(u64::from(index));
            let value = poly
                .iter()
                .rev()
                .fold(Scalar::ZERO, |acc, coeff| acc * x + coeff);
            KeyShare {
                index,
                secret: scalar_to_bytes(&value),
            }
        })
        .collect();

    Ok((group_key, shares))
}

/// Lagrange coefficient of `index` at x = 0 over the signer set `indices`.
pub fn lagrange_coefficient(index: u16, indices: &[u16]) -> Result<Scalar, CryptoError> {
    if index == 0 || !indices.contains(&index) {
        return Err(CryptoError::InvalidShareIndex(index));
    }

    let xi = Scalar::from(u64::from(index));
    let mut numerator = Scalar::ONE;
    let mut denominator = Scalar::ONE;
    for (pos, &other) in indices.iter().enumerate() {
        if other == 0 || indices[..pos].contains(&other) {
            return Err(CryptoError::InvalidShareIndex(other));
        }
        if other == index {
            continue;
        }
        let xj = Scalar::from(u64::from(other));
        numerator *= xj;
        denominator *= xj - xi;
    }

    let inverse: Option<Scalar> = denominator.invert().into();
    inverse
        .map(|inv| numerator * inv)
        .ok_or(CryptoError::InvalidScalar)
}

/// Sum the signers' nonce commitments into the group commitment `R`.
pub fn aggregate_commitments(commitments: &[CurvePoint]) -> Result<CurvePoint, CryptoError> {
    if commitments.is_empty() {
        return Err(CryptoError::EmptySignerSet);
    }
    let mut sum = ProjectivePoint::IDENTITY;
    for commitment in commitments {
        sum += commitment.to_projective()?;
    }
    CurvePoint::from_projective(&sum)
}

/// Produce `z_i = k_i + c·λ_i·s_i` for `message`.
pub fn partial_sign(
    share: &KeyShare,
    nonce: &SigningNonce,
    group_commitment: &CurvePoint,
    group_key: &GroupPublicKey,
    message: &Hash,
    signers: &[u16],
) -> Result<PartialSignature, CryptoError> {
    let lambda = lagrange_coefficient(share.index, signers)?;
    let c = challenge(group_commitment, group_key, message);
    let z = nonce.scalar()? + c * lambda * share.scalar()?;
    Ok(PartialSignature {
        index: share.index,
        z: scalar_to_bytes(&z),
    })
}

/// Combine partial responses into the final signature.
pub fn aggregate_signature(
    group_commitment: &CurvePoint,
    partials: &[PartialSignature],
) -> Result<ThresholdSignature, CryptoError> {
    if partials.is_empty() {
        return Err(CryptoError::EmptySignerSet);
    }
    let mut z = Scalar::ZERO;
    for (pos, partial) in partials.iter().enumerate() {
        if partials[..pos].iter().any(|p| p.index == partial.index) {
            return Err(CryptoError::InvalidShareIndex(partial.index));
        }
        z += scalar_from_canonical(&partial.z).ok_or(CryptoError::InvalidScalar)?;
    }
    Ok(ThresholdSignature {
        r: *group_commitment,
        z: scalar_to_bytes(&z),
    })
}
