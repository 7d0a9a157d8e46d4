//! # Schnorr Signatures over secp256k1
//!
//! Verification side of the group signature used to authorize channel
//! settlement. A channel stores an aggregated group public key `P`; the
//! participants' quorum produces `(R, z)` such that
//!
//! ```text
//! z·G == R + c·P      where c = keccak256(R.x ‖ R.y ‖ P.x ‖ P.y ‖ m) mod n
//! ```
//!
//! `recover_signer` returns the Ethereum-style address of `P` when the
//! equation holds, so callers compare identities instead of raw points.

use crate::errors::CryptoError;
use crate::hashing::{address_from_point, keccak256_concat};
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash};

/// Affine secp256k1 point as two big-endian 32-byte coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurvePoint {
    /// X coordinate (big-endian).
    pub x: [u8; 32],
    /// Y coordinate (big-endian).
    pub y: [u8; 32],
}

/// Aggregated group public key of a channel.
pub type GroupPublicKey = CurvePoint;

impl CurvePoint {
    /// Build from raw coordinates without validation.
    pub fn new(x: [u8; 32], y: [u8; 32]) -> Self {
        Self { x, y }
    }

    /// Decode and validate the point.
    pub fn to_projective(&self) -> Result<ProjectivePoint, CryptoError> {
        let encoded = EncodedPoint::from_affine_coordinates(
            &FieldBytes::from(self.x),
            &FieldBytes::from(self.y),
            false,
        );
        let affine: Option<AffinePoint> = AffinePoint::from_encoded_point(&encoded).into();
        affine
            .map(ProjectivePoint::from)
            .ok_or(CryptoError::InvalidPoint)
    }

    /// Encode a projective point; the identity has no affine form.
    pub fn from_projective(point: &ProjectivePoint) -> Result<Self, CryptoError> {
        let encoded = point.to_affine().to_encoded_point(false);
        match (encoded.x(), encoded.y()) {
            (Some(x), Some(y)) => {
                let mut out = Self::new([0u8; 32], [0u8; 32]);
                out.x.copy_from_slice(x);
                out.y.copy_from_slice(y);
                Ok(out)
            }
            _ => Err(CryptoError::PointAtInfinity),
        }
    }

    /// Whether the coordinates describe a point on the curve.
    pub fn is_valid(&self) -> bool {
        self.to_projective().is_ok()
    }

    /// Ethereum-style identity of this key.
    pub fn address(&self) -> Address {
        address_from_point(&self.x, &self.y)
    }
}

/// Threshold Schnorr signature `(R, z)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSignature {
    /// Aggregated nonce commitment `R`.
    pub r: CurvePoint,
    /// Aggregated response scalar `z` (big-endian).
    pub z: [u8; 32],
}

/// Reduce 32 bytes modulo the group order.
pub(crate) fn scalar_from_bytes_reduced(bytes: &[u8; 32]) -> Scalar {
    <Scalar as Reduce<k256::U256>>::reduce_bytes(&FieldBytes::from(*bytes))
}

/// Parse a canonical scalar (strictly below the group order).
pub(crate) fn scalar_from_canonical(bytes: &[u8; 32]) -> Option<Scalar> {
    Scalar::from_repr(FieldBytes::from(*bytes)).into()
}

pub(crate) fn scalar_to_bytes(scalar: &Scalar) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&scalar.to_bytes());
    out
}

/// Fiat-Shamir challenge `c = keccak256(R ‖ P ‖ m) mod n`.
pub fn challenge(r: &CurvePoint, group_key: &GroupPublicKey, message: &Hash) -> Scalar {
    let digest = keccak256_concat(&[
        &r.x[..],
        &r.y[..],
        &group_key.x[..],
        &group_key.y[..],
        &message[..],
    ]);
    scalar_from_bytes_reduced(&digest)
}

/// Verify `signature` on `message` under `group_key`.
pub fn verify(
    message: &Hash,
    group_key: &GroupPublicKey,
    signature: &ThresholdSignature,
) -> Result<(), CryptoError> {
    let public = group_key.to_projective()?;
    let nonce = signature.r.to_projective()?;
    let z = scalar_from_canonical(&signature.z).ok_or(CryptoError::InvalidScalar)?;
    if z == Scalar::ZERO {
        return Err(CryptoError::InvalidScalar);
    }

    let c = challenge(&signature.r, group_key, message);
    let lhs = ProjectivePoint::GENERATOR * z;
    let rhs = nonce + public * c;
    if lhs == rhs {
        Ok(())
    } else {
        Err(CryptoError::SignatureVerificationFailed)
    }
}

/// Recover the signer identity: the group key's address if the signature
/// verifies, an error otherwise.
pub fn recover_signer(
    message: &Hash,
    group_key: &GroupPublicKey,
    signature: &ThresholdSignature,
) -> Result<Address, CryptoError> {
    verify(message, group_key, signature)?;
    Ok(group_key.address())
}
