//! Threshold Schnorr signer recovery over secp256k1.

use crate::ports::SignerRecovery;
use shared_crypto::{recover_signer, GroupPublicKey, ThresholdSignature};
use shared_types::{Address, Hash};
use tracing::debug;

/// Recovers the group signer with `shared_crypto::recover_signer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchnorrSignerRecovery;

impl SignerRecovery for SchnorrSignerRecovery {
    fn recover(
        &self,
        message: &Hash,
        group_key: &GroupPublicKey,
        signature: &ThresholdSignature,
    ) -> Option<Address> {
        match recover_signer(message, group_key, signature) {
            Ok(address) => Some(address),
            Err(e) => {
                debug!("[bridge] Signature recovery failed: {}", e);
                None
            }
        }
    }
}
