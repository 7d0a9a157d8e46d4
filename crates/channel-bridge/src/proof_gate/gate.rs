//! # Proof Gate
//!
//! Assembles public signals, dispatches to the verifier compiled for the
//! channel's tree size and turns oracle verdicts into `ChannelError`s.
//! The gate never mutates channel state; the service writes roots only after
//! every check has passed.

use super::public_inputs::{closing_message, tree_signals, TransitionInputs};
use super::registry::FunctionRegistry;
use crate::domain::{ChannelError, ChannelId, FunctionEntry};
use crate::metrics::{record_proof, ProofKind};
use crate::ports::SignerRecovery;
use bridge_zkp::{
    DigestGroth16Verifier, DigestTransitionVerifier, FieldElement, Groth16Proof, Groth16Verifier,
    TransitionProof, TransitionVerifier, TreeSize,
};
use primitive_types::U256;
use shared_crypto::{GroupPublicKey, ThresholdSignature};
use shared_types::{short_hex, u256_to_hash, Address, Amount, Hash};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// One Groth16 verifier per compiled tree size.
#[derive(Clone, Default)]
pub struct VerifierSet {
    variants: BTreeMap<TreeSize, Arc<dyn Groth16Verifier>>,
}

impl VerifierSet {
    /// Create empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Digest verifiers for every tree size.
    pub fn digest_reference() -> Self {
        TreeSize::ALL.iter().fold(Self::new(), |set, size| {
            set.with(*size, Arc::new(DigestGroth16Verifier::new(*size)))
        })
    }

    /// Builder-style insert.
    pub fn with(mut self, size: TreeSize, verifier: Arc<dyn Groth16Verifier>) -> Self {
        self.insert(size, verifier);
        self
    }

    /// Install or replace the verifier for `size`.
    pub fn insert(&mut self, size: TreeSize, verifier: Arc<dyn Groth16Verifier>) {
        self.variants.insert(size, verifier);
    }

    /// Verifier for `size`.
    pub fn get(&self, size: TreeSize) -> Option<&Arc<dyn Groth16Verifier>> {
        self.variants.get(&size)
    }
}

impl std::fmt::Debug for VerifierSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.variants.keys()).finish()
    }
}

/// A transition chain submission and what it must connect.
#[derive(Clone, Copy, Debug)]
pub struct ChainClaim<'a> {
    /// Submitted proofs, in order.
    pub proofs: &'a [TransitionProof],
    /// Root proven at initialization.
    pub initial_root: &'a Hash,
    /// Root the leader claims.
    pub final_root: &'a Hash,
    /// Channel's block context commitment; `None` skips context and
    /// instance checks.
    pub context: Option<&'a Hash>,
}

/// Stateless proof and signature checks.
pub struct ProofGate {
    verifiers: VerifierSet,
    transition: Arc<dyn TransitionVerifier>,
    signer: Arc<dyn SignerRecovery>,
}

impl ProofGate {
    /// Create gate from its oracles.
    pub fn new(
        verifiers: VerifierSet,
        transition: Arc<dyn TransitionVerifier>,
        signer: Arc<dyn SignerRecovery>,
    ) -> Self {
        Self {
            verifiers,
            transition,
            signer,
        }
    }

    /// Gate backed by the digest reference verifiers.
    pub fn digest_reference(signer: Arc<dyn SignerRecovery>) -> Self {
        Self::new(
            VerifierSet::digest_reference(),
            Arc::new(DigestTransitionVerifier),
            signer,
        )
    }

    // =========================================================================
    // TREE CIRCUITS
    // =========================================================================

    /// Verify an initialization proof. Returns the root to store.
    pub fn verify_initialization(
        &self,
        size: TreeSize,
        merkle_root: U256,
        proof: &Groth16Proof,
        keys: &[U256],
        balances: &[Amount],
    ) -> Result<Hash, ChannelError> {
        let root = FieldElement::new(merkle_root).value();
        let signals = tree_signals(size, root, keys, balances);
        if !self.check_tree(ProofKind::Initialization, size, proof, &signals)? {
            warn!("[bridge] Initialization proof rejected (tree {})", size);
            return Err(ChannelError::InitProofRejected);
        }
        Ok(u256_to_hash(root))
    }

    /// Verify a conservation proof over the final root and balances.
    pub fn verify_conservation(
        &self,
        size: TreeSize,
        final_root: &Hash,
        proof: &Groth16Proof,
        keys: &[U256],
        final_balances: &[Amount],
    ) -> Result<(), ChannelError> {
        let root = FieldElement::from_hash(final_root).value();
        let signals = tree_signals(size, root, keys, final_balances);
        if !self.check_tree(ProofKind::Conservation, size, proof, &signals)? {
            warn!("[bridge] Conservation proof rejected (tree {})", size);
            return Err(ChannelError::ConservationProofRejected);
        }
        Ok(())
    }

    fn check_tree(
        &self,
        kind: ProofKind,
        size: TreeSize,
        proof: &Groth16Proof,
        signals: &[U256],
    ) -> Result<bool, ChannelError> {
        let verifier = self
            .verifiers
            .get(size)
            .ok_or(ChannelError::VerifierUnavailable(size))?;
        if signals.len() != size.public_signal_len() {
            return Err(ChannelError::SignalLengthMismatch {
                expected: size.public_signal_len(),
                actual: signals.len(),
            });
        }
        let started = Instant::now();
        let accepted = verifier.verify(proof, signals);
        record_proof(kind, accepted, started.elapsed());
        Ok(accepted)
    }

    // =========================================================================
    // TRANSITION CHAIN
    // =========================================================================

    /// Verify a transition chain end to end.
    ///
    /// Structure (count, prefix, continuity, registry, context) is checked for
    /// every link before any oracle runs. Any failure rejects the batch.
    pub fn verify_transition_chain(
        &self,
        claim: ChainClaim<'_>,
        registry: &FunctionRegistry,
        max_proofs: usize,
    ) -> Result<(), ChannelError> {
        let count = claim.proofs.len();
        if count == 0 || count > max_proofs {
            return Err(ChannelError::InvalidProofCount {
                count,
                max: max_proofs,
            });
        }

        let decoded = claim
            .proofs
            .iter()
            .enumerate()
            .map(|(i, proof)| TransitionInputs::parse(i, proof))
            .collect::<Result<Vec<_>, _>>()?;

        check_continuity(&decoded, claim.initial_root, claim.final_root)?;

        let mut entries: Vec<&FunctionEntry> = Vec::with_capacity(count);
        for (index, inputs) in decoded.iter().enumerate() {
            let entry = registry
                .get(&inputs.selector)
                .ok_or(ChannelError::FunctionNotRegistered(inputs.selector))?;
            if let Some(context) = claim.context {
                if inputs.context != *context {
                    return Err(ChannelError::ContextMismatch { index });
                }
                if inputs.instance != entry.instance_hash {
                    return Err(ChannelError::InstanceMismatch { index });
                }
            }
            entries.push(entry);
        }

        for (index, (proof, entry)) in claim.proofs.iter().zip(entries).enumerate() {
            let started = Instant::now();
            let accepted = self.transition.verify(
                &proof.part1,
                &proof.part2,
                &entry.vk_part1,
                &entry.vk_part2,
                &proof.public_inputs,
                proof.extra,
            );
            record_proof(ProofKind::Transition, accepted, started.elapsed());
            if !accepted {
                warn!("[bridge] Transition proof {} of {} rejected", index, count);
                return Err(ChannelError::TransitionProofRejected { index });
            }
        }

        debug!(
            "[bridge] Transition chain of {} verified, final root {}",
            count,
            short_hex(claim.final_root)
        );
        Ok(())
    }

    // =========================================================================
    // SIGNATURE
    // =========================================================================

    /// Check the group signature over the closing message recovers `signer`.
    pub fn verify_signature(
        &self,
        channel: ChannelId,
        final_root: &Hash,
        group_key: &GroupPublicKey,
        signature: &ThresholdSignature,
        signer: &Address,
    ) -> Result<(), ChannelError> {
        let message = closing_message(channel, final_root);
        let started = Instant::now();
        let recovered = self.signer.recover(&message, group_key, signature);
        let accepted = recovered.as_ref() == Some(signer);
        record_proof(ProofKind::Signature, accepted, started.elapsed());
        if !accepted {
            warn!("[bridge] Group signature rejected for channel {}", channel);
            return Err(ChannelError::SignatureRejected);
        }
        Ok(())
    }
}

fn check_continuity(
    links: &[TransitionInputs],
    initial_root: &Hash,
    final_root: &Hash,
) -> Result<(), ChannelError> {
    let (first, last) = match (links.first(), links.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Ok(()),
    };
    if first.input_root != *initial_root {
        return Err(ChannelError::InitialRootMismatch);
    }
    for (index, pair) in links.windows(2).enumerate() {
        if pair[1].input_root != pair[0].output_root {
            return Err(ChannelError::ChainDiscontinuity { index: index + 1 });
        }
    }
    if last.output_root != *final_root {
        return Err(ChannelError::FinalRootMismatch);
    }
    Ok(())
}

impl std::fmt::Debug for ProofGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofGate")
            .field("verifiers", &self.verifiers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_zkp::{DigestProver, StateCommitment};

    struct FixedSigner(Option<Address>);

    impl SignerRecovery for FixedSigner {
        fn recover(&self, _: &Hash, _: &GroupPublicKey, _: &ThresholdSignature) -> Option<Address> {
            self.0
        }
    }

    const SELECTOR: [u8; 4] = [0xAB, 0xCD, 0x00, 0x01];
    const CONTEXT: Hash = [0x44; 32];
    const INSTANCE: Hash = [0x55; 32];

    fn gate() -> ProofGate {
        ProofGate::digest_reference(Arc::new(FixedSigner(Some([0xEE; 20]))))
    }

    fn registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        registry
            .register(FunctionEntry {
                selector: SELECTOR,
                vk_part1: vec![U256::from(1u64)],
                vk_part2: vec![U256::from(2u64)],
                instance_hash: INSTANCE,
            })
            .unwrap();
        registry
    }

    fn link(from: Hash, to: Hash) -> TransitionProof {
        let inputs = TransitionInputs {
            input_root: from,
            output_root: to,
            selector: SELECTOR,
            context: CONTEXT,
            instance: INSTANCE,
        };
        DigestProver::new().prove_transition(
            SELECTOR,
            &[U256::from(1u64)],
            &[U256::from(2u64)],
            inputs.encode(),
            0,
        )
    }

    fn claim<'a>(proofs: &'a [TransitionProof], initial: &'a Hash, last: &'a Hash) -> ChainClaim<'a> {
        ChainClaim {
            proofs,
            initial_root: initial,
            final_root: last,
            context: Some(&CONTEXT),
        }
    }

    #[test]
    fn test_initialization_roundtrip_through_oracle() {
        let keys = [U256::from(1u64), U256::from(2u64), U256::from(3u64)];
        let balances = [10, 10, 10];
        let root = committed_root(&keys, &balances);
        let signals = tree_signals(TreeSize::Leaves16, root, &keys, &balances);
        let proof = DigestProver::new().prove(TreeSize::Leaves16, &signals);
        let stored = gate()
            .verify_initialization(TreeSize::Leaves16, root, &proof, &keys, &balances)
            .unwrap();
        assert_eq!(stored, u256_to_hash(root));
    }

    fn committed_root(keys: &[U256], balances: &[Amount]) -> U256 {
        let leaves: Vec<(FieldElement, FieldElement)> = keys
            .iter()
            .zip(balances)
            .map(|(k, b)| (FieldElement::new(*k), FieldElement::from_u128(*b)))
            .collect();
        StateCommitment::commit(TreeSize::Leaves16, &leaves).unwrap().field_root().value()
    }

    #[test]
    fn test_initialization_rejects_unrelated_root() {
        let keys = [U256::from(1u64), U256::from(2u64), U256::from(3u64)];
        let balances = [10, 10, 10];
        let root = U256::from(777u64);
        let signals = tree_signals(TreeSize::Leaves16, root, &keys, &balances);
        let proof = DigestProver::new().prove(TreeSize::Leaves16, &signals);
        assert_eq!(
            gate().verify_initialization(TreeSize::Leaves16, root, &proof, &keys, &balances),
            Err(ChannelError::InitProofRejected)
        );
    }

    #[test]
    fn test_initialization_rejects_wrong_balances() {
        let keys = [U256::from(1u64)];
        let signals = tree_signals(TreeSize::Leaves16, U256::one(), &keys, &[10]);
        let proof = DigestProver::new().prove(TreeSize::Leaves16, &signals);
        assert_eq!(
            gate().verify_initialization(TreeSize::Leaves16, U256::one(), &proof, &keys, &[11]),
            Err(ChannelError::InitProofRejected)
        );
    }

    #[test]
    fn test_missing_variant_is_distinct() {
        let gate = ProofGate::new(
            VerifierSet::new(),
            Arc::new(DigestTransitionVerifier),
            Arc::new(FixedSigner(None)),
        );
        assert_eq!(
            gate.verify_initialization(TreeSize::Leaves32, U256::one(), &Groth16Proof::default(), &[], &[]),
            Err(ChannelError::VerifierUnavailable(TreeSize::Leaves32))
        );
    }

    #[test]
    fn test_wrong_arity_rejected_before_oracle() {
        let keys = vec![U256::one(); 17];
        let balances = vec![1; 17];
        assert!(matches!(
            gate().verify_initialization(TreeSize::Leaves16, U256::one(), &Groth16Proof::default(), &keys, &balances),
            Err(ChannelError::SignalLengthMismatch { expected: 33, .. })
        ));
    }

    #[test]
    fn test_chain_of_three_verifies() {
        let (a, b, c, d) = ([1u8; 32], [2u8; 32], [3u8; 32], [4u8; 32]);
        let proofs = vec![link(a, b), link(b, c), link(c, d)];
        gate()
            .verify_transition_chain(claim(&proofs, &a, &d), &registry(), 5)
            .unwrap();
    }

    #[test]
    fn test_broken_link_rejects_batch() {
        let (a, b, c, d) = ([1u8; 32], [2u8; 32], [3u8; 32], [4u8; 32]);
        let proofs = vec![link(a, b), link(c, d)];
        assert_eq!(
            gate().verify_transition_chain(claim(&proofs, &a, &d), &registry(), 5),
            Err(ChannelError::ChainDiscontinuity { index: 1 })
        );
    }

    #[test]
    fn test_chain_endpoints_checked() {
        let (a, b, c) = ([1u8; 32], [2u8; 32], [3u8; 32]);
        let proofs = vec![link(a, b)];
        assert_eq!(
            gate().verify_transition_chain(claim(&proofs, &c, &b), &registry(), 5),
            Err(ChannelError::InitialRootMismatch)
        );
        assert_eq!(
            gate().verify_transition_chain(claim(&proofs, &a, &c), &registry(), 5),
            Err(ChannelError::FinalRootMismatch)
        );
    }

    #[test]
    fn test_proof_count_bounds() {
        let a = [1u8; 32];
        let none: Vec<TransitionProof> = vec![];
        assert!(matches!(
            gate().verify_transition_chain(claim(&none, &a, &a), &registry(), 5),
            Err(ChannelError::InvalidProofCount { count: 0, max: 5 })
        ));
        let six: Vec<_> = (0..6).map(|_| link(a, a)).collect();
        assert!(matches!(
            gate().verify_transition_chain(claim(&six, &a, &a), &registry(), 5),
            Err(ChannelError::InvalidProofCount { count: 6, .. })
        ));
    }

    #[test]
    fn test_context_enforcement_toggle() {
        let (a, b) = ([1u8; 32], [2u8; 32]);
        let proofs = vec![link(a, b)];
        let other = [0x99u8; 32];
        let mut enforced = claim(&proofs, &a, &b);
        enforced.context = Some(&other);
        assert_eq!(
            gate().verify_transition_chain(enforced, &registry(), 5),
            Err(ChannelError::ContextMismatch { index: 0 })
        );
        enforced.context = None;
        assert!(gate().verify_transition_chain(enforced, &registry(), 5).is_ok());
    }

    #[test]
    fn test_unregistered_selector() {
        let (a, b) = ([1u8; 32], [2u8; 32]);
        let proofs = vec![link(a, b)];
        assert_eq!(
            gate().verify_transition_chain(claim(&proofs, &a, &b), &FunctionRegistry::new(), 5),
            Err(ChannelError::FunctionNotRegistered(SELECTOR))
        );
    }

    #[test]
    fn test_tampered_extra_fails_oracle() {
        let (a, b) = ([1u8; 32], [2u8; 32]);
        let mut proofs = vec![link(a, b)];
        proofs[0].extra = 1;
        assert_eq!(
            gate().verify_transition_chain(claim(&proofs, &a, &b), &registry(), 5),
            Err(ChannelError::TransitionProofRejected { index: 0 })
        );
    }

    #[test]
    fn test_signature_must_recover_signer() {
        let key = GroupPublicKey::new([0; 32], [0; 32]);
        let sig = ThresholdSignature {
            r: GroupPublicKey::new([0; 32], [0; 32]),
            z: [0; 32],
        };
        let gate = gate();
        assert!(gate
            .verify_signature(ChannelId(1), &[0; 32], &key, &sig, &[0xEE; 20])
            .is_ok());
        assert_eq!(
            gate.verify_signature(ChannelId(1), &[0; 32], &key, &sig, &[0xEF; 20]),
            Err(ChannelError::SignatureRejected)
        );
    }
}
