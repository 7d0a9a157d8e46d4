//! # Proof Types and Verifier Oracles
//!
//! The bridge treats pairing checks as oracles: it assembles public signals,
//! selects the verifier for the channel's tree size and asks for a yes/no.
//!
//! Two oracle shapes exist:
//!
//! - [`Groth16Verifier`] for initialization and conservation proofs
//! - [`TransitionVerifier`] for the chained state-transition proofs, whose
//!   verification key arrives in two preprocessed parts from the function
//!   registry
//!
//! The `Digest*` types are a reference prover/verifier pair that binds a
//! proof to its public inputs through keccak. They let the full settlement
//! pipeline run without a trusted setup. The tree verifier also recomputes
//! the [`StateCommitment`] over the key and balance signals, so the root
//! signal must commit to exactly those balances.

use crate::commitment::StateCommitment;
use crate::field::FieldElement;
use crate::tree::TreeSize;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_crypto::keccak256_concat;
use shared_types::u256_to_hash;

/// Groth16 proof points as field coordinates (`a ∈ G1`, `b ∈ G2`, `c ∈ G1`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groth16Proof {
    /// Point A
    pub a: [U256; 2],
    /// Point B
    pub b: [[U256; 2]; 2],
    /// Point C
    pub c: [U256; 2],
}

/// One link of a state-transition chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionProof {
    /// Registered circuit selector
    pub selector: [u8; 4],
    /// First proof segment
    pub part1: Vec<U256>,
    /// Second proof segment
    pub part2: Vec<U256>,
    /// Public inputs, fixed prefix first
    pub public_inputs: Vec<U256>,
    /// Circuit-specific auxiliary word
    pub extra: u64,
}

/// Groth16 pairing-check oracle.
pub trait Groth16Verifier: Send + Sync {
    /// Whether `proof` is valid for `public_signals`.
    fn verify(&self, proof: &Groth16Proof, public_signals: &[U256]) -> bool;
}

/// General zk-SNARK oracle for transition proofs.
pub trait TransitionVerifier: Send + Sync {
    /// Whether the two proof parts verify under the two key parts.
    fn verify(
        &self,
        part1: &[U256],
        part2: &[U256],
        vk_part1: &[U256],
        vk_part2: &[U256],
        public_inputs: &[U256],
        extra: u64,
    ) -> bool;
}

/// Keccak of a sequence of words, reduced into the field.
pub fn signal_digest(words: &[U256]) -> FieldElement {
    let encoded: Vec<[u8; 32]> = words.iter().map(|w| u256_to_hash(*w)).collect();
    let parts: Vec<&[u8]> = encoded.iter().map(|w| &w[..]).collect();
    FieldElement::from_hash(&keccak256_concat(&parts))
}

/// Reference prover matching the digest verifiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct DigestProver;

impl DigestProver {
    /// Create new prover.
    pub fn new() -> Self {
        Self
    }

    /// Prove a statement over `public_signals` for a tree of `size`.
    pub fn prove(&self, size: TreeSize, public_signals: &[U256]) -> Groth16Proof {
        let digest = signal_digest(public_signals).value();
        let tag = U256::from(size.leaves());
        Groth16Proof {
            a: [digest, tag],
            b: [[tag, digest], [digest, tag]],
            c: [tag, digest],
        }
    }

    /// Prove a transition under the given verification-key parts.
    pub fn prove_transition(
        &self,
        selector: [u8; 4],
        vk_part1: &[U256],
        vk_part2: &[U256],
        public_inputs: Vec<U256>,
        extra: u64,
    ) -> TransitionProof {
        let (part1, part2) = transition_parts(vk_part1, vk_part2, &public_inputs, extra);
        TransitionProof {
            selector,
            part1,
            part2,
            public_inputs,
            extra,
        }
    }
}

fn transition_parts(
    vk_part1: &[U256],
    vk_part2: &[U256],
    public_inputs: &[U256],
    extra: u64,
) -> (Vec<U256>, Vec<U256>) {
    let mut keyed = Vec::with_capacity(vk_part1.len() + vk_part2.len());
    keyed.extend_from_slice(vk_part1);
    keyed.extend_from_slice(vk_part2);
    let key_digest = signal_digest(&keyed).value();

    let mut statement = Vec::with_capacity(public_inputs.len() + 2);
    statement.push(key_digest);
    statement.extend_from_slice(public_inputs);
    statement.push(U256::from(extra));
    (vec![key_digest], vec![signal_digest(&statement).value()])
}

/// Digest verifier compiled for one tree size.
#[derive(Clone, Copy, Debug)]
pub struct DigestGroth16Verifier {
    size: TreeSize,
}

impl DigestGroth16Verifier {
    /// Create verifier for `size`.
    pub fn new(size: TreeSize) -> Self {
        Self { size }
    }

    /// Whether `signals[0]` is the commitment of the `(key, balance)` signals.
    fn root_matches(&self, signals: &[U256]) -> bool {
        let slots = self.size.leaves();
        let leaves: Vec<(FieldElement, FieldElement)> = signals[1..=slots]
            .iter()
            .zip(&signals[slots + 1..])
            .map(|(key, balance)| (FieldElement::new(*key), FieldElement::new(*balance)))
            .collect();
        StateCommitment::commit(self.size, &leaves)
            .map(|commitment| commitment.field_root().value() == signals[0])
            .unwrap_or(false)
    }
}

impl Groth16Verifier for DigestGroth16Verifier {
    fn verify(&self, proof: &Groth16Proof, public_signals: &[U256]) -> bool {
        if public_signals.len() != self.size.public_signal_len() {
            return false;
        }
        self.root_matches(public_signals) && *proof == DigestProver.prove(self.size, public_signals)
    }
}

/// Digest verifier for transition proofs.
#[derive(Clone, Copy, Debug, Default)]
pub struct DigestTransitionVerifier;

impl TransitionVerifier for DigestTransitionVerifier {
    fn verify(
        &self,
        part1: &[U256],
        part2: &[U256],
        vk_part1: &[U256],
        vk_part2: &[U256],
        public_inputs: &[U256],
        extra: u64,
    ) -> bool {
        let (expected1, expected2) = transition_parts(vk_part1, vk_part2, public_inputs, extra);
        part1 == expected1.as_slice() && part2 == expected2.as_slice()
    }
}
