//! # Public Input Encoding
//!
//! Tree circuits (initialization and conservation) take
//!
//! ```text
//! [root, key_1 .. key_N, balance_1 .. balance_N]      N = tree size
//! ```
//!
//! with cells in `(token, participant)` token-major order, every value reduced
//! modulo the BN254 scalar prime and unused slots zero.
//!
//! Transition circuits start with a fixed prefix:
//!
//! ```text
//! [in_hi, in_lo, out_hi, out_lo, selector, ctx_hi, ctx_lo, inst_hi, inst_lo, ..]
//! ```
//!
//! Roots and commitments are carried as 128-bit halves so they survive the
//! field reduction exactly.

use crate::domain::{ChannelError, ChannelId, FunctionSelector};
use bridge_zkp::{join_halves, split_hash, FieldElement, TransitionProof, TreeSize};
use primitive_types::U256;
use shared_crypto::keccak256_concat;
use shared_types::{u256_to_hash, Amount, Hash};

/// Words in the fixed transition prefix.
pub const TRANSITION_PREFIX_LEN: usize = 9;

/// Build the public signal vector of a tree circuit.
///
/// The result only has the circuit's arity when `keys` and `balances` fit the
/// tree; callers compare against [`TreeSize::public_signal_len`].
pub fn tree_signals(size: TreeSize, root: U256, keys: &[U256], balances: &[Amount]) -> Vec<U256> {
    let slots = size.leaves();
    let mut signals = Vec::with_capacity(size.public_signal_len());
    signals.push(FieldElement::new(root).value());
    signals.extend(keys.iter().map(|k| FieldElement::new(*k).value()));
    signals.extend(std::iter::repeat(U256::zero()).take(slots.saturating_sub(keys.len())));
    signals.extend(balances.iter().map(|b| FieldElement::from_u128(*b).value()));
    signals.extend(std::iter::repeat(U256::zero()).take(slots.saturating_sub(balances.len())));
    signals
}

/// Selector as a single public-input word.
pub fn selector_word(selector: FunctionSelector) -> U256 {
    U256::from(u32::from_be_bytes(selector))
}

/// Message the group signs to authorize a final root.
///
/// `keccak256(be32(channel_id) ‖ final_root)`
pub fn closing_message(channel: ChannelId, final_root: &Hash) -> Hash {
    let id = u256_to_hash(U256::from(channel.0));
    keccak256_concat(&[&id[..], &final_root[..]])
}

/// Decoded transition prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionInputs {
    /// Root the transition starts from.
    pub input_root: Hash,
    /// Root the transition produces.
    pub output_root: Hash,
    /// Circuit selector.
    pub selector: FunctionSelector,
    /// Block context commitment.
    pub context: Hash,
    /// Circuit instance commitment.
    pub instance: Hash,
}

impl TransitionInputs {
    /// Decode the prefix of the `index`-th proof of a chain.
    pub fn parse(index: usize, proof: &TransitionProof) -> Result<Self, ChannelError> {
        let malformed = |reason: String| ChannelError::MalformedPublicInputs { index, reason };
        let words = &proof.public_inputs;
        if words.len() < TRANSITION_PREFIX_LEN {
            return Err(malformed(format!(
                "{} words, prefix needs {}",
                words.len(),
                TRANSITION_PREFIX_LEN
            )));
        }
        if words[4] != selector_word(proof.selector) {
            return Err(malformed(format!(
                "selector word does not match 0x{}",
                hex::encode(proof.selector)
            )));
        }
        let join = |hi: usize| join_halves(words[hi], words[hi + 1]).map_err(|e| malformed(e.to_string()));

        Ok(Self {
            input_root: join(0)?,
            output_root: join(2)?,
            selector: proof.selector,
            context: join(5)?,
            instance: join(7)?,
        })
    }

    /// Encode as the fixed prefix.
    pub fn encode(&self) -> Vec<U256> {
        let halves = |hash: &Hash| {
            let (hi, lo) = split_hash(hash);
            [hi.value(), lo.value()]
        };
        let mut words = Vec::with_capacity(TRANSITION_PREFIX_LEN);
        words.extend(halves(&self.input_root));
        words.extend(halves(&self.output_root));
        words.push(selector_word(self.selector));
        words.extend(halves(&self.context));
        words.extend(halves(&self.instance));
        words
    }
}
