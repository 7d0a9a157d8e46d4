//! # Domain Entities
//!
//! Channels, disputes, registry entries and the payloads submitted by leaders.

use super::value_objects::{ChannelId, ChannelState, DisputeId, DisputeStatus, FunctionSelector};
use bridge_zkp::{Groth16Proof, TreeSize};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_crypto::GroupPublicKey;
use shared_types::{Address, Amount, Hash, Timestamp, TokenId};

/// A multi-party state channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Identifier.
    pub id: ChannelId,
    /// Opener; the only account allowed to drive settlement.
    pub leader: Address,
    /// Ordered, duplicate-free token set.
    pub allowed_tokens: Vec<TokenId>,
    /// Ordered, duplicate-free member list.
    pub participants: Vec<Address>,
    /// Lifecycle state.
    pub state: ChannelState,
    /// Closed through the emergency exit.
    pub emergency: bool,
    /// A dispute has been raised against the leader.
    pub disputed: bool,
    /// Creation time.
    pub open_timestamp: Timestamp,
    /// Seconds after opening before settlement may start.
    pub timeout: u64,
    /// Time the channel reached `Closed`.
    pub close_timestamp: Option<Timestamp>,
    /// Bond actually received from the leader.
    pub leader_bond: Amount,
    /// Bond moved to the treasury pool.
    pub bond_slashed: bool,
    /// Bond returned to the leader.
    pub bond_reclaimed: bool,
    /// Root proven by the initialization proof.
    pub initial_state_root: Option<Hash>,
    /// Root accepted with the transition chain.
    pub final_state_root: Option<Hash>,
    /// Smallest circuit holding `participants × tokens` leaves.
    pub required_tree_size: TreeSize,
    /// Aggregated key authorizing settlement.
    pub group_key: GroupPublicKey,
    /// Address derived from `group_key`.
    pub signer: Address,
    /// Block context commitment captured at initialization.
    pub block_context_hash: Option<Hash>,
}

impl Channel {
    /// Check channel membership.
    pub fn is_participant(&self, account: &Address) -> bool {
        self.participants.contains(account)
    }

    /// Check if token is in the channel's set.
    pub fn allows_token(&self, token: &TokenId) -> bool {
        self.allowed_tokens.contains(token)
    }

    /// Leaf slots in use.
    pub fn leaf_count(&self) -> usize {
        self.participants.len() * self.allowed_tokens.len()
    }

    /// First moment settlement may start.
    pub fn timeout_at(&self) -> Timestamp {
        self.open_timestamp.saturating_add(self.timeout)
    }

    /// Last moment settlement proofs are accepted.
    pub fn settlement_deadline(&self, grace: u64) -> Timestamp {
        self.timeout_at().saturating_add(grace)
    }

    /// End of the dispute window, once closed.
    pub fn dispute_window_end(&self, window: u64) -> Option<Timestamp> {
        self.close_timestamp.map(|t| t.saturating_add(window))
    }

    /// Closed through conservation proof, no emergency.
    pub fn is_settled(&self) -> bool {
        self.state == ChannelState::Closed && !self.emergency
    }

    /// Bond is no longer held for this channel.
    pub fn bond_settled(&self) -> bool {
        self.bond_slashed || self.bond_reclaimed
    }
}

/// Arguments of `open_channel`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenChannelRequest {
    /// Tokens to lock.
    pub tokens: Vec<TokenId>,
    /// Members.
    pub participants: Vec<Address>,
    /// Seconds before settlement may start.
    pub timeout: u64,
    /// Aggregated group public key.
    pub group_key: GroupPublicKey,
}

/// Leader's initialization submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializationProof {
    /// Claimed root of the deposit tree.
    pub merkle_root: U256,
    /// Proof over `[root, keys…, balances…]`.
    pub proof: Groth16Proof,
}

/// Leader's conservation submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConservationProof {
    /// Final balances, one row per token, one column per participant.
    pub final_balances: Vec<Vec<Amount>>,
    /// Proof over `[final_root, keys…, final balances…]`.
    pub proof: Groth16Proof,
}

/// Registered transition circuit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionEntry {
    /// Selector carried by each transition proof.
    pub selector: FunctionSelector,
    /// First preprocessed verification-key part.
    pub vk_part1: Vec<U256>,
    /// Second preprocessed verification-key part.
    pub vk_part2: Vec<U256>,
    /// Commitment to the circuit instance.
    pub instance_hash: Hash,
}

/// Accusation against a channel leader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    /// Identifier.
    pub id: DisputeId,
    /// Channel concerned.
    pub channel_id: ChannelId,
    /// Participant raising it.
    pub accuser: Address,
    /// Leader accused.
    pub accused: Address,
    /// Current status.
    pub status: DisputeStatus,
    /// Time raised.
    pub timestamp: Timestamp,
    /// Opaque evidence blob.
    pub evidence: Vec<u8>,
}

impl Dispute {
    /// A raised dispute older than `timeout` is inert.
    pub fn is_expired(&self, now: Timestamp, timeout: u64) -> bool {
        self.status == DisputeStatus::Raised && now >= self.timestamp.saturating_add(timeout)
    }

    /// Raised and not yet expired.
    pub fn is_pending(&self, now: Timestamp, timeout: u64) -> bool {
        self.status == DisputeStatus::Raised && !self.is_expired(now, timeout)
    }
}

/// Bond bookkeeping of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondStatus {
    /// Amount held.
    pub amount: Amount,
    /// Moved to the treasury pool.
    pub slashed: bool,
    /// Returned to the leader.
    pub reclaimed: bool,
}
