//! # Domain Value Objects
//!
//! Identifiers, lifecycle states and small immutable records.

use serde::{Deserialize, Serialize};
use shared_crypto::keccak256_concat;
use shared_types::Hash;
use std::fmt;

/// Channel identifier, assigned monotonically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Dispute identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DisputeId(pub u64);

impl fmt::Display for DisputeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.0)
    }
}

/// 4-byte selector of a registered transition circuit.
pub type FunctionSelector = [u8; 4];

/// Channel lifecycle.
///
/// ```text
/// None → Initialized → Open ─┬─────────→ Closing → Closed
///                            └→ Active ─┘
/// ```
///
/// Any live state may also be forced to `Closed` by the timeout handler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelState {
    /// Not created.
    #[default]
    None,
    /// Created, accepting deposits and keys.
    Initialized,
    /// Initial state proven; membership closed.
    Open,
    /// Explicitly activated by the leader.
    Active,
    /// Final root accepted, awaiting conservation proof.
    Closing,
    /// Terminal.
    Closed,
}

impl ChannelState {
    /// Check if a happy-path transition is valid.
    pub fn can_transition_to(&self, next: ChannelState) -> bool {
        matches!(
            (self, next),
            (Self::None, Self::Initialized)
                | (Self::Initialized, Self::Open)
                | (Self::Open, Self::Active)
                | (Self::Open, Self::Closing)
                | (Self::Active, Self::Closing)
                | (Self::Closing, Self::Closed)
        )
    }

    /// States from which the emergency exit may close the channel.
    pub fn can_force_close(&self) -> bool {
        !matches!(self, Self::None | Self::Closed)
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Dispute status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeStatus {
    /// Awaiting the owner's decision.
    Raised,
    /// Upheld against the leader.
    Resolved,
    /// Dismissed.
    Rejected,
}

/// How a channel reached `Closed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClosePath {
    /// Conservation proof accepted.
    Settled,
    /// Leader missed the settlement deadline.
    Timeout,
    /// Dispute upheld against the leader.
    Dispute,
}

impl ClosePath {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Settled => "settled",
            Self::Timeout => "timeout",
            Self::Dispute => "dispute",
        }
    }
}

/// Which withdrawal path paid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WithdrawalPath {
    /// Proven final balance.
    Normal,
    /// Deposit snapshot after an emergency.
    Emergency,
}

impl WithdrawalPath {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Emergency => "emergency",
        }
    }
}

/// Block context captured when a channel's initial state is proven.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    /// Block number.
    pub number: u64,
    /// Block hash.
    pub hash: Hash,
    /// Block timestamp.
    pub timestamp: u64,
}

impl BlockContext {
    /// `keccak256(number ‖ hash ‖ timestamp)`, integers big-endian.
    pub fn commitment(&self) -> Hash {
        keccak256_concat(&[
            &self.number.to_be_bytes()[..],
            &self.hash[..],
            &self.timestamp.to_be_bytes()[..],
        ])
    }
}
