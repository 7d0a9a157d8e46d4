//! # Channel Events
//!
//! Facts published after an operation commits. Events are never emitted for
//! rejected operations.

use crate::domain::{ChannelId, ClosePath, DisputeId, FunctionSelector, WithdrawalPath};
use bridge_zkp::TreeSize;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, Hash, TokenId};

/// Event published by the bridge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelEvent {
    /// Channel created and bond collected.
    ChannelOpened {
        /// Channel
        channel: ChannelId,
        /// Leader
        leader: Address,
        /// Circuit size
        tree_size: TreeSize,
        /// Bond received
        bond: Amount,
    },
    /// Deposit credited.
    Deposited {
        /// Channel
        channel: ChannelId,
        /// Token
        token: TokenId,
        /// Depositor
        participant: Address,
        /// Amount credited (after transfer fees)
        amount: Amount,
    },
    /// Off-ledger key recorded or replaced.
    KeyRecorded {
        /// Channel
        channel: ChannelId,
        /// Token
        token: TokenId,
        /// Owner of the key
        participant: Address,
    },
    /// Initial state proven.
    StateInitialized {
        /// Channel
        channel: ChannelId,
        /// Proven root
        root: Hash,
    },
    /// Channel activated.
    ChannelActivated {
        /// Channel
        channel: ChannelId,
    },
    /// Final root accepted.
    ClosingStarted {
        /// Channel
        channel: ChannelId,
        /// Accepted root
        final_root: Hash,
        /// Number of chained proofs
        proofs: usize,
    },
    /// Channel reached `Closed`.
    ChannelClosed {
        /// Channel
        channel: ChannelId,
        /// How it closed
        path: ClosePath,
    },
    /// Funds paid out.
    Withdrawn {
        /// Channel
        channel: ChannelId,
        /// Token
        token: TokenId,
        /// Recipient
        participant: Address,
        /// Amount paid
        amount: Amount,
        /// Path
        path: WithdrawalPath,
    },
    /// Leader bond moved to the treasury pool.
    BondSlashed {
        /// Channel
        channel: ChannelId,
        /// Leader
        leader: Address,
        /// Amount slashed
        amount: Amount,
    },
    /// Leader bond returned.
    BondReclaimed {
        /// Channel
        channel: ChannelId,
        /// Leader
        leader: Address,
        /// Amount returned
        amount: Amount,
    },
    /// Dispute raised.
    DisputeRaised {
        /// Dispute
        dispute: DisputeId,
        /// Channel
        channel: ChannelId,
        /// Accuser
        accuser: Address,
    },
    /// Dispute upheld.
    DisputeResolved {
        /// Dispute
        dispute: DisputeId,
        /// Channel
        channel: ChannelId,
    },
    /// Dispute dismissed.
    DisputeRejected {
        /// Dispute
        dispute: DisputeId,
        /// Channel
        channel: ChannelId,
    },
    /// Treasury pool swept.
    TreasuryWithdrawn {
        /// Recipient
        treasury: Address,
        /// Amount swept
        amount: Amount,
    },
    /// Treasury recipient changed.
    TreasuryChanged {
        /// New recipient
        treasury: Address,
    },
    /// Transition circuit registered.
    FunctionRegistered {
        /// Selector
        selector: FunctionSelector,
    },
    /// Transition circuit removed.
    FunctionUnregistered {
        /// Selector
        selector: FunctionSelector,
    },
    /// Channel records removed.
    ChannelPurged {
        /// Channel
        channel: ChannelId,
    },
}

impl ChannelEvent {
    /// Channel this event concerns, if any.
    pub fn channel(&self) -> Option<ChannelId> {
        use ChannelEvent::*;
        match self {
            ChannelOpened { channel, .. }
            | Deposited { channel, .. }
            | KeyRecorded { channel, .. }
            | StateInitialized { channel, .. }
            | ChannelActivated { channel }
            | ClosingStarted { channel, .. }
            | ChannelClosed { channel, .. }
            | Withdrawn { channel, .. }
            | BondSlashed { channel, .. }
            | BondReclaimed { channel, .. }
            | DisputeRaised { channel, .. }
            | DisputeResolved { channel, .. }
            | DisputeRejected { channel, .. }
            | ChannelPurged { channel } => Some(*channel),
            TreasuryWithdrawn { .. }
            | TreasuryChanged { .. }
            | FunctionRegistered { .. }
            | FunctionUnregistered { .. } => None,
        }
    }
}
