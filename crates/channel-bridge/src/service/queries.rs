//! Read accessors. All take the read lock and return owned snapshots.

use super::ChannelBridgeService;
use crate::domain::{
    BondStatus, BridgeConfig, Channel, ChannelError, ChannelId, ChannelState, Dispute, DisputeId,
    FunctionEntry, FunctionSelector,
};
use crate::ports::{TimeSource, TokenGateway};
use primitive_types::U256;
use shared_types::{Address, Amount, Timestamp, TokenId};

impl<G, T> ChannelBridgeService<G, T>
where
    G: TokenGateway,
    T: TimeSource,
{
    /// Snapshot of a channel.
    pub fn channel(&self, id: ChannelId) -> Result<Channel, ChannelError> {
        self.state.read().channel(id).cloned()
    }

    /// Lifecycle state; `None` for unknown channels.
    pub fn channel_state(&self, id: ChannelId) -> ChannelState {
        self.state
            .read()
            .channels
            .get(&id)
            .map(|c| c.state)
            .unwrap_or_default()
    }

    /// Id the next opened channel will get.
    pub fn next_channel_id(&self) -> ChannelId {
        ChannelId(self.state.read().next_channel_id)
    }

    /// Effective configuration.
    pub fn config(&self) -> BridgeConfig {
        self.state.read().config.clone()
    }

    /// Last moment settlement proofs are accepted.
    pub fn settlement_deadline(&self, id: ChannelId) -> Result<Timestamp, ChannelError> {
        let state = self.state.read();
        let grace = state.config.proof_submission_deadline;
        state.channel(id).map(|c| c.settlement_deadline(grace))
    }

    // =========================================================================
    // LEDGER
    // =========================================================================

    /// Recorded deposit of a cell.
    pub fn deposit_of(&self, id: ChannelId, token: &TokenId, participant: &Address) -> Amount {
        self.state.read().ledger.deposit_of(id, *token, *participant)
    }

    /// Sum of deposits of a token.
    pub fn total_deposits(&self, id: ChannelId, token: &TokenId) -> Amount {
        self.state.read().ledger.total_of(id, *token)
    }

    /// Off-ledger key of a cell.
    pub fn off_ledger_key(&self, id: ChannelId, token: &TokenId, participant: &Address) -> Option<U256> {
        self.state.read().ledger.key_of(id, *token, *participant)
    }

    /// Settled amount still owed for a cell.
    pub fn withdrawable_amount(&self, id: ChannelId, participant: &Address, token: &TokenId) -> Amount {
        self.state
            .read()
            .ledger
            .withdrawable_amount(id, *participant, *token)
    }

    /// Whether a cell was withdrawn through the normal path.
    pub fn is_withdrawn(&self, id: ChannelId, participant: &Address, token: &TokenId) -> bool {
        self.state.read().ledger.is_withdrawn(id, *participant, *token)
    }

    /// Emergency amount still owed for a cell.
    pub fn emergency_amount(&self, id: ChannelId, participant: &Address, token: &TokenId) -> Amount {
        self.state.read().ledger.emergency_amount(id, *participant, *token)
    }

    /// Whether a participant used the emergency exit.
    pub fn is_emergency_withdrawn(&self, id: ChannelId, participant: &Address) -> bool {
        self.state.read().ledger.is_emergency_claimed(id, *participant)
    }

    // =========================================================================
    // SECURITY
    // =========================================================================

    /// Bond bookkeeping of a channel.
    pub fn bond_status(&self, id: ChannelId) -> Result<BondStatus, ChannelError> {
        self.state.read().channel(id).map(|c| BondStatus {
            amount: c.leader_bond,
            slashed: c.bond_slashed,
            reclaimed: c.bond_reclaimed,
        })
    }

    /// Slashed bonds awaiting a sweep.
    pub fn treasury_pool(&self) -> Amount {
        self.state.read().security.treasury_pool()
    }

    /// Current treasury recipient.
    pub fn treasury(&self) -> Address {
        self.state.read().security.treasury()
    }

    /// Live channel led by `leader`.
    pub fn leader_channel(&self, leader: &Address) -> Option<ChannelId> {
        self.state.read().security.leader_channel(leader)
    }

    // =========================================================================
    // DISPUTES & REGISTRY
    // =========================================================================

    /// Dispute by id.
    pub fn dispute(&self, id: DisputeId) -> Option<Dispute> {
        self.state.read().disputes.get(id).cloned()
    }

    /// Disputes of a channel, oldest first.
    pub fn channel_disputes(&self, id: ChannelId) -> Vec<Dispute> {
        self.state
            .read()
            .disputes
            .by_channel(id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Registered transition circuit.
    pub fn function(&self, selector: &FunctionSelector) -> Option<FunctionEntry> {
        self.state.read().registry.get(selector).cloned()
    }
}
