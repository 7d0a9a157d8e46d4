//! # Inbound Ports
//!
//! API trait defining what the channel bridge can do.

use crate::domain::{
    Channel, ChannelError, ChannelId, ConservationProof, DisputeId, FunctionEntry,
    FunctionSelector, InitializationProof, OpenChannelRequest,
};
use bridge_zkp::TransitionProof;
use primitive_types::U256;
use shared_crypto::ThresholdSignature;
use shared_types::{Address, Amount, Hash, TokenId};

/// Channel bridge API - inbound port.
///
/// Every call is atomic: on `Err` nothing observable changed.
pub trait ChannelBridgeApi: Send + Sync {
    /// Open a channel led by `caller`, collecting the leader bond.
    fn open_channel(
        &self,
        caller: Address,
        request: OpenChannelRequest,
    ) -> Result<ChannelId, ChannelError>;

    /// Deposit `amount` of `token`; returns the amount actually credited.
    fn deposit(
        &self,
        caller: Address,
        channel: ChannelId,
        token: TokenId,
        amount: Amount,
        key: Option<U256>,
    ) -> Result<Amount, ChannelError>;

    /// Set or replace the caller's off-ledger key for `token`.
    fn record_key(
        &self,
        caller: Address,
        channel: ChannelId,
        token: TokenId,
        key: U256,
    ) -> Result<(), ChannelError>;

    /// Prove the deposit tree; `Initialized -> Open`.
    fn initialize_state(
        &self,
        caller: Address,
        channel: ChannelId,
        proof: InitializationProof,
    ) -> Result<Hash, ChannelError>;

    /// `Open -> Active`.
    fn activate(&self, caller: Address, channel: ChannelId) -> Result<(), ChannelError>;

    /// Submit the transition chain and group signature; `-> Closing`.
    fn advance_to_closing(
        &self,
        caller: Address,
        channel: ChannelId,
        proofs: Vec<TransitionProof>,
        final_root: Hash,
        signature: ThresholdSignature,
    ) -> Result<(), ChannelError>;

    /// Submit final balances with the conservation proof; `Closing -> Closed`.
    fn finalize_close(
        &self,
        caller: Address,
        channel: ChannelId,
        proof: ConservationProof,
    ) -> Result<(), ChannelError>;

    /// Withdraw the caller's settled balance of `token`.
    fn withdraw(
        &self,
        caller: Address,
        channel: ChannelId,
        token: TokenId,
    ) -> Result<Amount, ChannelError>;

    /// Slash an absent leader and open the emergency exit.
    fn handle_proof_timeout(&self, caller: Address, channel: ChannelId)
        -> Result<(), ChannelError>;

    /// Return the bond to an honest leader.
    fn reclaim_leader_bond(
        &self,
        caller: Address,
        channel: ChannelId,
    ) -> Result<Amount, ChannelError>;

    /// Sweep the treasury pool.
    fn withdraw_treasury(&self, caller: Address) -> Result<Amount, ChannelError>;

    /// Change the treasury recipient.
    fn set_treasury(&self, caller: Address, treasury: Address) -> Result<(), ChannelError>;

    /// Accuse the leader of a closed channel.
    fn raise_dispute(
        &self,
        caller: Address,
        channel: ChannelId,
        evidence: Vec<u8>,
    ) -> Result<DisputeId, ChannelError>;

    /// Uphold a dispute.
    fn resolve_dispute(&self, caller: Address, dispute: DisputeId) -> Result<(), ChannelError>;

    /// Dismiss a dispute.
    fn reject_dispute(&self, caller: Address, dispute: DisputeId) -> Result<(), ChannelError>;

    /// Pay every emergency amount owed to the caller.
    fn emergency_withdraw(
        &self,
        caller: Address,
        channel: ChannelId,
    ) -> Result<Vec<(TokenId, Amount)>, ChannelError>;

    /// Register a transition circuit.
    fn register_function(&self, caller: Address, entry: FunctionEntry)
        -> Result<(), ChannelError>;

    /// Remove a transition circuit.
    fn unregister_function(
        &self,
        caller: Address,
        selector: FunctionSelector,
    ) -> Result<(), ChannelError>;

    /// Remove a fully settled channel.
    fn purge_channel(&self, caller: Address, channel: ChannelId) -> Result<(), ChannelError>;

    /// Snapshot of a channel.
    fn channel(&self, channel: ChannelId) -> Result<Channel, ChannelError>;

    /// Settled amount still owed for a cell.
    fn withdrawable_amount(&self, channel: ChannelId, participant: &Address, token: &TokenId)
        -> Amount;
}
