//! # Channel Bridge Service
//!
//! Orchestrates the state machine, deposit ledger, proof gate, economic
//! security and dispute engine behind one lock.
//!
//! ## Atomicity
//!
//! Every operation runs under a single write lock on the bridge state and
//! validates all preconditions before mutating. Incoming transfers happen
//! before bookkeeping; outgoing transfers follow *mutate, then transfer* and
//! a failed transfer restores the mutated cells.

mod admin;
mod deposits;
mod disputes;
mod lifecycle;
mod queries;
mod security;


use crate::dispute::DisputeBook;
use crate::domain::{
    BridgeConfig, Channel, ChannelError, ChannelId, ChannelState, ConservationProof, DisputeId,
    FunctionEntry, FunctionSelector, InitializationProof, OpenChannelRequest,
};
use crate::events::ChannelEvent;
use crate::ledger::DepositLedger;
use crate::metrics::record_error;
use crate::ports::{BlockContextProvider, ChannelBridgeApi, EventPublisher, TimeSource, TokenGateway};
use crate::proof_gate::{FunctionRegistry, ProofGate};
use crate::security::EconomicSecurity;
use bridge_zkp::TransitionProof;
use parking_lot::RwLock;
use primitive_types::U256;
use shared_crypto::ThresholdSignature;
use shared_types::{Address, Amount, Hash, TokenId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything the bridge owns.
#[derive(Debug)]
struct BridgeState {
    config: BridgeConfig,
    channels: BTreeMap<ChannelId, Channel>,
    next_channel_id: u64,
    ledger: DepositLedger,
    security: EconomicSecurity,
    disputes: DisputeBook,
    registry: FunctionRegistry,
}

impl BridgeState {
    fn new(config: BridgeConfig) -> Self {
        Self {
            next_channel_id: config.first_channel_id,
            security: EconomicSecurity::new(config.treasury),
            config,
            channels: BTreeMap::new(),
            ledger: DepositLedger::new(),
            disputes: DisputeBook::new(),
            registry: FunctionRegistry::new(),
        }
    }

    fn channel(&self, id: ChannelId) -> Result<&Channel, ChannelError> {
        self.channels.get(&id).ok_or(ChannelError::ChannelNotFound(id))
    }

    fn ensure_owner(&self, caller: &Address) -> Result<(), ChannelError> {
        if *caller != self.config.owner {
            return Err(ChannelError::NotOwner(*caller));
        }
        Ok(())
    }

    /// Keys in `(token, participant)` order; missing keys are zero.
    fn cell_keys(&self, channel: &Channel) -> Vec<U256> {
        channel
            .allowed_tokens
            .iter()
            .flat_map(|&token| {
                channel.participants.iter().map(move |&p| {
                    self.ledger.key_of(channel.id, token, p).unwrap_or_else(U256::zero)
                })
            })
            .collect()
    }

    /// Deposits in `(token, participant)` order.
    fn cell_deposits(&self, channel: &Channel) -> Vec<Amount> {
        channel
            .allowed_tokens
            .iter()
            .flat_map(|&token| {
                channel
                    .participants
                    .iter()
                    .map(move |&p| self.ledger.deposit_of(channel.id, token, p))
            })
            .collect()
    }

    fn has_pending_dispute(&self, channel: ChannelId, now: u64) -> bool {
        self.disputes
            .has_pending(channel, now, self.config.dispute_timeout)
    }
}

fn ensure_state(channel: &Channel, allowed: &[ChannelState], expected: &'static str) -> Result<(), ChannelError> {
    if allowed.contains(&channel.state) {
        Ok(())
    } else {
        Err(ChannelError::InvalidState {
            channel: channel.id,
            expected,
            actual: channel.state,
        })
    }
}

fn ensure_leader(channel: &Channel, caller: &Address) -> Result<(), ChannelError> {
    if channel.leader != *caller {
        return Err(ChannelError::NotLeader {
            channel: channel.id,
            caller: *caller,
        });
    }
    Ok(())
}

fn ensure_participant(channel: &Channel, caller: &Address) -> Result<(), ChannelError> {
    if !channel.is_participant(caller) {
        return Err(ChannelError::NotParticipant {
            channel: channel.id,
            caller: *caller,
        });
    }
    Ok(())
}

/// Count a rejected operation before handing the error back.
fn tracked<R>(operation: &'static str, result: Result<R, ChannelError>) -> Result<R, ChannelError> {
    if let Err(e) = &result {
        record_error(operation, e);
        debug!("[bridge] {} rejected ({}): {}", operation, e.class().as_str(), e);
    }
    result
}

/// Channel bridge service.
pub struct ChannelBridgeService<G, T>
where
    G: TokenGateway,
    T: TimeSource,
{
    state: Arc<RwLock<BridgeState>>,
    gate: ProofGate,
    tokens: Arc<G>,
    clock: Arc<T>,
    context: Arc<dyn BlockContextProvider>,
    events: Arc<dyn EventPublisher>,
}

impl<G, T> ChannelBridgeService<G, T>
where
    G: TokenGateway,
    T: TimeSource,
{
    /// Create a service; the configuration is validated first.
    pub fn new(
        config: BridgeConfig,
        gate: ProofGate,
        tokens: Arc<G>,
        clock: Arc<T>,
        context: Arc<dyn BlockContextProvider>,
        events: Arc<dyn EventPublisher>,
    ) -> Result<Self, ChannelError> {
        config.validate()?;
        info!(
            "[bridge] Service started: {} supported tokens, bond {}",
            config.supported_tokens.len(),
            config.leader_bond
        );
        Ok(Self {
            state: Arc::new(RwLock::new(BridgeState::new(config))),
            gate,
            tokens,
            clock,
            context,
            events,
        })
    }

    fn now(&self) -> u64 {
        self.clock.now()
    }

    fn publish(&self, event: ChannelEvent) {
        self.events.publish(event);
    }

    /// Pull `amount` from `from` into the vault; returns what actually arrived.
    fn pull_into_vault(
        &self,
        vault: &Address,
        token: &TokenId,
        from: &Address,
        amount: Amount,
    ) -> Result<Amount, ChannelError> {
        let available = self.tokens.allowance(token, from, vault)?;
        if available < amount {
            return Err(ChannelError::InsufficientAllowance {
                token: *token,
                required: amount,
                available,
            });
        }
        let before = self.tokens.balance_of(token, vault)?;
        self.tokens.transfer_from(token, vault, from, vault, amount)?;
        let after = self.tokens.balance_of(token, vault)?;
        let received = after.saturating_sub(before);
        if received == 0 {
            return Err(ChannelError::NoTokensTransferred);
        }
        Ok(received)
    }
}

impl<G, T> ChannelBridgeApi for ChannelBridgeService<G, T>
where
    G: TokenGateway,
    T: TimeSource,
{
    fn open_channel(&self, caller: Address, request: OpenChannelRequest) -> Result<ChannelId, ChannelError> {
        ChannelBridgeService::open_channel(self, caller, request)
    }

    fn deposit(
        &self,
        caller: Address,
        channel: ChannelId,
        token: TokenId,
        amount: Amount,
        key: Option<U256>,
    ) -> Result<Amount, ChannelError> {
        ChannelBridgeService::deposit(self, caller, channel, token, amount, key)
    }

    fn record_key(&self, caller: Address, channel: ChannelId, token: TokenId, key: U256) -> Result<(), ChannelError> {
        ChannelBridgeService::record_key(self, caller, channel, token, key)
    }

    fn initialize_state(
        &self,
        caller: Address,
        channel: ChannelId,
        proof: InitializationProof,
    ) -> Result<Hash, ChannelError> {
        ChannelBridgeService::initialize_state(self, caller, channel, proof)
    }

    fn activate(&self, caller: Address, channel: ChannelId) -> Result<(), ChannelError> {
        ChannelBridgeService::activate(self, caller, channel)
    }

    fn advance_to_closing(
        &self,
        caller: Address,
        channel: ChannelId,
        proofs: Vec<TransitionProof>,
        final_root: Hash,
        signature: ThresholdSignature,
    ) -> Result<(), ChannelError> {
        ChannelBridgeService::advance_to_closing(self, caller, channel, proofs, final_root, signature)
    }

    fn finalize_close(&self, caller: Address, channel: ChannelId, proof: ConservationProof) -> Result<(), ChannelError> {
        ChannelBridgeService::finalize_close(self, caller, channel, proof)
    }

    fn withdraw(&self, caller: Address, channel: ChannelId, token: TokenId) -> Result<Amount, ChannelError> {
        ChannelBridgeService::withdraw(self, caller, channel, token)
    }

    fn handle_proof_timeout(&self, caller: Address, channel: ChannelId) -> Result<(), ChannelError> {
        ChannelBridgeService::handle_proof_timeout(self, caller, channel)
    }

    fn reclaim_leader_bond(&self, caller: Address, channel: ChannelId) -> Result<Amount, ChannelError> {
        ChannelBridgeService::reclaim_leader_bond(self, caller, channel)
    }

    fn withdraw_treasury(&self, caller: Address) -> Result<Amount, ChannelError> {
        ChannelBridgeService::withdraw_treasury(self, caller)
    }

    fn set_treasury(&self, caller: Address, treasury: Address) -> Result<(), ChannelError> {
        ChannelBridgeService::set_treasury(self, caller, treasury)
    }

    fn raise_dispute(&self, caller: Address, channel: ChannelId, evidence: Vec<u8>) -> Result<DisputeId, ChannelError> {
        ChannelBridgeService::raise_dispute(self, caller, channel, evidence)
    }

    fn resolve_dispute(&self, caller: Address, dispute: DisputeId) -> Result<(), ChannelError> {
        ChannelBridgeService::resolve_dispute(self, caller, dispute)
    }

    fn reject_dispute(&self, caller: Address, dispute: DisputeId) -> Result<(), ChannelError> {
        ChannelBridgeService::reject_dispute(self, caller, dispute)
    }

    fn emergency_withdraw(&self, caller: Address, channel: ChannelId) -> Result<Vec<(TokenId, Amount)>, ChannelError> {
        ChannelBridgeService::emergency_withdraw(self, caller, channel)
    }

    fn register_function(&self, caller: Address, entry: FunctionEntry) -> Result<(), ChannelError> {
        ChannelBridgeService::register_function(self, caller, entry)
    }

    fn unregister_function(&self, caller: Address, selector: FunctionSelector) -> Result<(), ChannelError> {
        ChannelBridgeService::unregister_function(self, caller, selector)
    }

    fn purge_channel(&self, caller: Address, channel: ChannelId) -> Result<(), ChannelError> {
        ChannelBridgeService::purge_channel(self, caller, channel)
    }

    fn channel(&self, channel: ChannelId) -> Result<Channel, ChannelError> {
        ChannelBridgeService::channel(self, channel)
    }

    fn withdrawable_amount(&self, channel: ChannelId, participant: &Address, token: &TokenId) -> Amount {
        ChannelBridgeService::withdrawable_amount(self, channel, participant, token)
    }
}
