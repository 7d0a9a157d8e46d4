//! Channel lifecycle: open, initialize, activate, close.

use super::{ensure_leader, ensure_state, tracked, ChannelBridgeService};
use crate::domain::{
    determine_tree_size, find_duplicate, invariant_conservation, Channel, ChannelError, ChannelId,
    ChannelState, ClosePath, ConservationProof, InitializationProof, OpenChannelRequest,
};
use crate::events::ChannelEvent;
use crate::metrics::{record_channel_closed, record_channel_opened};
use crate::ports::{TimeSource, TokenGateway};
use crate::proof_gate::ChainClaim;
use bridge_zkp::TransitionProof;
use shared_crypto::ThresholdSignature;
use shared_types::{short_hex, Address, Hash, ZERO_ADDRESS};
use tracing::{info, warn};

impl<G, T> ChannelBridgeService<G, T>
where
    G: TokenGateway,
    T: TimeSource,
{
    /// Open a channel led by `caller`.
    ///
    /// The leader bond is pulled from `caller` before the channel exists; a
    /// failed bond transfer leaves no trace.
    pub fn open_channel(
        &self,
        caller: Address,
        request: OpenChannelRequest,
    ) -> Result<ChannelId, ChannelError> {
        tracked("open_channel", self.try_open_channel(caller, request))
    }

    fn try_open_channel(
        &self,
        caller: Address,
        request: OpenChannelRequest,
    ) -> Result<ChannelId, ChannelError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let config = &state.config;

        state.security.ensure_free(&caller)?;

        let OpenChannelRequest {
            tokens,
            participants,
            timeout,
            group_key,
        } = request;

        if tokens.is_empty() || tokens.len() > config.max_tokens {
            return Err(ChannelError::InvalidTokenCount {
                count: tokens.len(),
                max: config.max_tokens,
            });
        }
        if let Some(token) = tokens.iter().find(|t| !config.supported_tokens.contains(*t)) {
            return Err(ChannelError::UnsupportedToken(*token));
        }
        if let Some(token) = find_duplicate(&tokens) {
            return Err(ChannelError::DuplicateToken(*token));
        }
        if participants.len() < config.min_participants || participants.len() > config.max_participants {
            return Err(ChannelError::InvalidParticipantCount {
                count: participants.len(),
                min: config.min_participants,
                max: config.max_participants,
            });
        }
        if participants.contains(&ZERO_ADDRESS) {
            return Err(ChannelError::ZeroAddress("participant"));
        }
        if let Some(participant) = find_duplicate(&participants) {
            return Err(ChannelError::DuplicateParticipant(*participant));
        }
        let tree_size = determine_tree_size(participants.len(), tokens.len())?;
        if timeout < config.min_timeout || timeout > config.max_timeout {
            return Err(ChannelError::InvalidTimeout {
                timeout,
                min: config.min_timeout,
                max: config.max_timeout,
            });
        }
        if !group_key.is_valid() {
            return Err(ChannelError::InvalidGroupKey);
        }

        let bond = self.pull_into_vault(&config.vault, &config.bond_token, &caller, config.leader_bond)?;
        if bond < config.leader_bond {
            self.tokens.transfer(&config.bond_token, &config.vault, &caller, bond)?;
            warn!(
                "[bridge] Bond from {} short: {} of {}",
                short_hex(&caller),
                bond,
                config.leader_bond
            );
            return Err(ChannelError::InsufficientBond {
                required: config.leader_bond,
                received: bond,
            });
        }

        let id = ChannelId(state.next_channel_id);
        state.next_channel_id += 1;
        state.security.claim_leadership(caller, id)?;

        let channel = Channel {
            id,
            leader: caller,
            allowed_tokens: tokens,
            participants,
            state: ChannelState::Initialized,
            emergency: false,
            disputed: false,
            open_timestamp: self.now(),
            timeout,
            close_timestamp: None,
            leader_bond: bond,
            bond_slashed: false,
            bond_reclaimed: false,
            initial_state_root: None,
            final_state_root: None,
            required_tree_size: tree_size,
            signer: group_key.address(),
            group_key,
            block_context_hash: None,
        };
        info!(
            "[bridge] Opened channel {} led by {} ({} participants x {} tokens, tree {})",
            id,
            short_hex(&caller),
            channel.participants.len(),
            channel.allowed_tokens.len(),
            tree_size
        );
        state.channels.insert(id, channel);

        record_channel_opened();
        self.publish(ChannelEvent::ChannelOpened {
            channel: id,
            leader: caller,
            tree_size,
            bond,
        });
        Ok(id)
    }

    /// Prove the deposit tree and freeze membership: `Initialized -> Open`.
    ///
    /// Returns the stored initial root.
    pub fn initialize_state(
        &self,
        caller: Address,
        channel: ChannelId,
        proof: InitializationProof,
    ) -> Result<Hash, ChannelError> {
        tracked("initialize_state", self.try_initialize_state(caller, channel, proof))
    }

    fn try_initialize_state(
        &self,
        caller: Address,
        id: ChannelId,
        proof: InitializationProof,
    ) -> Result<Hash, ChannelError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let channel = state.channel(id)?;
        ensure_state(channel, &[ChannelState::Initialized], "Initialized")?;
        ensure_leader(channel, &caller)?;

        let keys = state.cell_keys(channel);
        let balances = state.cell_deposits(channel);
        let root = self.gate.verify_initialization(
            channel.required_tree_size,
            proof.merkle_root,
            &proof.proof,
            &keys,
            &balances,
        )?;

        let context = self.context.current().commitment();
        let channel = state
            .channels
            .get_mut(&id)
            .ok_or(ChannelError::ChannelNotFound(id))?;
        channel.initial_state_root = Some(root);
        channel.block_context_hash = Some(context);
        channel.state = ChannelState::Open;

        info!("[bridge] Channel {} initialized, root {}", id, short_hex(&root));
        self.publish(ChannelEvent::StateInitialized { channel: id, root });
        Ok(root)
    }

    /// `Open -> Active`.
    pub fn activate(&self, caller: Address, channel: ChannelId) -> Result<(), ChannelError> {
        tracked("activate", self.try_activate(caller, channel))
    }

    fn try_activate(&self, caller: Address, id: ChannelId) -> Result<(), ChannelError> {
        let mut guard = self.state.write();
        let channel = guard
            .channels
            .get_mut(&id)
            .ok_or(ChannelError::ChannelNotFound(id))?;
        ensure_state(channel, &[ChannelState::Open], "Open")?;
        ensure_leader(channel, &caller)?;
        channel.state = ChannelState::Active;

        info!("[bridge] Channel {} active", id);
        self.publish(ChannelEvent::ChannelActivated { channel: id });
        Ok(())
    }

    /// Accept the transition chain and group signature: `Open/Active -> Closing`.
    ///
    /// Allowed from `open + timeout` up to and including the settlement
    /// deadline.
    pub fn advance_to_closing(
        &self,
        caller: Address,
        channel: ChannelId,
        proofs: Vec<TransitionProof>,
        final_root: Hash,
        signature: ThresholdSignature,
    ) -> Result<(), ChannelError> {
        tracked(
            "advance_to_closing",
            self.try_advance_to_closing(caller, channel, &proofs, final_root, &signature),
        )
    }

    fn try_advance_to_closing(
        &self,
        caller: Address,
        id: ChannelId,
        proofs: &[TransitionProof],
        final_root: Hash,
        signature: &ThresholdSignature,
    ) -> Result<(), ChannelError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let now = self.now();
        let channel = state.channel(id)?;
        ensure_state(channel, &[ChannelState::Open, ChannelState::Active], "Open or Active")?;
        ensure_leader(channel, &caller)?;

        let earliest = channel.timeout_at();
        if now < earliest {
            return Err(ChannelError::TimeoutNotReached { now, earliest });
        }
        let deadline = channel.settlement_deadline(state.config.proof_submission_deadline);
        if now > deadline {
            return Err(ChannelError::DeadlinePassed { now, deadline });
        }

        let initial_root = channel.initial_state_root.ok_or(ChannelError::InvalidState {
            channel: id,
            expected: "initialized root",
            actual: channel.state,
        })?;
        let context = if state.config.enforce_transition_context {
            channel.block_context_hash.as_ref()
        } else {
            None
        };
        self.gate.verify_transition_chain(
            ChainClaim {
                proofs,
                initial_root: &initial_root,
                final_root: &final_root,
                context,
            },
            &state.registry,
            state.config.max_chained_proofs,
        )?;
        self.gate
            .verify_signature(id, &final_root, &channel.group_key, signature, &channel.signer)?;

        let channel = state
            .channels
            .get_mut(&id)
            .ok_or(ChannelError::ChannelNotFound(id))?;
        channel.final_state_root = Some(final_root);
        channel.state = ChannelState::Closing;

        info!(
            "[bridge] Channel {} closing with root {} ({} proofs)",
            id,
            short_hex(&final_root),
            proofs.len()
        );
        self.publish(ChannelEvent::ClosingStarted {
            channel: id,
            final_root,
            proofs: proofs.len(),
        });
        Ok(())
    }

    /// Prove conservation of the final balances: `Closing -> Closed`.
    ///
    /// On success every cell's final balance becomes withdrawable and the
    /// leader may lead another channel. A rejected submission leaves the
    /// channel `Closing` for resubmission.
    pub fn finalize_close(
        &self,
        caller: Address,
        channel: ChannelId,
        proof: ConservationProof,
    ) -> Result<(), ChannelError> {
        tracked("finalize_close", self.try_finalize_close(caller, channel, &proof))
    }

    fn try_finalize_close(
        &self,
        caller: Address,
        id: ChannelId,
        proof: &ConservationProof,
    ) -> Result<(), ChannelError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let now = self.now();
        let channel = state.channel(id)?;
        ensure_state(channel, &[ChannelState::Closing], "Closing")?;
        ensure_leader(channel, &caller)?;

        let deadline = channel.settlement_deadline(state.config.proof_submission_deadline);
        if now > deadline {
            return Err(ChannelError::DeadlinePassed { now, deadline });
        }

        let totals: Vec<_> = channel
            .allowed_tokens
            .iter()
            .map(|token| state.ledger.total_of(id, *token))
            .collect();
        invariant_conservation(
            &channel.allowed_tokens,
            channel.participants.len(),
            &proof.final_balances,
            &totals,
        )?;

        let final_root = channel.final_state_root.ok_or(ChannelError::InvalidState {
            channel: id,
            expected: "final root",
            actual: channel.state,
        })?;
        let keys = state.cell_keys(channel);
        let flat: Vec<_> = proof.final_balances.iter().flatten().copied().collect();
        self.gate.verify_conservation(
            channel.required_tree_size,
            &final_root,
            &proof.proof,
            &keys,
            &flat,
        )?;

        let tokens = channel.allowed_tokens.clone();
        let participants = channel.participants.clone();
        let leader = channel.leader;
        for (token, row) in tokens.iter().zip(&proof.final_balances) {
            for (participant, amount) in participants.iter().zip(row) {
                state.ledger.set_withdrawable(id, *token, *participant, *amount);
            }
        }

        let channel = state
            .channels
            .get_mut(&id)
            .ok_or(ChannelError::ChannelNotFound(id))?;
        channel.state = ChannelState::Closed;
        channel.close_timestamp = Some(now);
        state.security.release_leadership(&leader, id);

        info!("[bridge] Channel {} closed with conserved balances", id);
        record_channel_closed(ClosePath::Settled);
        self.publish(ChannelEvent::ChannelClosed {
            channel: id,
            path: ClosePath::Settled,
        });
        Ok(())
    }
}
