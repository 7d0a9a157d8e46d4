//! Disputes and the emergency exit.

use super::{ensure_participant, ensure_state, tracked, BridgeState, ChannelBridgeService};
use crate::domain::{ChannelError, ChannelId, ChannelState, DisputeId, DisputeStatus, WithdrawalPath};
use crate::events::ChannelEvent;
use crate::metrics::{record_bond_slashed, record_dispute, record_withdrawal};
use crate::ports::{TimeSource, TokenGateway};
use shared_types::{short_hex, Address, Amount, TokenId};
use tracing::{info, warn};

impl<G, T> ChannelBridgeService<G, T>
where
    G: TokenGateway,
    T: TimeSource,
{
    /// Accuse the leader of a settled channel.
    ///
    /// Only non-leader participants, only within `close + dispute_window`.
    pub fn raise_dispute(
        &self,
        caller: Address,
        channel: ChannelId,
        evidence: Vec<u8>,
    ) -> Result<DisputeId, ChannelError> {
        tracked("raise_dispute", self.try_raise_dispute(caller, channel, evidence))
    }

    fn try_raise_dispute(
        &self,
        caller: Address,
        id: ChannelId,
        evidence: Vec<u8>,
    ) -> Result<DisputeId, ChannelError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let now = self.now();
        let config = &state.config;
        let channel = state.channel(id)?;
        if channel.leader == caller {
            return Err(ChannelError::LeaderCannotDispute);
        }
        ensure_participant(channel, &caller)?;
        ensure_state(channel, &[ChannelState::Closed], "Closed")?;
        if channel.emergency {
            return Err(ChannelError::EmergencyActive(id));
        }
        let closed_at = channel
            .dispute_window_end(config.dispute_window)
            .unwrap_or(0);
        if now > closed_at {
            return Err(ChannelError::DisputeWindowClosed { closed_at });
        }
        if evidence.is_empty() || evidence.len() > config.max_evidence_bytes {
            return Err(ChannelError::InvalidEvidence {
                len: evidence.len(),
                max: config.max_evidence_bytes,
            });
        }

        let accused = channel.leader;
        let timeout = config.dispute_timeout;
        let dispute = state.disputes.raise(id, caller, accused, evidence, now, timeout)?;
        if let Some(channel) = state.channels.get_mut(&id) {
            channel.disputed = true;
        }

        warn!(
            "[bridge] Dispute {} raised on channel {} by {} against {}",
            dispute,
            id,
            short_hex(&caller),
            short_hex(&accused)
        );
        record_dispute(DisputeStatus::Raised);
        self.publish(ChannelEvent::DisputeRaised {
            dispute,
            channel: id,
            accuser: caller,
        });
        Ok(dispute)
    }

    /// Uphold a dispute: slash the leader and open the emergency exit.
    pub fn resolve_dispute(&self, caller: Address, dispute: DisputeId) -> Result<(), ChannelError> {
        tracked("resolve_dispute", self.try_decide(caller, dispute, DisputeStatus::Resolved))
    }

    /// Dismiss a dispute.
    pub fn reject_dispute(&self, caller: Address, dispute: DisputeId) -> Result<(), ChannelError> {
        tracked("reject_dispute", self.try_decide(caller, dispute, DisputeStatus::Rejected))
    }

    fn try_decide(&self, caller: Address, dispute: DisputeId, verdict: DisputeStatus) -> Result<(), ChannelError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let now = self.now();
        state.ensure_owner(&caller)?;
        let id = state
            .disputes
            .pending(dispute, now, state.config.dispute_timeout)?
            .channel_id;

        if verdict == DisputeStatus::Resolved {
            self.enter_emergency(state, id)?;
        }
        state.disputes.set_status(dispute, verdict);

        record_dispute(verdict);
        if verdict == DisputeStatus::Resolved {
            info!("[bridge] Dispute {} on channel {} upheld", dispute, id);
            self.publish(ChannelEvent::DisputeResolved { dispute, channel: id });
        } else {
            info!("[bridge] Dispute {} on channel {} rejected", dispute, id);
            self.publish(ChannelEvent::DisputeRejected { dispute, channel: id });
        }
        Ok(())
    }

    /// Slash (once) and switch a settled channel to the emergency exit.
    ///
    /// A second upheld dispute on the same channel finds both already done.
    fn enter_emergency(&self, state: &mut BridgeState, id: ChannelId) -> Result<(), ChannelError> {
        let channel = state
            .channels
            .get_mut(&id)
            .ok_or(ChannelError::ChannelNotFound(id))?;
        if !channel.bond_slashed {
            let amount = state.security.slash(channel)?;
            record_bond_slashed();
            self.publish(ChannelEvent::BondSlashed {
                channel: id,
                leader: channel.leader,
                amount,
            });
        }
        if !channel.emergency {
            channel.emergency = true;
            state
                .ledger
                .snapshot_emergency(id, &channel.allowed_tokens, &channel.participants);
            warn!("[bridge] Channel {} switched to emergency exit", id);
        }
        Ok(())
    }

    /// Pay the caller every emergency amount owed, one call per participant.
    ///
    /// If a transfer fails, the cells not yet paid are restored and the
    /// caller may try again; cells already paid stay paid.
    pub fn emergency_withdraw(
        &self,
        caller: Address,
        channel: ChannelId,
    ) -> Result<Vec<(TokenId, Amount)>, ChannelError> {
        tracked("emergency_withdraw", self.try_emergency_withdraw(caller, channel))
    }

    fn try_emergency_withdraw(
        &self,
        caller: Address,
        id: ChannelId,
    ) -> Result<Vec<(TokenId, Amount)>, ChannelError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let channel = state.channel(id)?;
        ensure_state(channel, &[ChannelState::Closed], "Closed")?;
        if !channel.emergency {
            return Err(ChannelError::NotInEmergency(id));
        }
        ensure_participant(channel, &caller)?;

        let tokens = channel.allowed_tokens.clone();
        let payouts = state.ledger.take_emergency(id, caller, &tokens)?;
        let vault = state.config.vault;

        for (paid, &(token, amount)) in payouts.iter().enumerate() {
            if let Err(e) = self.tokens.transfer(&token, &vault, &caller, amount) {
                state.ledger.restore_emergency(id, caller, &payouts[paid..]);
                warn!(
                    "[bridge] Emergency withdrawal of {} from channel {} stopped after {} of {} tokens: {}",
                    short_hex(&caller),
                    id,
                    paid,
                    payouts.len(),
                    e
                );
                return Err(e);
            }
            record_withdrawal(WithdrawalPath::Emergency);
            self.publish(ChannelEvent::Withdrawn {
                channel: id,
                token,
                participant: caller,
                amount,
                path: WithdrawalPath::Emergency,
            });
        }

        info!(
            "[bridge] {} emergency-withdrew {} tokens from channel {}",
            short_hex(&caller),
            payouts.len(),
            id
        );
        Ok(payouts)
    }
}
