//! Timeout slashing, bond reclaim and treasury operations.

use super::{ensure_leader, ensure_participant, tracked, ChannelBridgeService};
use crate::domain::{ChannelError, ChannelId, ChannelState, ClosePath};
use crate::events::ChannelEvent;
use crate::metrics::{record_bond_slashed, record_channel_closed, record_treasury_sweep};
use crate::ports::{TimeSource, TokenGateway};
use shared_types::{short_hex, Address, Amount, ZERO_ADDRESS};
use tracing::{info, warn};

impl<G, T> ChannelBridgeService<G, T>
where
    G: TokenGateway,
    T: TimeSource,
{
    /// Slash a leader that missed the settlement deadline.
    ///
    /// Any participant may call once `now > open + timeout + grace`. The bond
    /// moves to the treasury pool, the channel closes in emergency mode and
    /// deposits become claimable through the emergency exit.
    pub fn handle_proof_timeout(&self, caller: Address, channel: ChannelId) -> Result<(), ChannelError> {
        tracked("handle_proof_timeout", self.try_handle_proof_timeout(caller, channel))
    }

    fn try_handle_proof_timeout(&self, caller: Address, id: ChannelId) -> Result<(), ChannelError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let now = self.now();
        let channel = state.channel(id)?;
        ensure_participant(channel, &caller)?;
        if channel.bond_slashed {
            return Err(ChannelError::BondAlreadySlashed);
        }
        if !channel.state.can_force_close() {
            return Err(ChannelError::InvalidState {
                channel: id,
                expected: "not Closed",
                actual: channel.state,
            });
        }
        let deadline = channel.settlement_deadline(state.config.proof_submission_deadline);
        if now <= deadline {
            return Err(ChannelError::DeadlineNotReached { now, deadline });
        }

        let channel = state
            .channels
            .get_mut(&id)
            .ok_or(ChannelError::ChannelNotFound(id))?;
        let slashed = state.security.slash(channel)?;
        channel.emergency = true;
        channel.state = ChannelState::Closed;
        channel.close_timestamp = Some(now);
        let leader = channel.leader;
        state
            .ledger
            .snapshot_emergency(id, &channel.allowed_tokens, &channel.participants);
        state.security.release_leadership(&leader, id);

        warn!(
            "[bridge] Channel {} timed out at {} (deadline {}), leader {} slashed",
            id,
            now,
            deadline,
            short_hex(&leader)
        );
        record_bond_slashed();
        record_channel_closed(ClosePath::Timeout);
        self.publish(ChannelEvent::BondSlashed {
            channel: id,
            leader,
            amount: slashed,
        });
        self.publish(ChannelEvent::ChannelClosed {
            channel: id,
            path: ClosePath::Timeout,
        });
        Ok(())
    }

    /// Return the bond to the leader of a channel that settled honestly.
    pub fn reclaim_leader_bond(&self, caller: Address, channel: ChannelId) -> Result<Amount, ChannelError> {
        tracked("reclaim_leader_bond", self.try_reclaim_leader_bond(caller, channel))
    }

    fn try_reclaim_leader_bond(&self, caller: Address, id: ChannelId) -> Result<Amount, ChannelError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let now = self.now();
        let channel = state.channel(id)?;
        ensure_leader(channel, &caller)?;
        if channel.bond_slashed {
            return Err(ChannelError::BondAlreadySlashed);
        }
        if channel.bond_reclaimed {
            return Err(ChannelError::BondAlreadyReclaimed);
        }
        if channel.state != ChannelState::Closed {
            return Err(ChannelError::InvalidState {
                channel: id,
                expected: "Closed",
                actual: channel.state,
            });
        }
        if channel.emergency {
            return Err(ChannelError::EmergencyActive(id));
        }
        let until = channel
            .dispute_window_end(state.config.dispute_window)
            .unwrap_or(u64::MAX);
        if now <= until {
            return Err(ChannelError::DisputeWindowOpen { until });
        }
        if state.has_pending_dispute(id, now) {
            return Err(ChannelError::PendingDispute(id));
        }

        let vault = state.config.vault;
        let bond_token = state.config.bond_token;
        let channel = state
            .channels
            .get_mut(&id)
            .ok_or(ChannelError::ChannelNotFound(id))?;
        let amount = channel.leader_bond;
        channel.bond_reclaimed = true;
        if let Err(e) = self.tokens.transfer(&bond_token, &vault, &caller, amount) {
            channel.bond_reclaimed = false;
            warn!("[bridge] Bond reclaim on channel {} reverted: {}", id, e);
            return Err(e);
        }

        info!("[bridge] Leader {} reclaimed bond {} from channel {}", short_hex(&caller), amount, id);
        self.publish(ChannelEvent::BondReclaimed {
            channel: id,
            leader: caller,
            amount,
        });
        Ok(amount)
    }

    /// Sweep slashed bonds to the treasury.
    pub fn withdraw_treasury(&self, caller: Address) -> Result<Amount, ChannelError> {
        tracked("withdraw_treasury", self.try_withdraw_treasury(caller))
    }

    fn try_withdraw_treasury(&self, caller: Address) -> Result<Amount, ChannelError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.ensure_owner(&caller)?;

        let treasury = state.security.treasury();
        let amount = state.security.take_pool()?;
        if let Err(e) = self
            .tokens
            .transfer(&state.config.bond_token, &state.config.vault, &treasury, amount)
        {
            state.security.restore_pool(amount);
            warn!("[bridge] Treasury sweep reverted: {}", e);
            return Err(e);
        }

        info!("[bridge] Swept {} to treasury {}", amount, short_hex(&treasury));
        record_treasury_sweep();
        self.publish(ChannelEvent::TreasuryWithdrawn { treasury, amount });
        Ok(amount)
    }

    /// Change where slashed bonds are swept to.
    pub fn set_treasury(&self, caller: Address, treasury: Address) -> Result<(), ChannelError> {
        tracked("set_treasury", self.try_set_treasury(caller, treasury))
    }

    fn try_set_treasury(&self, caller: Address, treasury: Address) -> Result<(), ChannelError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.ensure_owner(&caller)?;
        if treasury == ZERO_ADDRESS {
            return Err(ChannelError::ZeroAddress("treasury"));
        }
        state.security.set_treasury(treasury);
        state.config.treasury = treasury;

        info!("[bridge] Treasury set to {}", short_hex(&treasury));
        self.publish(ChannelEvent::TreasuryChanged { treasury });
        Ok(())
    }
}
