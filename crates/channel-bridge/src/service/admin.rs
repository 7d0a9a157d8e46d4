//! Owner operations: function registry and channel cleanup.

use super::{ensure_state, tracked, ChannelBridgeService};
use crate::domain::{ChannelError, ChannelId, ChannelState, FunctionEntry, FunctionSelector};
use crate::events::ChannelEvent;
use crate::ports::{TimeSource, TokenGateway};
use shared_types::Address;
use tracing::info;

impl<G, T> ChannelBridgeService<G, T>
where
    G: TokenGateway,
    T: TimeSource,
{
    /// Register a transition circuit.
    pub fn register_function(&self, caller: Address, entry: FunctionEntry) -> Result<(), ChannelError> {
        tracked("register_function", self.try_register_function(caller, entry))
    }

    fn try_register_function(&self, caller: Address, entry: FunctionEntry) -> Result<(), ChannelError> {
        let mut state = self.state.write();
        state.ensure_owner(&caller)?;
        let selector = entry.selector;
        state.registry.register(entry)?;

        info!("[bridge] Registered transition function 0x{}", hex::encode(selector));
        self.publish(ChannelEvent::FunctionRegistered { selector });
        Ok(())
    }

    /// Remove a transition circuit. Channels already `Closing` are unaffected.
    pub fn unregister_function(&self, caller: Address, selector: FunctionSelector) -> Result<(), ChannelError> {
        tracked("unregister_function", self.try_unregister_function(caller, selector))
    }

    fn try_unregister_function(&self, caller: Address, selector: FunctionSelector) -> Result<(), ChannelError> {
        let mut state = self.state.write();
        state.ensure_owner(&caller)?;
        state.registry.unregister(&selector)?;

        info!("[bridge] Unregistered transition function 0x{}", hex::encode(selector));
        self.publish(ChannelEvent::FunctionUnregistered { selector });
        Ok(())
    }

    /// Remove a fully settled channel with its ledger rows and disputes.
    pub fn purge_channel(&self, caller: Address, channel: ChannelId) -> Result<(), ChannelError> {
        tracked("purge_channel", self.try_purge_channel(caller, channel))
    }

    fn try_purge_channel(&self, caller: Address, id: ChannelId) -> Result<(), ChannelError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let now = self.now();
        state.ensure_owner(&caller)?;
        let channel = state.channel(id)?;
        ensure_state(channel, &[ChannelState::Closed], "Closed")?;

        let until = channel
            .close_timestamp
            .unwrap_or(now)
            .saturating_add(state.config.cleanup_cooldown);
        if now < until {
            return Err(ChannelError::CleanupCooldown { until });
        }
        if state.has_pending_dispute(id, now) {
            return Err(ChannelError::PendingDispute(id));
        }
        if state.ledger.has_unclaimed(id) {
            return Err(ChannelError::UnclaimedFunds(id));
        }
        if !channel.bond_settled() {
            return Err(ChannelError::BondUnsettled(id));
        }

        state.channels.remove(&id);
        state.ledger.purge(id);
        state.disputes.purge(id);

        info!("[bridge] Purged channel {}", id);
        self.publish(ChannelEvent::ChannelPurged { channel: id });
        Ok(())
    }
}
