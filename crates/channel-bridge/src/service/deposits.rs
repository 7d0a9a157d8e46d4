//! Deposits, off-ledger keys and settled withdrawals.

use super::{ensure_participant, ensure_state, tracked, ChannelBridgeService};
use crate::domain::{ChannelError, ChannelId, ChannelState, WithdrawalPath};
use crate::events::ChannelEvent;
use crate::metrics::{record_deposit, record_withdrawal};
use crate::ports::{TimeSource, TokenGateway};
use primitive_types::U256;
use shared_types::{short_hex, Address, Amount, TokenId};
use tracing::{info, warn};

impl<G, T> ChannelBridgeService<G, T>
where
    G: TokenGateway,
    T: TimeSource,
{
    /// Lock `amount` of `token` into an `Initialized` channel.
    ///
    /// The caller must hold an off-ledger key for the token, either recorded
    /// earlier or supplied here. The credited amount is what reached the
    /// vault, so fee-on-transfer tokens credit less than `amount`.
    pub fn deposit(
        &self,
        caller: Address,
        channel: ChannelId,
        token: TokenId,
        amount: Amount,
        key: Option<U256>,
    ) -> Result<Amount, ChannelError> {
        tracked("deposit", self.try_deposit(caller, channel, token, amount, key))
    }

    fn try_deposit(
        &self,
        caller: Address,
        id: ChannelId,
        token: TokenId,
        amount: Amount,
        key: Option<U256>,
    ) -> Result<Amount, ChannelError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let channel = state.channel(id)?;
        ensure_state(channel, &[ChannelState::Initialized], "Initialized")?;
        ensure_participant(channel, &caller)?;
        if !channel.allows_token(&token) {
            return Err(ChannelError::TokenNotAllowed { channel: id, token });
        }
        if amount == 0 {
            return Err(ChannelError::ZeroAmount);
        }
        match key {
            Some(key) => state.ledger.check_key(id, token, caller, key)?,
            None if state.ledger.key_of(id, token, caller).is_none() => {
                return Err(ChannelError::MissingKey {
                    token,
                    participant: caller,
                })
            }
            None => {}
        }
        // Credit can only be smaller than `amount`; reject overflow before pulling.
        state
            .ledger
            .total_of(id, token)
            .checked_add(amount)
            .ok_or(ChannelError::AmountOverflow)?;

        let credited = self.pull_into_vault(&state.config.vault, &token, &caller, amount)?;

        if let Some(key) = key {
            state.ledger.set_key(id, token, caller, key)?;
            self.publish(ChannelEvent::KeyRecorded {
                channel: id,
                token,
                participant: caller,
            });
        }
        state.ledger.credit(id, token, caller, credited)?;

        info!(
            "[bridge] Deposit of {} {} by {} into channel {} (requested {})",
            credited,
            short_hex(&token),
            short_hex(&caller),
            id,
            amount
        );
        record_deposit();
        self.publish(ChannelEvent::Deposited {
            channel: id,
            token,
            participant: caller,
            amount: credited,
        });
        Ok(credited)
    }

    /// Set or replace the caller's off-ledger key while deposits are open.
    pub fn record_key(
        &self,
        caller: Address,
        channel: ChannelId,
        token: TokenId,
        key: U256,
    ) -> Result<(), ChannelError> {
        tracked("record_key", self.try_record_key(caller, channel, token, key))
    }

    fn try_record_key(
        &self,
        caller: Address,
        id: ChannelId,
        token: TokenId,
        key: U256,
    ) -> Result<(), ChannelError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let channel = state.channel(id)?;
        ensure_state(channel, &[ChannelState::Initialized], "Initialized")?;
        ensure_participant(channel, &caller)?;
        if !channel.allows_token(&token) {
            return Err(ChannelError::TokenNotAllowed { channel: id, token });
        }
        state.ledger.set_key(id, token, caller, key)?;

        self.publish(ChannelEvent::KeyRecorded {
            channel: id,
            token,
            participant: caller,
        });
        Ok(())
    }

    /// Withdraw the caller's settled balance of `token`.
    ///
    /// The cell is zeroed and flagged before the transfer; a failed transfer
    /// restores it.
    pub fn withdraw(
        &self,
        caller: Address,
        channel: ChannelId,
        token: TokenId,
    ) -> Result<Amount, ChannelError> {
        tracked("withdraw", self.try_withdraw(caller, channel, token))
    }

    fn try_withdraw(&self, caller: Address, id: ChannelId, token: TokenId) -> Result<Amount, ChannelError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let now = self.now();
        let channel = state.channel(id)?;
        ensure_state(channel, &[ChannelState::Closed], "Closed")?;
        if channel.emergency {
            return Err(ChannelError::EmergencyActive(id));
        }
        ensure_participant(channel, &caller)?;
        if !channel.allows_token(&token) {
            return Err(ChannelError::TokenNotAllowed { channel: id, token });
        }
        if state.has_pending_dispute(id, now) {
            return Err(ChannelError::PendingDispute(id));
        }
        if state.ledger.is_withdrawn(id, caller, token) {
            return Err(ChannelError::AlreadyWithdrawn);
        }
        if state.ledger.withdrawable_amount(id, caller, token) == 0 {
            return Err(ChannelError::NothingToWithdraw);
        }

        let amount = state.ledger.clear_withdrawable(id, caller, token)?;
        if let Err(e) = self.tokens.transfer(&token, &state.config.vault, &caller, amount) {
            state.ledger.restore_withdrawable(id, caller, token, amount);
            warn!("[bridge] Withdrawal from channel {} reverted: {}", id, e);
            return Err(e);
        }

        info!(
            "[bridge] {} withdrew {} {} from channel {}",
            short_hex(&caller),
            amount,
            short_hex(&token),
            id
        );
        record_withdrawal(WithdrawalPath::Normal);
        self.publish(ChannelEvent::Withdrawn {
            channel: id,
            token,
            participant: caller,
            amount,
            path: WithdrawalPath::Normal,
        });
        Ok(amount)
    }
}
