//! # Deposit Ledger
//!
//! Per-channel, per-token, per-participant bookkeeping. All maps are keyed by
//! the composite `(ChannelId, TokenId, Address)` so channels never share state.
//!
//! The ledger never moves tokens. Callers zero a cell first, attempt the
//! transfer, and put the cell back with the matching `restore_*` call if the
//! transfer fails.

use crate::domain::{ChannelError, ChannelId};
use primitive_types::U256;
use shared_types::{Address, Amount, TokenId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Composite key of one ledger cell.
pub type CellKey = (ChannelId, TokenId, Address);

/// Channel balance bookkeeping.
#[derive(Debug, Default)]
pub struct DepositLedger {
    deposits: BTreeMap<CellKey, Amount>,
    totals: BTreeMap<(ChannelId, TokenId), Amount>,
    keys: BTreeMap<CellKey, U256>,
    withdrawable: BTreeMap<CellKey, Amount>,
    withdrawn: BTreeSet<CellKey>,
    emergency: BTreeMap<CellKey, Amount>,
    emergency_claimed: BTreeSet<(ChannelId, Address)>,
    paid_out: BTreeMap<(ChannelId, TokenId), Amount>,
}

impl DepositLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // DEPOSITS
    // =========================================================================

    /// Add `amount` to a participant's deposit and the token total.
    pub fn credit(
        &mut self,
        channel: ChannelId,
        token: TokenId,
        participant: Address,
        amount: Amount,
    ) -> Result<(), ChannelError> {
        let cell = self.deposits.get(&(channel, token, participant)).copied().unwrap_or(0);
        let total = self.totals.get(&(channel, token)).copied().unwrap_or(0);
        let new_cell = cell.checked_add(amount).ok_or(ChannelError::AmountOverflow)?;
        let new_total = total.checked_add(amount).ok_or(ChannelError::AmountOverflow)?;

        self.deposits.insert((channel, token, participant), new_cell);
        self.totals.insert((channel, token), new_total);
        debug!(
            "[bridge] Credited {} to channel {} (cell {}, total {})",
            amount, channel, new_cell, new_total
        );
        Ok(())
    }

    /// Recorded deposit of a participant.
    pub fn deposit_of(&self, channel: ChannelId, token: TokenId, participant: Address) -> Amount {
        self.deposits
            .get(&(channel, token, participant))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of all deposits of a token.
    pub fn total_of(&self, channel: ChannelId, token: TokenId) -> Amount {
        self.totals.get(&(channel, token)).copied().unwrap_or(0)
    }

    // =========================================================================
    // OFF-LEDGER KEYS
    // =========================================================================

    /// Off-ledger key of a participant for a token.
    pub fn key_of(&self, channel: ChannelId, token: TokenId, participant: Address) -> Option<U256> {
        self.keys.get(&(channel, token, participant)).copied()
    }

    /// Check a key before recording it: nonzero, unused by other participants.
    pub fn check_key(
        &self,
        channel: ChannelId,
        token: TokenId,
        participant: Address,
        key: U256,
    ) -> Result<(), ChannelError> {
        if key.is_zero() {
            return Err(ChannelError::ZeroKey);
        }
        let taken = self
            .keys
            .range((channel, token, [0x00; 20])..=(channel, token, [0xFF; 20]))
            .any(|(&(_, _, p), k)| p != participant && *k == key);
        if taken {
            return Err(ChannelError::DuplicateKey { token });
        }
        Ok(())
    }

    /// Record or replace a key (validated).
    pub fn set_key(
        &mut self,
        channel: ChannelId,
        token: TokenId,
        participant: Address,
        key: U256,
    ) -> Result<(), ChannelError> {
        self.check_key(channel, token, participant, key)?;
        self.keys.insert((channel, token, participant), key);
        Ok(())
    }

    // =========================================================================
    // NORMAL WITHDRAWALS
    // =========================================================================

    /// Write a proven final balance.
    pub fn set_withdrawable(
        &mut self,
        channel: ChannelId,
        token: TokenId,
        participant: Address,
        amount: Amount,
    ) {
        self.withdrawable.insert((channel, token, participant), amount);
    }

    /// Amount a participant may withdraw.
    pub fn withdrawable_amount(
        &self,
        channel: ChannelId,
        participant: Address,
        token: TokenId,
    ) -> Amount {
        self.withdrawable
            .get(&(channel, token, participant))
            .copied()
            .unwrap_or(0)
    }

    /// Whether a cell was already withdrawn.
    pub fn is_withdrawn(&self, channel: ChannelId, participant: Address, token: TokenId) -> bool {
        self.withdrawn.contains(&(channel, token, participant))
    }

    /// Zero a cell and set its withdrawn flag. Returns the previous amount.
    pub fn clear_withdrawable(
        &mut self,
        channel: ChannelId,
        participant: Address,
        token: TokenId,
    ) -> Result<Amount, ChannelError> {
        let key = (channel, token, participant);
        if self.withdrawn.contains(&key) {
            return Err(ChannelError::AlreadyWithdrawn);
        }
        let amount = self.withdrawable.insert(key, 0).unwrap_or(0);
        self.withdrawn.insert(key);
        let paid = self.paid_out.entry((channel, token)).or_insert(0);
        *paid = paid.saturating_add(amount);
        Ok(amount)
    }

    /// Undo `clear_withdrawable` after a failed transfer.
    pub fn restore_withdrawable(
        &mut self,
        channel: ChannelId,
        participant: Address,
        token: TokenId,
        amount: Amount,
    ) {
        let key = (channel, token, participant);
        self.withdrawable.insert(key, amount);
        self.withdrawn.remove(&key);
        if let Some(paid) = self.paid_out.get_mut(&(channel, token)) {
            *paid = paid.saturating_sub(amount);
        }
    }

    // =========================================================================
    // EMERGENCY EXIT
    // =========================================================================

    /// Snapshot deposits as emergency amounts.
    ///
    /// Cells already withdrawn through the normal path are skipped; remaining
    /// normal withdrawable amounts are cleared so each cell pays exactly once.
    /// If normal payouts left less than the remaining deposits in the vault,
    /// the snapshot is scaled down pro rata.
    pub fn snapshot_emergency(
        &mut self,
        channel: ChannelId,
        tokens: &[TokenId],
        participants: &[Address],
    ) {
        let mut skipped = 0usize;
        for &token in tokens {
            let mut eligible = Vec::with_capacity(participants.len());
            for &participant in participants {
                let key = (channel, token, participant);
                if self.withdrawn.contains(&key) {
                    skipped += 1;
                    continue;
                }
                self.withdrawable.remove(&key);
                let deposit = self.deposits.get(&key).copied().unwrap_or(0);
                if deposit > 0 {
                    eligible.push((key, deposit));
                }
            }

            let owed: Amount = eligible.iter().fold(0u128, |acc, (_, d)| acc.saturating_add(*d));
            let paid = self.paid_out.get(&(channel, token)).copied().unwrap_or(0);
            let available = self.total_of(channel, token).saturating_sub(paid);
            for (key, deposit) in eligible {
                let amount = if owed <= available {
                    deposit
                } else {
                    pro_rata(deposit, available, owed)
                };
                if amount > 0 {
                    self.emergency.insert(key, amount);
                }
            }
        }
        debug!(
            "[bridge] Emergency snapshot for channel {} ({} cells already withdrawn)",
            channel, skipped
        );
    }

    /// Emergency amount of a cell.
    pub fn emergency_amount(&self, channel: ChannelId, participant: Address, token: TokenId) -> Amount {
        self.emergency
            .get(&(channel, token, participant))
            .copied()
            .unwrap_or(0)
    }

    /// Whether a participant used the emergency exit.
    pub fn is_emergency_claimed(&self, channel: ChannelId, participant: Address) -> bool {
        self.emergency_claimed.contains(&(channel, participant))
    }

    /// Zero every emergency cell of a participant and mark them claimed.
    ///
    /// Returns the nonzero `(token, amount)` pairs in token order.
    pub fn take_emergency(
        &mut self,
        channel: ChannelId,
        participant: Address,
        tokens: &[TokenId],
    ) -> Result<Vec<(TokenId, Amount)>, ChannelError> {
        if self.emergency_claimed.contains(&(channel, participant)) {
            return Err(ChannelError::AlreadyEmergencyWithdrawn);
        }
        let payouts: Vec<(TokenId, Amount)> = tokens
            .iter()
            .filter_map(|&token| {
                self.emergency
                    .remove(&(channel, token, participant))
                    .filter(|amount| *amount > 0)
                    .map(|amount| (token, amount))
            })
            .collect();
        if payouts.is_empty() {
            return Err(ChannelError::NothingToWithdraw);
        }
        self.emergency_claimed.insert((channel, participant));
        Ok(payouts)
    }

    /// Put unpaid emergency cells back and clear the claimed flag.
    pub fn restore_emergency(
        &mut self,
        channel: ChannelId,
        participant: Address,
        unpaid: &[(TokenId, Amount)],
    ) {
        for &(token, amount) in unpaid {
            self.emergency.insert((channel, token, participant), amount);
        }
        self.emergency_claimed.remove(&(channel, participant));
    }

    // =========================================================================
    // CLEANUP
    // =========================================================================

    /// Any withdrawable or emergency amount still owed on the channel.
    pub fn has_unclaimed(&self, channel: ChannelId) -> bool {
        let owed = |map: &BTreeMap<CellKey, Amount>| {
            map.iter().any(|(&(c, _, _), amount)| c == channel && *amount > 0)
        };
        owed(&self.withdrawable) || owed(&self.emergency)
    }

    /// Drop every row of a channel.
    pub fn purge(&mut self, channel: ChannelId) {
        self.deposits.retain(|k, _| k.0 != channel);
        self.totals.retain(|k, _| k.0 != channel);
        self.keys.retain(|k, _| k.0 != channel);
        self.withdrawable.retain(|k, _| k.0 != channel);
        self.withdrawn.retain(|k| k.0 != channel);
        self.emergency.retain(|k, _| k.0 != channel);
        self.emergency_claimed.retain(|k| k.0 != channel);
        self.paid_out.retain(|k, _| k.0 != channel);
    }
}

/// `amount × available / owed`, floored.
fn pro_rata(amount: Amount, available: Amount, owed: Amount) -> Amount {
    if owed == 0 {
        return 0;
    }
    let scaled = U256::from(amount) * U256::from(available) / U256::from(owed);
    scaled.low_u128()
}
