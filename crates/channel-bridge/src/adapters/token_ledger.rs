//! In-memory token ledger.
//!
//! Implements `TokenGateway` over plain balance and allowance maps. Tokens
//! may charge a fee on pulls (burned) and transfers may be forced to fail,
//! which is how fee-aware crediting and rollback paths are exercised.

use crate::domain::ChannelError;
use crate::ports::TokenGateway;
use parking_lot::RwLock;
use shared_types::{short_hex, Address, Amount, TokenId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

const BPS_DENOMINATOR: u128 = 10_000;

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<(TokenId, Address), Amount>,
    allowances: HashMap<(TokenId, Address, Address), Amount>,
    fee_bps: HashMap<TokenId, u16>,
    failing: HashSet<TokenId>,
}

impl LedgerState {
    fn balance(&self, token: &TokenId, owner: &Address) -> Amount {
        self.balances.get(&(*token, *owner)).copied().unwrap_or(0)
    }

    fn debit(&mut self, token: &TokenId, owner: &Address, amount: Amount) -> Result<(), ChannelError> {
        let balance = self.balance(token, owner);
        if balance < amount {
            return Err(ChannelError::TransferFailed(format!(
                "{} holds {} of {}, needs {}",
                short_hex(owner),
                balance,
                short_hex(token),
                amount
            )));
        }
        self.balances.insert((*token, *owner), balance - amount);
        Ok(())
    }

    fn credit(&mut self, token: &TokenId, owner: &Address, amount: Amount) {
        let entry = self.balances.entry((*token, *owner)).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    fn ensure_live(&self, token: &TokenId) -> Result<(), ChannelError> {
        if self.failing.contains(token) {
            return Err(ChannelError::TransferFailed(format!(
                "token {} rejected the transfer",
                short_hex(token)
            )));
        }
        Ok(())
    }
}

/// In-memory token ledger for tests and simulation.
#[derive(Debug, Default)]
pub struct InMemoryTokenLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryTokenLedger {
    /// Create empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create tokens out of thin air.
    pub fn mint(&self, token: TokenId, owner: Address, amount: Amount) {
        self.state.write().credit(&token, &owner, amount);
    }

    /// Set `spender`'s allowance over `owner`'s balance.
    pub fn approve(&self, token: TokenId, owner: Address, spender: Address, amount: Amount) {
        self.state
            .write()
            .allowances
            .insert((token, owner, spender), amount);
    }

    /// Burn `bps` basis points of every pull of `token`.
    pub fn set_fee_bps(&self, token: TokenId, bps: u16) {
        self.state.write().fee_bps.insert(token, bps);
    }

    /// Make every transfer of `token` fail (or succeed again).
    pub fn set_failing(&self, token: TokenId, failing: bool) {
        let mut state = self.state.write();
        if failing {
            state.failing.insert(token);
        } else {
            state.failing.remove(&token);
        }
    }
}

impl TokenGateway for InMemoryTokenLedger {
    fn balance_of(&self, token: &TokenId, owner: &Address) -> Result<Amount, ChannelError> {
        Ok(self.state.read().balance(token, owner))
    }

    fn allowance(
        &self,
        token: &TokenId,
        owner: &Address,
        spender: &Address,
    ) -> Result<Amount, ChannelError> {
        Ok(self
            .state
            .read()
            .allowances
            .get(&(*token, *owner, *spender))
            .copied()
            .unwrap_or(0))
    }

    fn transfer_from(
        &self,
        token: &TokenId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), ChannelError> {
        let mut state = self.state.write();
        state.ensure_live(token)?;
        let allowed = state
            .allowances
            .get(&(*token, *from, *spender))
            .copied()
            .unwrap_or(0);
        if allowed < amount {
            return Err(ChannelError::TransferFailed(format!(
                "allowance {} below {}",
                allowed, amount
            )));
        }
        state.debit(token, from, amount)?;
        state.allowances.insert((*token, *from, *spender), allowed - amount);

        let bps = Amount::from(state.fee_bps.get(token).copied().unwrap_or(0));
        let fee = amount.saturating_mul(bps) / BPS_DENOMINATOR;
        state.credit(token, to, amount - fee);
        debug!(
            "[bridge] Pulled {} of {} from {} (fee {})",
            amount,
            short_hex(token),
            short_hex(from),
            fee
        );
        Ok(())
    }

    fn transfer(
        &self,
        token: &TokenId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), ChannelError> {
        let mut state = self.state.write();
        state.ensure_live(token)?;
        state.debit(token, from, amount)?;
        state.credit(token, to, amount);
        Ok(())
    }
}
