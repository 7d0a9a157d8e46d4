//! # Economic Security
//!
//! Leadership exclusivity, bond slashing and the treasury pool.
//!
//! An address leads at most one channel that has not reached `Closed`. A bond
//! ends in exactly one place: the treasury pool (slashed) or back with the
//! leader (reclaimed).

use crate::domain::{Channel, ChannelError, ChannelId};
use shared_types::{short_hex, Address, Amount};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Leader registry and treasury pool.
#[derive(Debug, Default)]
pub struct EconomicSecurity {
    leaders: BTreeMap<Address, ChannelId>,
    treasury: Address,
    treasury_pool: Amount,
}

impl EconomicSecurity {
    /// Create manager paying slashed bonds to `treasury`.
    pub fn new(treasury: Address) -> Self {
        Self {
            leaders: BTreeMap::new(),
            treasury,
            treasury_pool: 0,
        }
    }

    // =========================================================================
    // LEADERSHIP
    // =========================================================================

    /// Fail if `leader` already leads a live channel.
    pub fn ensure_free(&self, leader: &Address) -> Result<(), ChannelError> {
        match self.leaders.get(leader) {
            Some(&channel) => Err(ChannelError::AlreadyLeading {
                leader: *leader,
                channel,
            }),
            None => Ok(()),
        }
    }

    /// Record `leader` as leading `channel`.
    pub fn claim_leadership(&mut self, leader: Address, channel: ChannelId) -> Result<(), ChannelError> {
        self.ensure_free(&leader)?;
        self.leaders.insert(leader, channel);
        debug!("[bridge] {} now leads channel {}", short_hex(&leader), channel);
        Ok(())
    }

    /// Release leadership held for `channel`.
    pub fn release_leadership(&mut self, leader: &Address, channel: ChannelId) {
        if self.leaders.get(leader) == Some(&channel) {
            self.leaders.remove(leader);
        }
    }

    /// Live channel led by `leader`.
    pub fn leader_channel(&self, leader: &Address) -> Option<ChannelId> {
        self.leaders.get(leader).copied()
    }

    // =========================================================================
    // BONDS
    // =========================================================================

    /// Move the channel's bond into the treasury pool.
    ///
    /// Marks the channel slashed; returns the amount moved.
    pub fn slash(&mut self, channel: &mut Channel) -> Result<Amount, ChannelError> {
        if channel.bond_slashed {
            return Err(ChannelError::BondAlreadySlashed);
        }
        if channel.bond_reclaimed {
            return Err(ChannelError::BondAlreadyReclaimed);
        }
        self.treasury_pool = self
            .treasury_pool
            .checked_add(channel.leader_bond)
            .ok_or(ChannelError::AmountOverflow)?;
        channel.bond_slashed = true;
        warn!(
            "[bridge] Slashed bond of {} on channel {}: {}",
            short_hex(&channel.leader),
            channel.id,
            channel.leader_bond
        );
        Ok(channel.leader_bond)
    }

    // =========================================================================
    // TREASURY
    // =========================================================================

    /// Current treasury recipient.
    pub fn treasury(&self) -> Address {
        self.treasury
    }

    /// Change the treasury recipient.
    pub fn set_treasury(&mut self, treasury: Address) {
        self.treasury = treasury;
    }

    /// Slashed bonds awaiting a sweep.
    pub fn treasury_pool(&self) -> Amount {
        self.treasury_pool
    }

    /// Zero the pool and return its content.
    pub fn take_pool(&mut self) -> Result<Amount, ChannelError> {
        if self.treasury_pool == 0 {
            return Err(ChannelError::EmptyTreasury);
        }
        Ok(std::mem::take(&mut self.treasury_pool))
    }

    /// Undo `take_pool` after a failed transfer.
    pub fn restore_pool(&mut self, amount: Amount) {
        self.treasury_pool = self.treasury_pool.saturating_add(amount);
    }
}
