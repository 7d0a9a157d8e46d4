//! # Dispute Book
//!
//! Accusations against channel leaders. Disputes are raised by participants
//! and decided by the bridge owner; a `Raised` dispute older than the dispute
//! timeout is expired and blocks nothing.

use crate::domain::{ChannelError, ChannelId, Dispute, DisputeId, DisputeStatus};
use shared_types::{Address, Timestamp};
use std::collections::BTreeMap;

/// All disputes, keyed by id.
#[derive(Debug)]
pub struct DisputeBook {
    disputes: BTreeMap<DisputeId, Dispute>,
    next_id: u64,
}

impl Default for DisputeBook {
    fn default() -> Self {
        Self::new()
    }
}

impl DisputeBook {
    /// Create empty book; ids start at 1.
    pub fn new() -> Self {
        Self {
            disputes: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// File a dispute. One pending dispute per accuser per channel.
    pub fn raise(
        &mut self,
        channel_id: ChannelId,
        accuser: Address,
        accused: Address,
        evidence: Vec<u8>,
        now: Timestamp,
        timeout: u64,
    ) -> Result<DisputeId, ChannelError> {
        let duplicate = self.disputes.values().any(|d| {
            d.channel_id == channel_id && d.accuser == accuser && d.is_pending(now, timeout)
        });
        if duplicate {
            return Err(ChannelError::DuplicateDispute);
        }
        let id = DisputeId(self.next_id);
        self.next_id += 1;
        self.disputes.insert(
            id,
            Dispute {
                id,
                channel_id,
                accuser,
                accused,
                status: DisputeStatus::Raised,
                timestamp: now,
                evidence,
            },
        );
        Ok(id)
    }

    /// Look up a dispute.
    pub fn get(&self, id: DisputeId) -> Option<&Dispute> {
        self.disputes.get(&id)
    }

    /// A dispute that can still be decided.
    pub fn pending(&self, id: DisputeId, now: Timestamp, timeout: u64) -> Result<&Dispute, ChannelError> {
        let dispute = self.disputes.get(&id).ok_or(ChannelError::DisputeNotFound(id))?;
        if dispute.status != DisputeStatus::Raised {
            return Err(ChannelError::DisputeNotPending(id));
        }
        if dispute.is_expired(now, timeout) {
            return Err(ChannelError::DisputeExpired(id));
        }
        Ok(dispute)
    }

    /// Disputes of a channel, oldest first.
    pub fn by_channel(&self, channel_id: ChannelId) -> Vec<&Dispute> {
        self.disputes
            .values()
            .filter(|d| d.channel_id == channel_id)
            .collect()
    }

    /// Any pending dispute on the channel.
    pub fn has_pending(&self, channel_id: ChannelId, now: Timestamp, timeout: u64) -> bool {
        self.disputes
            .values()
            .any(|d| d.channel_id == channel_id && d.is_pending(now, timeout))
    }

    /// Set a decided status.
    pub fn set_status(&mut self, id: DisputeId, status: DisputeStatus) {
        if let Some(dispute) = self.disputes.get_mut(&id) {
            dispute.status = status;
        }
    }

    /// Drop every dispute of a channel.
    pub fn purge(&mut self, channel_id: ChannelId) {
        self.disputes.retain(|_, d| d.channel_id != channel_id);
    }
}
