//! Registry of transition circuits keyed by 4-byte selector.

use crate::domain::{ChannelError, FunctionEntry, FunctionSelector};
use std::collections::BTreeMap;

/// Registered transition circuits.
#[derive(Clone, Debug, Default)]
pub struct FunctionRegistry {
    entries: BTreeMap<FunctionSelector, FunctionEntry>,
}

impl FunctionRegistry {
    /// Create empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a circuit. Both verification-key parts must be non-empty.
    pub fn register(&mut self, entry: FunctionEntry) -> Result<(), ChannelError> {
        if entry.vk_part1.is_empty() || entry.vk_part2.is_empty() {
            return Err(ChannelError::EmptyVerifierParameters);
        }
        if self.entries.contains_key(&entry.selector) {
            return Err(ChannelError::FunctionAlreadyRegistered(entry.selector));
        }
        self.entries.insert(entry.selector, entry);
        Ok(())
    }

    /// Remove a circuit.
    pub fn unregister(&mut self, selector: &FunctionSelector) -> Result<FunctionEntry, ChannelError> {
        self.entries
            .remove(selector)
            .ok_or(ChannelError::FunctionNotRegistered(*selector))
    }

    /// Look up a circuit.
    pub fn get(&self, selector: &FunctionSelector) -> Option<&FunctionEntry> {
        self.entries.get(selector)
    }

    /// Number of registered circuits.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
