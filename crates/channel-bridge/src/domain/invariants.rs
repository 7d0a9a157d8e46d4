//! # Domain Invariants
//!
//! Pure checks shared by the service and the proof gate.

use super::errors::ChannelError;
use bridge_zkp::{TreeSize, MAX_TREE_LEAVES};
use shared_types::{Amount, TokenId};

/// Smallest compiled tree holding `participants × tokens` leaves.
pub fn determine_tree_size(participants: usize, tokens: usize) -> Result<TreeSize, ChannelError> {
    let capacity_error = || ChannelError::CapacityExceeded {
        participants,
        tokens,
        max: MAX_TREE_LEAVES,
    };
    let leaves = participants.checked_mul(tokens).ok_or_else(capacity_error)?;
    TreeSize::for_leaves(leaves).map_err(|_| capacity_error())
}

/// First item that appears twice.
pub fn find_duplicate<T: PartialEq>(items: &[T]) -> Option<&T> {
    items
        .iter()
        .enumerate()
        .find(|(i, item)| items[..*i].contains(item))
        .map(|(_, item)| item)
}

/// Every column sum of `final_balances` equals the token's total deposits.
///
/// `final_balances[t][p]` is participant `p`'s balance of `tokens[t]`.
pub fn invariant_conservation(
    tokens: &[TokenId],
    participants: usize,
    final_balances: &[Vec<Amount>],
    totals: &[Amount],
) -> Result<(), ChannelError> {
    if final_balances.len() != tokens.len() {
        return Err(ChannelError::BalanceShapeMismatch {
            expected_tokens: tokens.len(),
            expected_participants: participants,
            tokens: final_balances.len(),
            participants: final_balances.first().map(Vec::len).unwrap_or(0),
        });
    }
    if let Some(row) = final_balances.iter().find(|row| row.len() != participants) {
        return Err(ChannelError::BalanceShapeMismatch {
            expected_tokens: tokens.len(),
            expected_participants: participants,
            tokens: final_balances.len(),
            participants: row.len(),
        });
    }

    for ((token, row), expected) in tokens.iter().zip(final_balances).zip(totals) {
        let actual = row
            .iter()
            .try_fold(0u128, |acc, v| acc.checked_add(*v))
            .ok_or(ChannelError::AmountOverflow)?;
        if actual != *expected {
            return Err(ChannelError::ConservationViolated {
                token: *token,
                expected: *expected,
                actual,
            });
        }
    }
    Ok(())
}
