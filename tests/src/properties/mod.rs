//! # Property Tests
//!
//! Randomized checks of the invariants every channel must hold:
//!
//! - Tree size is the smallest compiled tree holding all cells
//! - Final balances conserve deposits per token
//! - A leader drives at most one live channel
//! - Settlement pays out exactly what was deposited

#[cfg(test)]
mod tests {
    use channel_bridge::scenario::{participants, Harness, LEADER, TOKEN_A, TOKEN_B, VAULT};
    use channel_bridge::{determine_tree_size, invariant_conservation, ChannelError, TokenGateway};
    use proptest::prelude::*;
    use shared_types::{address_from_byte, Amount};

    const HOUR: u64 = 3600;

    /// Split `total` into three parts at two random cut points.
    fn split_three(total: Amount, a: Amount, b: Amount) -> Vec<Amount> {
        let (a, b) = (a % (total + 1), b % (total + 1));
        let (lo, hi) = (a.min(b), a.max(b));
        vec![lo, hi - lo, total - hi]
    }

    // =========================================================================
    // PURE INVARIANTS
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn prop_tree_size_is_smallest_fit(participants in 1usize..=160, tokens in 1usize..=4) {
            let cells = participants * tokens;
            match determine_tree_size(participants, tokens) {
                Ok(size) => {
                    let leaves = size.leaves();
                    prop_assert!(leaves >= cells);
                    prop_assert!(leaves == 16 || leaves / 2 < cells, "{} leaves for {} cells", leaves, cells);
                }
                Err(err) => {
                    prop_assert!(cells > 128);
                    let is_capacity = matches!(err, ChannelError::CapacityExceeded { .. });
                    prop_assert!(is_capacity);
                }
            }
        }

        #[test]
        fn prop_conserving_rows_pass(
            total_a in 0u128..1_000_000,
            total_b in 0u128..1_000_000,
            cuts in any::<(u128, u128, u128, u128)>(),
        ) {
            let rows = vec![split_three(total_a, cuts.0, cuts.1), split_three(total_b, cuts.2, cuts.3)];
            prop_assert!(invariant_conservation(&[TOKEN_A, TOKEN_B], 3, &rows, &[total_a, total_b]).is_ok());
        }

        #[test]
        fn prop_shifted_cell_is_caught(
            total in 1u128..1_000_000,
            cuts in any::<(u128, u128)>(),
            cell in 0usize..3,
            inflate in any::<bool>(),
        ) {
            let mut row = split_three(total, cuts.0, cuts.1);
            if inflate || row[cell] == 0 {
                row[cell] += 1;
            } else {
                row[cell] -= 1;
            }
            let result = invariant_conservation(&[TOKEN_A], 3, &[row], &[total]);
            let violated = matches!(result, Err(ChannelError::ConservationViolated { .. }));
            prop_assert!(violated);
        }
    }

    // =========================================================================
    // BRIDGE INVARIANTS
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        /// Random open attempts from a pool of three leaders.
        #[test]
        fn prop_single_live_channel_per_leader(picks in proptest::collection::vec(0u8..3, 1..8)) {
            let h = Harness::new().expect("harness config");
            let members = participants(3);
            let mut leading = [false; 3];
            for pick in picks {
                let leader = address_from_byte(0x01 + pick);
                let result = h.open_channel(leader, &members, &[TOKEN_A], HOUR);
                if leading[pick as usize] {
                    prop_assert!(result.is_err());
                } else {
                    let (id, _) = result.expect("first channel opens");
                    prop_assert_eq!(h.bridge.leader_channel(&leader), Some(id));
                    leading[pick as usize] = true;
                }
            }
        }

        #[test]
        fn prop_settlement_pays_out_deposits(
            deposits in proptest::collection::vec(1u128..10_000, 3),
            cuts in any::<(u128, u128)>(),
        ) {
            let h = Harness::new().expect("harness config");
            h.register_transfer_circuit().expect("register circuit");
            let members = participants(3);
            let (id, keys) = h.open_channel(LEADER, &members, &[TOKEN_A], HOUR).expect("open");
            for (member, amount) in members.iter().zip(&deposits) {
                h.deposit(id, TOKEN_A, *member, *amount).expect("deposit");
            }

            let total: Amount = deposits.iter().sum();
            let balances = split_three(total, cuts.0, cuts.1);
            h.settle(id, &keys, &[balances.clone()]).expect("settle");

            let mut paid = 0;
            for (member, expected) in members.iter().zip(&balances) {
                if *expected > 0 {
                    paid += h.bridge.withdraw(*member, id, TOKEN_A).expect("withdraw");
                }
            }
            prop_assert_eq!(paid, total);
            prop_assert_eq!(h.tokens.balance_of(&TOKEN_A, &VAULT).expect("vault balance"), 0);
        }
    }
}
