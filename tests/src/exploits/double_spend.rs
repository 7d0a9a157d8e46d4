//! # Double Spend
//!
//! Funds leave the vault once per cell, whichever path is taken.

#[cfg(test)]
mod tests {
    use channel_bridge::scenario::{participants, Harness, LEADER, OWNER, TOKEN_A, VAULT};
    use channel_bridge::{ChannelError, ChannelId, TokenGateway};
    use shared_types::{address_from_byte, Address, Amount};

    const HOUR: u64 = 3600;
    const DEPOSIT: Amount = 10;

    fn harness() -> Harness {
        let h = Harness::new().expect("harness config");
        h.register_transfer_circuit().expect("register circuit");
        h
    }

    fn settled(h: &Harness, balances: &[Amount]) -> (ChannelId, Vec<Address>) {
        let members = participants(balances.len() as u8);
        let (id, keys) = h.open_channel(LEADER, &members, &[TOKEN_A], HOUR).unwrap();
        for member in &members {
            h.deposit(id, TOKEN_A, *member, DEPOSIT).unwrap();
        }
        h.settle(id, &keys, &[balances.to_vec()]).unwrap();
        (id, members)
    }

    // =========================================================================
    // NORMAL PATH
    // =========================================================================

    #[test]
    fn test_repeated_withdrawal_pays_once() {
        let h = harness();
        let (id, members) = settled(&h, &[5, 10, 15]);

        assert_eq!(h.bridge.withdraw(members[2], id, TOKEN_A).unwrap(), 15);
        assert_eq!(
            h.bridge.withdraw(members[2], id, TOKEN_A).unwrap_err(),
            ChannelError::AlreadyWithdrawn
        );
        assert_eq!(h.tokens.balance_of(&TOKEN_A, &members[2]).unwrap(), 15);
        assert_eq!(h.tokens.balance_of(&TOKEN_A, &VAULT).unwrap(), 15);
    }

    #[test]
    fn test_outsider_cannot_withdraw() {
        let h = harness();
        let (id, _) = settled(&h, &[10, 10, 10]);
        let outsider = address_from_byte(0x77);

        assert!(matches!(
            h.bridge.withdraw(outsider, id, TOKEN_A).unwrap_err(),
            ChannelError::NotParticipant { .. }
        ));
        assert!(matches!(
            h.bridge.withdraw(LEADER, id, TOKEN_A).unwrap_err(),
            ChannelError::NotParticipant { .. }
        ));
    }

    #[test]
    fn test_deposit_after_initialization_is_refused() {
        let h = harness();
        let members = participants(3);
        let (id, _) = h.open_channel(LEADER, &members, &[TOKEN_A], HOUR).unwrap();
        for member in &members {
            h.deposit(id, TOKEN_A, *member, DEPOSIT).unwrap();
        }
        let proof = h.initialization_proof(id).unwrap();
        h.bridge.initialize_state(LEADER, id, proof).unwrap();

        // A late deposit would not be covered by the proven root.
        assert!(matches!(
            h.deposit(id, TOKEN_A, members[0], DEPOSIT).unwrap_err(),
            ChannelError::InvalidState { .. }
        ));
        assert_eq!(h.bridge.total_deposits(id, &TOKEN_A), 3 * DEPOSIT);
    }

    // =========================================================================
    // NORMAL THEN EMERGENCY
    // =========================================================================

    /// A participant who already withdrew is excluded from the emergency
    /// snapshot; the rest share what is left in the vault.
    #[test]
    fn test_withdrawn_cell_is_excluded_from_emergency_exit() {
        let h = harness();
        let (id, members) = settled(&h, &[4, 10, 16]);
        assert_eq!(h.bridge.withdraw(members[2], id, TOKEN_A).unwrap(), 16);

        let dispute = h.bridge.raise_dispute(members[0], id, b"inflated".to_vec()).unwrap();
        h.bridge.resolve_dispute(OWNER, dispute).unwrap();

        assert_eq!(h.bridge.emergency_amount(id, &members[2], &TOKEN_A), 0);
        assert_eq!(
            h.bridge.emergency_withdraw(members[2], id).unwrap_err(),
            ChannelError::NothingToWithdraw
        );

        // 14 left for 20 owed.
        assert_eq!(h.bridge.emergency_withdraw(members[0], id).unwrap(), vec![(TOKEN_A, 7)]);
        assert_eq!(h.bridge.emergency_withdraw(members[1], id).unwrap(), vec![(TOKEN_A, 7)]);
        assert_eq!(h.tokens.balance_of(&TOKEN_A, &VAULT).unwrap(), 0);
    }

    #[test]
    fn test_emergency_claim_is_single_use() {
        let h = harness();
        let members = participants(3);
        let (id, _) = h.open_channel(LEADER, &members, &[TOKEN_A], HOUR).unwrap();
        for member in &members {
            h.deposit(id, TOKEN_A, *member, DEPOSIT).unwrap();
        }
        h.clock.set_time(h.bridge.settlement_deadline(id).unwrap() + 1);
        h.bridge.handle_proof_timeout(members[0], id).unwrap();

        assert_eq!(h.bridge.emergency_withdraw(members[0], id).unwrap(), vec![(TOKEN_A, DEPOSIT)]);
        for _ in 0..3 {
            assert_eq!(
                h.bridge.emergency_withdraw(members[0], id).unwrap_err(),
                ChannelError::AlreadyEmergencyWithdrawn
            );
        }
        assert_eq!(
            h.bridge.withdraw(members[0], id, TOKEN_A).unwrap_err(),
            ChannelError::EmergencyActive(id)
        );
        assert_eq!(h.tokens.balance_of(&TOKEN_A, &VAULT).unwrap(), 2 * DEPOSIT);
    }

    #[test]
    fn test_second_upheld_dispute_does_not_reslash() {
        let h = harness();
        let (id, members) = settled(&h, &[10, 10, 10]);
        let first = h.bridge.raise_dispute(members[0], id, b"one".to_vec()).unwrap();
        let second = h.bridge.raise_dispute(members[1], id, b"two".to_vec()).unwrap();

        h.bridge.resolve_dispute(OWNER, first).unwrap();
        h.bridge.resolve_dispute(OWNER, second).unwrap();
        assert_eq!(h.bridge.treasury_pool(), 1);
        assert_eq!(h.bridge.emergency_withdraw(members[1], id).unwrap(), vec![(TOKEN_A, DEPOSIT)]);
    }
}
