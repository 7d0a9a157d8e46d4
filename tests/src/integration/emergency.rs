//! # Emergency Flows
//!
//! Paths where the leader fails the channel:
//!
//! - **Timeout**: no settlement before the deadline; anyone in the channel
//!   slashes the bond and everyone leaves with their deposits.
//! - **Dispute**: a participant accuses the leader after settlement; the
//!   owner upholds it and the channel switches to the emergency exit.

#[cfg(test)]
mod tests {
    use channel_bridge::scenario::{participants, Harness, ChannelKeys, LEADER, OWNER, TOKEN_A, TOKEN_B, TREASURY, VAULT};
    use channel_bridge::{
        ChannelError, ChannelEvent, ChannelId, ChannelState, ClosePath, DisputeStatus, TokenGateway, WithdrawalPath,
    };
    use shared_types::{Address, Amount};

    const HOUR: u64 = 3600;
    const DEPOSIT: Amount = 10;

    fn harness() -> Harness {
        let h = Harness::new().expect("harness config");
        h.register_transfer_circuit().expect("register circuit");
        h
    }

    fn funded(h: &Harness, tokens: &[Address]) -> (ChannelId, ChannelKeys, Vec<Address>) {
        let members = participants(3);
        let (id, keys) = h.open_channel(LEADER, &members, tokens, HOUR).unwrap();
        for token in tokens {
            for member in &members {
                h.deposit(id, *token, *member, DEPOSIT).unwrap();
            }
        }
        (id, keys, members)
    }

    // =========================================================================
    // TIMEOUT
    // =========================================================================

    /// Leader goes silent: slashed once, every participant recovers 10.
    #[test]
    fn test_silent_leader_is_slashed_and_deposits_refunded() {
        let h = harness();
        let (id, _, members) = funded(&h, &[TOKEN_A]);

        let deadline = h.bridge.settlement_deadline(id).unwrap();
        h.clock.set_time(deadline);
        assert!(matches!(
            h.bridge.handle_proof_timeout(members[0], id).unwrap_err(),
            ChannelError::DeadlineNotReached { .. }
        ));

        h.clock.set_time(deadline + 1);
        h.bridge.handle_proof_timeout(members[0], id).unwrap();
        assert_eq!(
            h.bridge.handle_proof_timeout(members[1], id).unwrap_err(),
            ChannelError::BondAlreadySlashed
        );
        assert_eq!(h.bridge.treasury_pool(), 1);
        assert_eq!(h.events.count(|e| matches!(e, ChannelEvent::BondSlashed { .. })), 1);
        assert!(h.events.events().iter().any(|e| matches!(
            e,
            ChannelEvent::ChannelClosed { channel, path: ClosePath::Timeout } if *channel == id
        )));

        for member in &members {
            assert_eq!(h.bridge.emergency_withdraw(*member, id).unwrap(), vec![(TOKEN_A, DEPOSIT)]);
            assert_eq!(h.tokens.balance_of(&TOKEN_A, member).unwrap(), DEPOSIT);
        }
        assert_eq!(h.tokens.balance_of(&TOKEN_A, &VAULT).unwrap(), 0);

        assert_eq!(h.bridge.withdraw_treasury(OWNER).unwrap(), 1);
        assert_eq!(h.bridge.treasury_pool(), 0);
    }

    #[test]
    fn test_emergency_exit_covers_every_token() {
        let h = harness();
        let (id, _, members) = funded(&h, &[TOKEN_A, TOKEN_B]);
        h.clock.set_time(h.bridge.settlement_deadline(id).unwrap() + 1);
        h.bridge.handle_proof_timeout(members[2], id).unwrap();

        let payouts = h.bridge.emergency_withdraw(members[1], id).unwrap();
        assert_eq!(payouts, vec![(TOKEN_A, DEPOSIT), (TOKEN_B, DEPOSIT)]);
        assert_eq!(
            h.bridge.emergency_withdraw(members[1], id).unwrap_err(),
            ChannelError::AlreadyEmergencyWithdrawn
        );
        assert_eq!(
            h.events.count(|e| matches!(e, ChannelEvent::Withdrawn { path: WithdrawalPath::Emergency, .. })),
            2
        );
    }

    #[test]
    fn test_leader_stuck_in_closing_is_slashed() {
        let h = harness();
        let (id, keys, members) = funded(&h, &[TOKEN_A]);
        let proof = h.initialization_proof(id).unwrap();
        h.bridge.initialize_state(LEADER, id, proof).unwrap();
        h.clock.advance_time(HOUR);
        let balances = vec![vec![10, 10, 10]];
        let submission = h.closing_submission(id, &keys, &balances).unwrap();
        h.bridge
            .advance_to_closing(LEADER, id, submission.proofs, submission.final_root, submission.signature)
            .unwrap();

        // Conservation never arrives.
        h.clock.set_time(h.bridge.settlement_deadline(id).unwrap() + 1);
        let proof = h.conservation_proof(id, &balances).unwrap();
        assert!(matches!(
            h.bridge.finalize_close(LEADER, id, proof).unwrap_err(),
            ChannelError::DeadlinePassed { .. }
        ));
        h.bridge.handle_proof_timeout(members[0], id).unwrap();
        assert_eq!(h.bridge.channel_state(id), ChannelState::Closed);
        assert_eq!(h.bridge.emergency_amount(id, &members[0], &TOKEN_A), DEPOSIT);
        assert_eq!(h.bridge.leader_channel(&LEADER), None);
    }

    // =========================================================================
    // DISPUTES
    // =========================================================================

    #[test]
    fn test_upheld_dispute_reverts_to_deposits() {
        let h = harness();
        let (id, keys, members) = funded(&h, &[TOKEN_A]);
        // Leader settles a redistribution nobody agreed to.
        h.settle(id, &keys, &[vec![0, 0, 30]]).unwrap();
        assert_eq!(h.bridge.withdrawable_amount(id, &members[2], &TOKEN_A), 30);

        let dispute = h.bridge.raise_dispute(members[0], id, b"unsigned transfer".to_vec()).unwrap();
        assert_eq!(h.bridge.channel_disputes(id).len(), 1);
        h.bridge.resolve_dispute(OWNER, dispute).unwrap();
        assert_eq!(h.bridge.dispute(dispute).unwrap().status, DisputeStatus::Resolved);

        let bond = h.bridge.bond_status(id).unwrap();
        assert!(bond.slashed);
        assert!(!bond.reclaimed);
        assert_eq!(
            h.bridge.withdraw(members[2], id, TOKEN_A).unwrap_err(),
            ChannelError::EmergencyActive(id)
        );
        for member in &members {
            assert_eq!(h.bridge.emergency_withdraw(*member, id).unwrap(), vec![(TOKEN_A, DEPOSIT)]);
        }
        assert_eq!(h.tokens.balance_of(&TOKEN_A, &VAULT).unwrap(), 0);
    }

    #[test]
    fn test_rejected_dispute_releases_settlement() {
        let h = harness();
        let (id, keys, members) = funded(&h, &[TOKEN_A]);
        h.settle(id, &keys, &[vec![5, 10, 15]]).unwrap();

        let dispute = h.bridge.raise_dispute(members[1], id, b"claim".to_vec()).unwrap();
        assert_eq!(
            h.bridge.withdraw(members[2], id, TOKEN_A).unwrap_err(),
            ChannelError::PendingDispute(id)
        );

        h.bridge.reject_dispute(OWNER, dispute).unwrap();
        assert_eq!(h.bridge.withdraw(members[2], id, TOKEN_A).unwrap(), 15);
        assert!(matches!(
            h.bridge.reclaim_leader_bond(LEADER, id).unwrap_err(),
            ChannelError::DisputeWindowOpen { .. }
        ));

        h.clock.advance_time(h.bridge.config().dispute_window + 1);
        assert_eq!(h.bridge.reclaim_leader_bond(LEADER, id).unwrap(), 1);
        assert_eq!(h.bridge.treasury_pool(), 0);
    }

    #[test]
    fn test_treasury_receives_slashed_bonds() {
        let h = harness();
        let (id, _, members) = funded(&h, &[TOKEN_A]);
        h.clock.set_time(h.bridge.settlement_deadline(id).unwrap() + 1);
        h.bridge.handle_proof_timeout(members[0], id).unwrap();

        let bond_token = h.bridge.config().bond_token;
        assert_eq!(h.bridge.withdraw_treasury(OWNER).unwrap(), 1);
        assert_eq!(h.tokens.balance_of(&bond_token, &TREASURY).unwrap(), 1);
        assert_eq!(
            h.bridge.withdraw_treasury(OWNER).unwrap_err(),
            ChannelError::EmptyTreasury
        );
    }
}
