//! # Settlement Flows
//!
//! ```text
//! open ──→ deposit ×N ──→ initialize_state ──→ [timeout] ──→ advance_to_closing
//!                                                                  │
//!                               withdraw ×N ←── finalize_close ←───┘
//!                                   │
//!                      [dispute window] ──→ reclaim_leader_bond
//! ```

#[cfg(test)]
mod tests {
    use channel_bridge::scenario::{participants, Harness, BOND_TOKEN, LEADER, TOKEN_A, TOKEN_B, VAULT};
    use channel_bridge::{ChannelEvent, ChannelState, ClosePath, TokenGateway, WithdrawalPath};
    use shared_types::{address_from_byte, Amount};

    const HOUR: u64 = 3600;

    fn harness() -> Harness {
        let h = Harness::new().expect("harness config");
        h.register_transfer_circuit().expect("register circuit");
        h
    }

    /// Three participants, one token, 10 each, tree 16, one hour, bond 1.
    #[test]
    fn test_three_party_channel_settles_and_pays_out() {
        let h = harness();
        let members = participants(3);
        let (id, keys) = h.open_channel(LEADER, &members, &[TOKEN_A], HOUR).unwrap();
        for member in &members {
            assert_eq!(h.deposit(id, TOKEN_A, *member, 10).unwrap(), 10);
        }
        assert_eq!(h.bridge.bond_status(id).unwrap().amount, 1);

        let proof = h.initialization_proof(id).unwrap();
        let root = h.bridge.initialize_state(LEADER, id, proof).unwrap();
        let channel = h.bridge.channel(id).unwrap();
        assert_eq!(channel.state, ChannelState::Open);
        assert_eq!(channel.initial_state_root, Some(root));
        assert_eq!(channel.required_tree_size.leaves(), 16);

        h.clock.advance_time(HOUR);
        let balances = vec![vec![10, 10, 10]];
        let submission = h.closing_submission(id, &keys, &balances).unwrap();
        assert_eq!(submission.proofs.len(), 1);
        h.bridge
            .advance_to_closing(LEADER, id, submission.proofs, submission.final_root, submission.signature)
            .unwrap();
        assert_eq!(h.bridge.channel_state(id), ChannelState::Closing);

        let proof = h.conservation_proof(id, &balances).unwrap();
        h.bridge.finalize_close(LEADER, id, proof).unwrap();
        assert_eq!(h.bridge.channel_state(id), ChannelState::Closed);

        for member in &members {
            assert_eq!(h.bridge.withdrawable_amount(id, member, &TOKEN_A), 10);
            assert_eq!(h.bridge.withdraw(*member, id, TOKEN_A).unwrap(), 10);
            assert_eq!(h.tokens.balance_of(&TOKEN_A, member).unwrap(), 10);
        }
        assert_eq!(h.tokens.balance_of(&TOKEN_A, &VAULT).unwrap(), 0);
    }

    #[test]
    fn test_multi_token_channel_redistributes_each_token() {
        let h = harness();
        let members = participants(4);
        let (id, keys) = h.open_channel(LEADER, &members, &[TOKEN_A, TOKEN_B], 2 * HOUR).unwrap();
        let deposits: [Amount; 4] = [100, 200, 300, 400];
        for (member, amount) in members.iter().zip(deposits) {
            h.deposit(id, TOKEN_A, *member, amount).unwrap();
            h.deposit(id, TOKEN_B, *member, amount / 10).unwrap();
        }

        let balances = vec![vec![400, 300, 200, 100], vec![0, 0, 50, 50]];
        h.settle(id, &keys, &balances).unwrap();

        for (t, token) in [TOKEN_A, TOKEN_B].iter().enumerate() {
            for (p, member) in members.iter().enumerate() {
                let expected = balances[t][p];
                assert_eq!(h.bridge.withdrawable_amount(id, member, token), expected);
                if expected > 0 {
                    assert_eq!(h.bridge.withdraw(*member, id, *token).unwrap(), expected);
                }
            }
            assert_eq!(h.tokens.balance_of(token, &VAULT).unwrap(), 0);
        }
        assert_eq!(
            h.events.count(|e| matches!(e, ChannelEvent::Withdrawn { path: WithdrawalPath::Normal, .. })),
            6
        );
    }

    #[test]
    fn test_multi_hop_chain_settles() {
        let h = harness();
        let members = participants(3);
        let (id, keys) = h.open_channel(LEADER, &members, &[TOKEN_A], HOUR).unwrap();
        for member in &members {
            h.deposit(id, TOKEN_A, *member, 10).unwrap();
        }
        let proof = h.initialization_proof(id).unwrap();
        h.bridge.initialize_state(LEADER, id, proof).unwrap();
        h.bridge.activate(LEADER, id).unwrap();

        let balances = vec![vec![5, 12, 13]];
        let step_one = *h.commitment(id, &[vec![8, 12, 10]]).unwrap().root();
        let step_two = *h.commitment(id, &[vec![5, 15, 10]]).unwrap().root();
        let final_root = *h.commitment(id, &balances).unwrap().root();
        let proofs = h.transition_chain(id, &[step_one, step_two, final_root]).unwrap();
        let signature = keys.sign_closing(id, &final_root).unwrap();

        h.clock.advance_time(HOUR);
        h.bridge
            .advance_to_closing(LEADER, id, proofs, final_root, signature)
            .unwrap();
        let proof = h.conservation_proof(id, &balances).unwrap();
        h.bridge.finalize_close(LEADER, id, proof).unwrap();

        assert_eq!(h.bridge.withdraw(members[2], id, TOKEN_A).unwrap(), 13);
    }

    #[test]
    fn test_leader_reclaims_bond_and_opens_next_channel() {
        let h = harness();
        let members = participants(3);
        let (id, keys) = h.open_channel(LEADER, &members, &[TOKEN_A], HOUR).unwrap();
        for member in &members {
            h.deposit(id, TOKEN_A, *member, 10).unwrap();
        }
        h.settle(id, &keys, &[vec![10, 10, 10]]).unwrap();
        assert_eq!(h.bridge.leader_channel(&LEADER), None);

        let (next, _) = h.open_channel(LEADER, &members, &[TOKEN_B], HOUR).unwrap();
        assert_ne!(next, id);

        h.clock.advance_time(h.bridge.config().dispute_window + 1);
        assert_eq!(h.bridge.reclaim_leader_bond(LEADER, id).unwrap(), 1);
        // One bond back, one still locked for the next channel.
        assert_eq!(h.tokens.balance_of(&BOND_TOKEN, &LEADER).unwrap(), 1);
        assert_eq!(h.tokens.balance_of(&BOND_TOKEN, &VAULT).unwrap(), 1);
    }

    #[test]
    fn test_events_trace_the_lifecycle() {
        let h = harness();
        let members = participants(3);
        let (id, keys) = h.open_channel(LEADER, &members, &[TOKEN_A], HOUR).unwrap();
        for member in &members {
            h.deposit(id, TOKEN_A, *member, 10).unwrap();
        }
        h.settle(id, &keys, &[vec![10, 10, 10]]).unwrap();

        let lifecycle: Vec<ChannelEvent> = h
            .events
            .events()
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    ChannelEvent::ChannelOpened { .. }
                        | ChannelEvent::StateInitialized { .. }
                        | ChannelEvent::ClosingStarted { .. }
                        | ChannelEvent::ChannelClosed { .. }
                )
            })
            .collect();
        assert_eq!(lifecycle.len(), 4);
        assert!(matches!(lifecycle[0], ChannelEvent::ChannelOpened { channel, .. } if channel == id));
        assert!(matches!(
            lifecycle[3],
            ChannelEvent::ChannelClosed { path: ClosePath::Settled, .. }
        ));
        assert_eq!(h.events.count(|e| matches!(e, ChannelEvent::Deposited { .. })), 3);
    }

    #[test]
    fn test_concurrent_channels_keep_separate_ledgers() {
        let h = harness();
        let members = participants(3);
        let other_leader = address_from_byte(0x02);
        let (first, first_keys) = h.open_channel(LEADER, &members, &[TOKEN_A], HOUR).unwrap();
        let (second, second_keys) = h.open_channel(other_leader, &members, &[TOKEN_A], HOUR).unwrap();
        for member in &members {
            h.deposit(first, TOKEN_A, *member, 10).unwrap();
            h.deposit(second, TOKEN_A, *member, 20).unwrap();
        }

        h.settle(first, &first_keys, &[vec![0, 15, 15]]).unwrap();
        h.settle(second, &second_keys, &[vec![60, 0, 0]]).unwrap();

        assert_eq!(h.bridge.withdraw(members[0], second, TOKEN_A).unwrap(), 60);
        assert_eq!(h.bridge.withdraw(members[1], first, TOKEN_A).unwrap(), 15);
        assert_eq!(h.bridge.withdraw(members[2], first, TOKEN_A).unwrap(), 15);
        assert_eq!(h.tokens.balance_of(&TOKEN_A, &VAULT).unwrap(), 0);
    }
}
