//! # Proof Forgery
//!
//! Settlement material that is valid somewhere must not be accepted
//! elsewhere: signatures are bound to a channel, chains to an initial root,
//! conservation proofs to the accepted final root.

#[cfg(test)]
mod tests {
    use channel_bridge::scenario::{
        participants, ChannelKeys, Harness, BOND_TOKEN, HARNESS_BOND, LEADER, TOKEN_A,
    };
    use channel_bridge::{ChannelError, ChannelId, ChannelState, OpenChannelRequest};
    use shared_types::{address_from_byte, Address, Amount};

    const HOUR: u64 = 3600;
    const DEPOSIT: Amount = 10;

    fn harness() -> Harness {
        let h = Harness::new().expect("harness config");
        h.register_transfer_circuit().expect("register circuit");
        h
    }

    fn initialized(h: &Harness, leader: Address, keys: Option<&ChannelKeys>, deposit: Amount) -> (ChannelId, ChannelKeys) {
        let members = participants(3);
        let (id, keys) = match keys {
            None => h.open_channel(leader, &members, &[TOKEN_A], HOUR).unwrap(),
            Some(shared) => {
                h.fund(BOND_TOKEN, leader, HARNESS_BOND);
                let id = h
                    .bridge
                    .open_channel(
                        leader,
                        OpenChannelRequest {
                            tokens: vec![TOKEN_A],
                            participants: members.clone(),
                            timeout: HOUR,
                            group_key: shared.group_key(),
                        },
                    )
                    .unwrap();
                (id, shared.clone())
            }
        };
        for member in &members {
            h.deposit(id, TOKEN_A, *member, deposit).unwrap();
        }
        let proof = h.initialization_proof(id).unwrap();
        h.bridge.initialize_state(leader, id, proof).unwrap();
        (id, keys)
    }

    // =========================================================================
    // CROSS-CHANNEL REPLAY
    // =========================================================================

    /// Same group key on two channels: channel 1's settlement cannot be
    /// replayed on channel 2.
    #[test]
    fn test_settlement_is_bound_to_its_channel() {
        let h = harness();
        let other_leader = address_from_byte(0x02);
        let (first, keys) = initialized(&h, LEADER, None, DEPOSIT);
        let (second, _) = initialized(&h, other_leader, Some(&keys), 2 * DEPOSIT);
        h.clock.advance_time(HOUR);

        let replayed = h.closing_submission(first, &keys, &[vec![10, 10, 10]]).unwrap();

        // Chain starts at channel 1's root.
        assert_eq!(
            h.bridge
                .advance_to_closing(
                    other_leader,
                    second,
                    replayed.proofs.clone(),
                    replayed.final_root,
                    replayed.signature.clone(),
                )
                .unwrap_err(),
            ChannelError::InitialRootMismatch
        );

        // Valid chain on channel 2, signature from channel 1.
        let chain = h.transition_chain(second, &[replayed.final_root]).unwrap();
        assert_eq!(
            h.bridge
                .advance_to_closing(
                    other_leader,
                    second,
                    chain.clone(),
                    replayed.final_root,
                    replayed.signature.clone(),
                )
                .unwrap_err(),
            ChannelError::SignatureRejected
        );
        assert_eq!(h.bridge.channel_state(second), ChannelState::Open);

        let bound = keys.sign_closing(second, &replayed.final_root).unwrap();
        h.bridge
            .advance_to_closing(other_leader, second, chain, replayed.final_root, bound)
            .unwrap();
        assert_eq!(h.bridge.channel_state(second), ChannelState::Closing);

        // Channel 1 still accepts its own material.
        h.bridge
            .advance_to_closing(LEADER, first, replayed.proofs, replayed.final_root, replayed.signature)
            .unwrap();
    }

    // =========================================================================
    // CHAIN SPLICING
    // =========================================================================

    #[test]
    fn test_spliced_chain_is_rejected() {
        let h = harness();
        let (id, keys) = initialized(&h, LEADER, None, DEPOSIT);
        h.clock.advance_time(HOUR);

        let honest = *h.commitment(id, &[vec![10, 10, 10]]).unwrap().root();
        let detour = *h.commitment(id, &[vec![12, 10, 8]]).unwrap().root();
        let stolen = *h.commitment(id, &[vec![0, 0, 30]]).unwrap().root();

        let head = h.transition_chain(id, &[honest]).unwrap();
        let tail = h.transition_chain(id, &[detour, stolen]).unwrap();
        let spliced = vec![head[0].clone(), tail[1].clone()];
        let signature = keys.sign_closing(id, &stolen).unwrap();

        assert_eq!(
            h.bridge
                .advance_to_closing(LEADER, id, spliced, stolen, signature.clone())
                .unwrap_err(),
            ChannelError::ChainDiscontinuity { index: 1 }
        );

        // The honest prefix does not reach the claimed root either.
        assert_eq!(
            h.bridge
                .advance_to_closing(LEADER, id, head, stolen, signature)
                .unwrap_err(),
            ChannelError::FinalRootMismatch
        );
        assert_eq!(h.bridge.channel(id).unwrap().final_state_root, None);
    }

    // =========================================================================
    // UNAUTHORIZED SETTLEMENT
    // =========================================================================

    #[test]
    fn test_only_the_leader_drives_settlement() {
        let h = harness();
        let members = participants(3);
        let (id, keys) = initialized(&h, LEADER, None, DEPOSIT);
        h.clock.advance_time(HOUR);
        let balances = vec![vec![30, 0, 0]];
        let submission = h.closing_submission(id, &keys, &balances).unwrap();

        let err = h
            .bridge
            .advance_to_closing(
                members[0],
                id,
                submission.proofs.clone(),
                submission.final_root,
                submission.signature.clone(),
            )
            .unwrap_err();
        assert!(matches!(err, ChannelError::NotLeader { .. }));

        h.bridge
            .advance_to_closing(LEADER, id, submission.proofs, submission.final_root, submission.signature)
            .unwrap();
        let proof = h.conservation_proof(id, &balances).unwrap();
        let err = h.bridge.finalize_close(members[0], id, proof.clone()).unwrap_err();
        assert!(matches!(err, ChannelError::NotLeader { .. }));
        assert_eq!(h.bridge.channel_state(id), ChannelState::Closing);

        h.bridge.finalize_close(LEADER, id, proof).unwrap();
    }

    /// Leader holds a signed root for one distribution and tries to pay out
    /// another that also conserves.
    #[test]
    fn test_conservation_proof_must_match_signed_root() {
        let h = harness();
        let members = participants(3);
        let (id, keys) = initialized(&h, LEADER, None, DEPOSIT);
        h.clock.advance_time(HOUR);
        let submission = h.closing_submission(id, &keys, &[vec![10, 10, 10]]).unwrap();
        h.bridge
            .advance_to_closing(LEADER, id, submission.proofs, submission.final_root, submission.signature)
            .unwrap();

        let diverted = h.conservation_proof(id, &[vec![0, 0, 30]]).unwrap();
        assert_eq!(
            h.bridge.finalize_close(LEADER, id, diverted).unwrap_err(),
            ChannelError::ConservationProofRejected
        );
        assert_eq!(h.bridge.withdrawable_amount(id, &members[2], &TOKEN_A), 0);
    }

    #[test]
    fn test_leader_cannot_sign_for_the_group() {
        let h = harness();
        let (id, _) = initialized(&h, LEADER, None, DEPOSIT);
        h.clock.advance_time(HOUR);
        let leader_only = ChannelKeys::deal(1).unwrap();
        let submission = h.closing_submission(id, &leader_only, &[vec![0, 0, 30]]).unwrap();

        assert_eq!(
            h.bridge
                .advance_to_closing(LEADER, id, submission.proofs, submission.final_root, submission.signature)
                .unwrap_err(),
            ChannelError::SignatureRejected
        );
    }
}
