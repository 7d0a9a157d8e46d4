//! # Scenario Harness
//!
//! Wires a [`ChannelBridgeService`] to the in-memory adapters and plays the
//! off-ledger side of the protocol: threshold key dealing, balance-tree
//! commitments and the digest reference proofs.
//!
//! Used by the `bridge-sim` binary, the service tests and the `bridge-tests`
//! crate.
//!
//! ```text
//! Harness::new()
//!   ├── fund()                      mint + approve the vault
//!   ├── open_channel()              leader bond, threshold keys
//!   ├── initialization_proof()      commitment over deposits
//!   ├── closing_submission()        transition chain + group signature
//!   └── conservation_proof()        final balances
//! ```

use crate::adapters::{FixedBlockContext, InMemoryEventLog, InMemoryTokenLedger, ManualClock, SchnorrSignerRecovery};
use crate::domain::{
    BridgeConfig, ChannelError, ChannelId, ConservationProof, FunctionEntry, FunctionSelector,
    InitializationProof, OpenChannelRequest,
};
use crate::proof_gate::{closing_message, tree_signals, ProofGate, TransitionInputs};
use crate::service::ChannelBridgeService;
use bridge_zkp::{DigestProver, FieldElement, StateCommitment, TransitionProof, ZkpError};
use primitive_types::U256;
use shared_crypto::{
    aggregate_commitments, aggregate_signature, deal_shares, keccak256, partial_sign, CryptoError,
    GroupPublicKey, KeyShare, SigningNonce, ThresholdSignature,
};
use shared_types::{address_from_byte, hash_to_u256, Address, Amount, Hash, TokenId, ZERO_HASH};
use std::sync::Arc;
use thiserror::Error;

/// Service over the in-memory token ledger and a manual clock.
pub type InMemoryBridge = ChannelBridgeService<InMemoryTokenLedger, ManualClock>;

/// Bridge administrator.
pub const OWNER: Address = address_from_byte(0xA0);
/// Initial treasury.
pub const TREASURY: Address = address_from_byte(0xA1);
/// Vault holding locked funds.
pub const VAULT: Address = address_from_byte(0xA2);
/// Token bonds are posted in.
pub const BOND_TOKEN: TokenId = address_from_byte(0xB0);
/// First supported channel token.
pub const TOKEN_A: TokenId = address_from_byte(0xB1);
/// Second supported channel token.
pub const TOKEN_B: TokenId = address_from_byte(0xB2);
/// Default channel leader.
pub const LEADER: Address = address_from_byte(0x01);
/// Selector of the reference transfer circuit.
pub const TRANSFER_SELECTOR: FunctionSelector = [0x7F, 0xA3, 0x10, 0x01];

/// Leader bond used by the harness configuration.
pub const HARNESS_BOND: Amount = 1;

/// Default participants: `0x11`, `0x12`, ...
pub fn participants(count: u8) -> Vec<Address> {
    (0..count).map(|i| address_from_byte(0x11 + i)).collect()
}

/// Nonzero off-ledger key of a participant for a token.
pub fn key_for(token: &TokenId, participant: &Address) -> U256 {
    let digest = keccak256(&[&token[..], &participant[..]].concat());
    FieldElement::from_hash(&digest).value() | U256::one()
}

/// Registry entry of the reference transfer circuit.
pub fn transfer_circuit() -> FunctionEntry {
    FunctionEntry {
        selector: TRANSFER_SELECTOR,
        vk_part1: vec![U256::from(0x1001u64), U256::from(0x1002u64)],
        vk_part2: vec![U256::from(0x2001u64)],
        instance_hash: keccak256(b"transfer-circuit/v1"),
    }
}

/// Harness failures.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The bridge rejected an operation.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// Key dealing or signing failed.
    #[error("Crypto: {0}")]
    Crypto(#[from] CryptoError),

    /// Commitment or proof construction failed.
    #[error("Proof construction: {0}")]
    Zkp(#[from] ZkpError),
}

// =============================================================================
// THRESHOLD KEYS
// =============================================================================

/// Trusted-dealer group key of a channel; any majority of shares signs.
#[derive(Debug, Clone)]
pub struct ChannelKeys {
    group_key: GroupPublicKey,
    shares: Vec<KeyShare>,
    threshold: usize,
}

impl ChannelKeys {
    /// Deal `n/2 + 1`-of-`n` shares for `participants` members.
    pub fn deal(participants: usize) -> Result<Self, CryptoError> {
        let threshold = participants / 2 + 1;
        let total = u16::try_from(participants).map_err(|_| CryptoError::InvalidThreshold {
            threshold,
            total: participants,
        })?;
        let secret: [u8; 32] = rand::random();
        let coefficients: Vec<[u8; 32]> = (1..threshold).map(|_| rand::random()).collect();
        let (group_key, shares) = deal_shares(&secret, &coefficients, total)?;
        Ok(Self {
            group_key,
            shares,
            threshold,
        })
    }

    /// Aggregated public key.
    pub fn group_key(&self) -> GroupPublicKey {
        self.group_key
    }

    /// Sign with the first `threshold` shares and fresh nonces.
    pub fn sign(&self, message: &Hash) -> Result<ThresholdSignature, CryptoError> {
        let signing = &self.shares[..self.threshold];
        let signers: Vec<u16> = signing.iter().map(KeyShare::index).collect();
        let nonces = signing
            .iter()
            .map(|_| SigningNonce::from_seed(&rand::random::<[u8; 32]>()))
            .collect::<Result<Vec<_>, _>>()?;
        let commitments = nonces
            .iter()
            .map(SigningNonce::commitment)
            .collect::<Result<Vec<_>, _>>()?;
        let r = aggregate_commitments(&commitments)?;
        let partials = signing
            .iter()
            .zip(&nonces)
            .map(|(share, nonce)| partial_sign(share, nonce, &r, &self.group_key, message, &signers))
            .collect::<Result<Vec<_>, _>>()?;
        aggregate_signature(&r, &partials)
    }

    /// Sign the closing message of `channel` for `final_root`.
    pub fn sign_closing(&self, channel: ChannelId, final_root: &Hash) -> Result<ThresholdSignature, CryptoError> {
        self.sign(&closing_message(channel, final_root))
    }
}

/// Everything `advance_to_closing` takes besides caller and channel.
#[derive(Debug, Clone)]
pub struct ClosingSubmission {
    /// Transition chain from the initial root.
    pub proofs: Vec<TransitionProof>,
    /// Root the chain ends at.
    pub final_root: Hash,
    /// Group signature over the closing message.
    pub signature: ThresholdSignature,
}

// =============================================================================
// HARNESS
// =============================================================================

/// Bridge plus handles on every in-memory adapter.
pub struct Harness {
    /// Service under test.
    pub bridge: InMemoryBridge,
    /// Token balances and allowances.
    pub tokens: Arc<InMemoryTokenLedger>,
    /// Time source.
    pub clock: Arc<ManualClock>,
    /// Block context source.
    pub context: Arc<FixedBlockContext>,
    /// Published events.
    pub events: Arc<InMemoryEventLog>,
    prover: DigestProver,
}

impl Harness {
    /// Harness over [`Harness::default_config`].
    pub fn new() -> Result<Self, ChannelError> {
        Self::with_config(Self::default_config())
    }

    /// Configuration with the harness accounts and both channel tokens.
    pub fn default_config() -> BridgeConfig {
        BridgeConfig::default()
            .with_owner(OWNER)
            .with_treasury(TREASURY)
            .with_vault(VAULT)
            .with_bond(BOND_TOKEN, HARNESS_BOND)
            .with_supported_tokens(vec![TOKEN_A, TOKEN_B])
    }

    /// Harness over a custom configuration.
    pub fn with_config(config: BridgeConfig) -> Result<Self, ChannelError> {
        let tokens = Arc::new(InMemoryTokenLedger::new());
        let clock = Arc::new(ManualClock::default());
        let context = Arc::new(FixedBlockContext::default());
        let events = Arc::new(InMemoryEventLog::new());
        let gate = ProofGate::digest_reference(Arc::new(SchnorrSignerRecovery));
        let bridge = ChannelBridgeService::new(
            config,
            gate,
            Arc::clone(&tokens),
            Arc::clone(&clock),
            context.clone(),
            events.clone(),
        )?;
        Ok(Self {
            bridge,
            tokens,
            clock,
            context,
            events,
            prover: DigestProver::new(),
        })
    }

    /// Mint `amount` to `account` and approve the vault for it.
    pub fn fund(&self, token: TokenId, account: Address, amount: Amount) {
        self.tokens.mint(token, account, amount);
        self.tokens.approve(token, account, VAULT, amount);
    }

    /// Register [`transfer_circuit`] as the owner.
    pub fn register_transfer_circuit(&self) -> Result<FunctionEntry, ChannelError> {
        let entry = transfer_circuit();
        self.bridge.register_function(OWNER, entry.clone())?;
        Ok(entry)
    }

    /// Fund the leader's bond, deal keys and open a channel.
    pub fn open_channel(
        &self,
        leader: Address,
        members: &[Address],
        tokens: &[TokenId],
        timeout: u64,
    ) -> Result<(ChannelId, ChannelKeys), ScenarioError> {
        let config = self.bridge.config();
        self.fund(config.bond_token, leader, config.leader_bond);
        let keys = ChannelKeys::deal(members.len())?;
        let id = self.bridge.open_channel(
            leader,
            OpenChannelRequest {
                tokens: tokens.to_vec(),
                participants: members.to_vec(),
                timeout,
                group_key: keys.group_key(),
            },
        )?;
        Ok((id, keys))
    }

    /// Fund and deposit `amount` of `token` for `participant`, recording
    /// [`key_for`] as its key.
    pub fn deposit(
        &self,
        channel: ChannelId,
        token: TokenId,
        participant: Address,
        amount: Amount,
    ) -> Result<Amount, ChannelError> {
        self.fund(token, participant, amount);
        let key = self
            .bridge
            .off_ledger_key(channel, &token, &participant)
            .map_or_else(|| Some(key_for(&token, &participant)), |_| None);
        self.bridge.deposit(participant, channel, token, amount, key)
    }

    /// Balance-tree commitment over recorded keys and `balances`
    /// (token-major, one row per token).
    pub fn commitment(&self, channel: ChannelId, balances: &[Vec<Amount>]) -> Result<StateCommitment, ScenarioError> {
        let snapshot = self.bridge.channel(channel)?;
        let leaves: Vec<(FieldElement, FieldElement)> = snapshot
            .allowed_tokens
            .iter()
            .zip(balances)
            .flat_map(|(token, row)| {
                snapshot.participants.iter().zip(row).map(move |(p, amount)| (token, p, *amount))
            })
            .map(|(token, p, amount)| {
                let key = self.bridge.off_ledger_key(channel, token, p).unwrap_or_default();
                (FieldElement::new(key), FieldElement::from_u128(amount))
            })
            .collect();
        Ok(StateCommitment::commit(snapshot.required_tree_size, &leaves)?)
    }

    /// Recorded deposits as one row per token.
    pub fn deposit_rows(&self, channel: ChannelId) -> Result<Vec<Vec<Amount>>, ChannelError> {
        let snapshot = self.bridge.channel(channel)?;
        Ok(snapshot
            .allowed_tokens
            .iter()
            .map(|token| {
                snapshot
                    .participants
                    .iter()
                    .map(|p| self.bridge.deposit_of(channel, token, p))
                    .collect()
            })
            .collect())
    }

    /// Initialization proof over the recorded deposits.
    pub fn initialization_proof(&self, channel: ChannelId) -> Result<InitializationProof, ScenarioError> {
        let snapshot = self.bridge.channel(channel)?;
        let rows = self.deposit_rows(channel)?;
        let commitment = self.commitment(channel, &rows)?;
        let merkle_root = hash_to_u256(commitment.root());
        let signals = tree_signals(
            snapshot.required_tree_size,
            merkle_root,
            &self.cell_keys(channel)?,
            &rows.concat(),
        );
        Ok(InitializationProof {
            merkle_root,
            proof: self.prover.prove(snapshot.required_tree_size, &signals),
        })
    }

    /// Chain of transitions through `roots`, starting at the channel's
    /// initial root. The last root is the claimed final root.
    pub fn transition_chain(&self, channel: ChannelId, roots: &[Hash]) -> Result<Vec<TransitionProof>, ScenarioError> {
        let snapshot = self.bridge.channel(channel)?;
        let entry = self
            .bridge
            .function(&TRANSFER_SELECTOR)
            .ok_or(ChannelError::FunctionNotRegistered(TRANSFER_SELECTOR))?;
        let mut input_root = snapshot.initial_state_root.unwrap_or(ZERO_HASH);
        let context = snapshot.block_context_hash.unwrap_or(ZERO_HASH);

        let mut proofs = Vec::with_capacity(roots.len());
        for (step, output_root) in roots.iter().enumerate() {
            let inputs = TransitionInputs {
                input_root,
                output_root: *output_root,
                selector: entry.selector,
                context,
                instance: entry.instance_hash,
            };
            proofs.push(self.prover.prove_transition(
                entry.selector,
                &entry.vk_part1,
                &entry.vk_part2,
                inputs.encode(),
                step as u64,
            ));
            input_root = *output_root;
        }
        Ok(proofs)
    }

    /// Single-link chain to the commitment of `final_balances`, signed by
    /// the group.
    pub fn closing_submission(
        &self,
        channel: ChannelId,
        keys: &ChannelKeys,
        final_balances: &[Vec<Amount>],
    ) -> Result<ClosingSubmission, ScenarioError> {
        let final_root = *self.commitment(channel, final_balances)?.root();
        Ok(ClosingSubmission {
            proofs: self.transition_chain(channel, &[final_root])?,
            final_root,
            signature: keys.sign_closing(channel, &final_root)?,
        })
    }

    /// Conservation proof of `final_balances` against the accepted final root.
    pub fn conservation_proof(
        &self,
        channel: ChannelId,
        final_balances: &[Vec<Amount>],
    ) -> Result<ConservationProof, ScenarioError> {
        let snapshot = self.bridge.channel(channel)?;
        let final_root = snapshot.final_state_root.unwrap_or(ZERO_HASH);
        let signals = tree_signals(
            snapshot.required_tree_size,
            FieldElement::from_hash(&final_root).value(),
            &self.cell_keys(channel)?,
            &final_balances.concat(),
        );
        Ok(ConservationProof {
            final_balances: final_balances.to_vec(),
            proof: self.prover.prove(snapshot.required_tree_size, &signals),
        })
    }

    /// Drive an `Initialized` channel through to `Closed` with
    /// `final_balances`, advancing the clock past the timeout.
    pub fn settle(
        &self,
        channel: ChannelId,
        keys: &ChannelKeys,
        final_balances: &[Vec<Amount>],
    ) -> Result<(), ScenarioError> {
        let snapshot = self.bridge.channel(channel)?;
        let leader = snapshot.leader;
        let proof = self.initialization_proof(channel)?;
        self.bridge.initialize_state(leader, channel, proof)?;

        self.clock.set_time(snapshot.timeout_at());
        let submission = self.closing_submission(channel, keys, final_balances)?;
        self.bridge.advance_to_closing(
            leader,
            channel,
            submission.proofs,
            submission.final_root,
            submission.signature,
        )?;

        let proof = self.conservation_proof(channel, final_balances)?;
        self.bridge.finalize_close(leader, channel, proof)?;
        Ok(())
    }

    fn cell_keys(&self, channel: ChannelId) -> Result<Vec<U256>, ChannelError> {
        let snapshot = self.bridge.channel(channel)?;
        Ok(snapshot
            .allowed_tokens
            .iter()
            .flat_map(|token| {
                snapshot
                    .participants
                    .iter()
                    .map(move |p| self.bridge.off_ledger_key(channel, token, p).unwrap_or_default())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::recover_signer;

    #[test]
    fn test_keys_sign_with_majority() {
        let keys = ChannelKeys::deal(5).unwrap();
        let message = [0x5A; 32];
        let signature = keys.sign(&message).unwrap();
        assert_eq!(
            recover_signer(&message, &keys.group_key(), &signature).unwrap(),
            keys.group_key().address()
        );
    }

    #[test]
    fn test_key_for_is_nonzero_and_distinct() {
        let a = key_for(&TOKEN_A, &LEADER);
        let b = key_for(&TOKEN_B, &LEADER);
        assert!(!a.is_zero());
        assert_ne!(a, b);
    }

    #[test]
    fn test_participants_skip_leader() {
        let members = participants(3);
        assert_eq!(members.len(), 3);
        assert!(!members.contains(&LEADER));
    }

    #[test]
    fn test_transfer_circuit_selector_matches() {
        assert_eq!(transfer_circuit().selector, TRANSFER_SELECTOR);
    }
}
