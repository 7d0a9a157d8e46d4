//! # Domain Errors
//!
//! One error enum for every rejected bridge operation. Each variant maps onto a
//! [`FailureClass`] so callers can tell "retry later or with corrected input"
//! apart from "this will never succeed".

use super::config::ConfigError;
use super::value_objects::{ChannelId, ChannelState, DisputeId};
use bridge_zkp::TreeSize;
use shared_types::{short_hex, Address, Amount, Timestamp, TokenId};
use thiserror::Error;

/// Failure taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Malformed or out-of-range input.
    Validation,
    /// Caller lacks the required role.
    Authorization,
    /// A proof or signature did not verify.
    Proof,
    /// Final balances do not conserve deposits.
    Conservation,
    /// Too early or too late.
    Timing,
    /// The action already happened.
    Idempotency,
    /// A collaborator (token gateway) failed.
    External,
}

impl FailureClass {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::Proof => "proof",
            Self::Conservation => "conservation",
            Self::Timing => "timing",
            Self::Idempotency => "idempotency",
            Self::External => "external",
        }
    }
}

/// Channel bridge error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    // =========================================================================
    // VALIDATION
    // =========================================================================
    /// Unknown channel.
    #[error("Channel not found: {0}")]
    ChannelNotFound(ChannelId),

    /// Operation not allowed in the channel's current state.
    #[error("Channel {channel} is {actual}, expected {expected}")]
    InvalidState {
        /// Channel
        channel: ChannelId,
        /// Accepted state(s)
        expected: &'static str,
        /// Current state
        actual: ChannelState,
    },

    /// Token list empty or too long.
    #[error("Invalid token count {count} (allowed 1..={max})")]
    InvalidTokenCount {
        /// Supplied
        count: usize,
        /// Limit
        max: usize,
    },

    /// Token not accepted by the bridge.
    #[error("Token not supported: {}", short_hex(.0))]
    UnsupportedToken(TokenId),

    /// Participant count outside bounds.
    #[error("Invalid participant count {count} (allowed {min}..={max})")]
    InvalidParticipantCount {
        /// Supplied
        count: usize,
        /// Lower bound
        min: usize,
        /// Upper bound
        max: usize,
    },

    /// More leaves than the largest circuit.
    #[error("Capacity exceeded: {participants} participants x {tokens} tokens > {max} leaves")]
    CapacityExceeded {
        /// Participants
        participants: usize,
        /// Tokens
        tokens: usize,
        /// Largest tree
        max: usize,
    },

    /// Timeout outside bounds.
    #[error("Invalid timeout {timeout}s (allowed {min}..={max})")]
    InvalidTimeout {
        /// Supplied seconds
        timeout: u64,
        /// Lower bound
        min: u64,
        /// Upper bound
        max: u64,
    },

    /// Token listed twice.
    #[error("Duplicate token: {}", short_hex(.0))]
    DuplicateToken(TokenId),

    /// Participant listed twice.
    #[error("Duplicate participant: {}", short_hex(.0))]
    DuplicateParticipant(Address),

    /// Group public key is not a curve point.
    #[error("Invalid group public key")]
    InvalidGroupKey,

    /// Token not in the channel's allowed set.
    #[error("Token {} not allowed in channel {channel}", short_hex(.token))]
    TokenNotAllowed {
        /// Channel
        channel: ChannelId,
        /// Token
        token: TokenId,
    },

    /// Zero-amount deposit.
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Deposit without a recorded off-ledger key.
    #[error("No off-ledger key for participant {} and token {}", short_hex(.participant), short_hex(.token))]
    MissingKey {
        /// Token
        token: TokenId,
        /// Participant
        participant: Address,
    },

    /// Zero off-ledger key.
    #[error("Off-ledger key must be nonzero")]
    ZeroKey,

    /// Key already used by another participant for the same token.
    #[error("Off-ledger key already in use for token {}", short_hex(.token))]
    DuplicateKey {
        /// Token
        token: TokenId,
    },

    /// Deposit moved nothing into the vault.
    #[error("No tokens transferred")]
    NoTokensTransferred,

    /// Vault allowance does not cover the pull.
    #[error("Allowance {available} of {} below {required}", short_hex(.token))]
    InsufficientAllowance {
        /// Token
        token: TokenId,
        /// Amount to pull
        required: Amount,
        /// Approved amount
        available: Amount,
    },

    /// Bond pull delivered less than the configured bond.
    #[error("Leader bond short: required {required}, received {received}")]
    InsufficientBond {
        /// Configured bond
        required: Amount,
        /// Amount that reached the vault
        received: Amount,
    },

    /// Final balance matrix does not match the channel shape.
    #[error("Balance matrix {tokens}x{participants}, expected {expected_tokens}x{expected_participants}")]
    BalanceShapeMismatch {
        /// Channel tokens
        expected_tokens: usize,
        /// Channel participants
        expected_participants: usize,
        /// Supplied rows
        tokens: usize,
        /// Supplied columns (first mismatching row)
        participants: usize,
    },

    /// Evidence empty or oversized.
    #[error("Invalid evidence length {len} (allowed 1..={max})")]
    InvalidEvidence {
        /// Supplied bytes
        len: usize,
        /// Limit
        max: usize,
    },

    /// Unknown dispute.
    #[error("Dispute not found: {0}")]
    DisputeNotFound(DisputeId),

    /// Preprocessed verifier parameters missing.
    #[error("Verifier parameters must not be empty")]
    EmptyVerifierParameters,

    /// Zero address where an account is required.
    #[error("Zero address not allowed for {0}")]
    ZeroAddress(&'static str),

    /// Normal withdrawal attempted on an emergency-closed channel.
    #[error("Channel {0} is in emergency mode")]
    EmergencyActive(ChannelId),

    /// Emergency withdrawal attempted on a normally closed channel.
    #[error("Channel {0} is not in emergency mode")]
    NotInEmergency(ChannelId),

    /// Nothing owed to the caller.
    #[error("Nothing to withdraw")]
    NothingToWithdraw,

    /// Treasury pool is empty.
    #[error("Treasury pool is empty")]
    EmptyTreasury,

    /// Amount arithmetic overflowed.
    #[error("Amount overflow")]
    AmountOverflow,

    /// Invalid bridge configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // =========================================================================
    // AUTHORIZATION
    // =========================================================================
    /// Caller already leads a live channel.
    #[error("{} already leads channel {channel}", short_hex(.leader))]
    AlreadyLeading {
        /// Leader
        leader: Address,
        /// Live channel
        channel: ChannelId,
    },

    /// Caller is not the channel leader.
    #[error("{} is not the leader of channel {channel}", short_hex(.caller))]
    NotLeader {
        /// Channel
        channel: ChannelId,
        /// Caller
        caller: Address,
    },

    /// Caller is not a channel participant.
    #[error("{} is not a participant of channel {channel}", short_hex(.caller))]
    NotParticipant {
        /// Channel
        channel: ChannelId,
        /// Caller
        caller: Address,
    },

    /// Caller is not the bridge owner.
    #[error("{} is not the bridge owner", short_hex(.0))]
    NotOwner(Address),

    /// Leaders cannot accuse themselves.
    #[error("Leader cannot raise a dispute")]
    LeaderCannotDispute,

    // =========================================================================
    // PROOF
    // =========================================================================
    /// Initialization proof rejected by the oracle.
    #[error("Initialization proof rejected")]
    InitProofRejected,

    /// Conservation proof rejected by the oracle.
    #[error("Conservation proof rejected")]
    ConservationProofRejected,

    /// Transition proof rejected by the oracle.
    #[error("Transition proof {index} rejected")]
    TransitionProofRejected {
        /// Position in the chain
        index: usize,
    },

    /// Proof count outside `1..=max`.
    #[error("Invalid proof count {count} (allowed 1..={max})")]
    InvalidProofCount {
        /// Supplied
        count: usize,
        /// Limit
        max: usize,
    },

    /// Public inputs too short or malformed.
    #[error("Malformed public inputs in transition proof {index}: {reason}")]
    MalformedPublicInputs {
        /// Position in the chain
        index: usize,
        /// Detail
        reason: String,
    },

    /// First transition does not start from the initial root.
    #[error("Transition chain does not start at the initial state root")]
    InitialRootMismatch,

    /// A link's input differs from the previous output.
    #[error("Transition chain broken at proof {index}")]
    ChainDiscontinuity {
        /// Position in the chain
        index: usize,
    },

    /// Last output differs from the claimed final root.
    #[error("Transition chain does not end at the claimed final root")]
    FinalRootMismatch,

    /// Block context commitment differs from the channel's.
    #[error("Block context mismatch in transition proof {index}")]
    ContextMismatch {
        /// Position in the chain
        index: usize,
    },

    /// Instance commitment differs from the registry entry.
    #[error("Instance commitment mismatch in transition proof {index}")]
    InstanceMismatch {
        /// Position in the chain
        index: usize,
    },

    /// Selector not registered.
    #[error("Function not registered: 0x{}", hex::encode(.0))]
    FunctionNotRegistered([u8; 4]),

    /// Threshold signature did not recover the channel signer.
    #[error("Threshold signature rejected")]
    SignatureRejected,

    /// No verifier compiled for the tree size.
    #[error("No verifier for tree size {0}")]
    VerifierUnavailable(TreeSize),

    /// Public signal vector has the wrong arity.
    #[error("Expected {expected} public signals, got {actual}")]
    SignalLengthMismatch {
        /// Circuit arity
        expected: usize,
        /// Built arity
        actual: usize,
    },

    // =========================================================================
    // CONSERVATION
    // =========================================================================
    /// Column sum differs from total deposits.
    #[error("Conservation violated for token {}: deposited {expected}, claimed {actual}", short_hex(.token))]
    ConservationViolated {
        /// Token
        token: TokenId,
        /// Total deposits
        expected: Amount,
        /// Sum of final balances
        actual: Amount,
    },

    // =========================================================================
    // TIMING
    // =========================================================================
    /// Channel timeout has not elapsed.
    #[error("Channel timeout not reached: now {now}, earliest {earliest}")]
    TimeoutNotReached {
        /// Current time
        now: Timestamp,
        /// First accepted time
        earliest: Timestamp,
    },

    /// Settlement deadline has passed.
    #[error("Settlement deadline passed: now {now}, deadline {deadline}")]
    DeadlinePassed {
        /// Current time
        now: Timestamp,
        /// Deadline
        deadline: Timestamp,
    },

    /// Settlement deadline still running.
    #[error("Settlement deadline not reached: now {now}, deadline {deadline}")]
    DeadlineNotReached {
        /// Current time
        now: Timestamp,
        /// Deadline
        deadline: Timestamp,
    },

    /// Dispute window has closed.
    #[error("Dispute window closed at {closed_at}")]
    DisputeWindowClosed {
        /// End of window
        closed_at: Timestamp,
    },

    /// Dispute window still open.
    #[error("Dispute window open until {until}")]
    DisputeWindowOpen {
        /// End of window
        until: Timestamp,
    },

    /// Dispute older than the dispute timeout.
    #[error("Dispute {0} has expired")]
    DisputeExpired(DisputeId),

    /// A dispute is pending on the channel.
    #[error("Dispute pending on channel {0}")]
    PendingDispute(ChannelId),

    /// Cleanup cooldown still running.
    #[error("Cleanup cooldown until {until}")]
    CleanupCooldown {
        /// First purge time
        until: Timestamp,
    },

    /// Withdrawable or emergency amounts remain.
    #[error("Channel {0} has unclaimed funds")]
    UnclaimedFunds(ChannelId),

    /// Bond neither slashed nor reclaimed.
    #[error("Bond of channel {0} not settled")]
    BondUnsettled(ChannelId),

    // =========================================================================
    // IDEMPOTENCY
    // =========================================================================
    /// Cell already withdrawn.
    #[error("Already withdrawn")]
    AlreadyWithdrawn,

    /// Participant already used the emergency exit.
    #[error("Already emergency-withdrawn")]
    AlreadyEmergencyWithdrawn,

    /// Bond slashed before.
    #[error("Bond already slashed")]
    BondAlreadySlashed,

    /// Bond reclaimed before.
    #[error("Bond already reclaimed")]
    BondAlreadyReclaimed,

    /// Accuser already has a pending dispute.
    #[error("Duplicate dispute")]
    DuplicateDispute,

    /// Dispute already decided.
    #[error("Dispute {0} is not pending")]
    DisputeNotPending(DisputeId),

    /// Selector registered before.
    #[error("Function already registered: 0x{}", hex::encode(.0))]
    FunctionAlreadyRegistered([u8; 4]),

    // =========================================================================
    // EXTERNAL
    // =========================================================================
    /// Token transfer failed.
    #[error("Token transfer failed: {0}")]
    TransferFailed(String),

    /// Token gateway query failed.
    #[error("Token gateway error: {0}")]
    Gateway(String),
}

impl ChannelError {
    /// Taxonomy class of this error.
    pub fn class(&self) -> FailureClass {
        use ChannelError::*;
        match self {
            ChannelNotFound(_)
            | InvalidState { .. }
            | InvalidTokenCount { .. }
            | UnsupportedToken(_)
            | InvalidParticipantCount { .. }
            | CapacityExceeded { .. }
            | InvalidTimeout { .. }
            | DuplicateToken(_)
            | DuplicateParticipant(_)
            | InvalidGroupKey
            | TokenNotAllowed { .. }
            | ZeroAmount
            | MissingKey { .. }
            | ZeroKey
            | DuplicateKey { .. }
            | NoTokensTransferred
            | InsufficientAllowance { .. }
            | InsufficientBond { .. }
            | BalanceShapeMismatch { .. }
            | InvalidEvidence { .. }
            | DisputeNotFound(_)
            | EmptyVerifierParameters
            | ZeroAddress(_)
            | EmergencyActive(_)
            | NotInEmergency(_)
            | NothingToWithdraw
            | EmptyTreasury
            | AmountOverflow
            | Config(_) => FailureClass::Validation,

            AlreadyLeading { .. }
            | NotLeader { .. }
            | NotParticipant { .. }
            | NotOwner(_)
            | LeaderCannotDispute => FailureClass::Authorization,

            InitProofRejected
            | ConservationProofRejected
            | TransitionProofRejected { .. }
            | InvalidProofCount { .. }
            | MalformedPublicInputs { .. }
            | InitialRootMismatch
            | ChainDiscontinuity { .. }
            | FinalRootMismatch
            | ContextMismatch { .. }
            | InstanceMismatch { .. }
            | FunctionNotRegistered(_)
            | SignatureRejected
            | VerifierUnavailable(_)
            | SignalLengthMismatch { .. } => FailureClass::Proof,

            ConservationViolated { .. } => FailureClass::Conservation,

            TimeoutNotReached { .. }
            | DeadlinePassed { .. }
            | DeadlineNotReached { .. }
            | DisputeWindowClosed { .. }
            | DisputeWindowOpen { .. }
            | DisputeExpired(_)
            | PendingDispute(_)
            | CleanupCooldown { .. }
            | UnclaimedFunds(_)
            | BondUnsettled(_) => FailureClass::Timing,

            AlreadyWithdrawn
            | AlreadyEmergencyWithdrawn
            | BondAlreadySlashed
            | BondAlreadyReclaimed
            | DuplicateDispute
            | DisputeNotPending(_)
            | FunctionAlreadyRegistered(_) => FailureClass::Idempotency,

            TransferFailed(_) | Gateway(_) => FailureClass::External,
        }
    }

    /// Whether the same call may succeed later or with corrected input.
    ///
    /// Proof and conservation failures leave the channel where it was, so the
    /// leader can resubmit. Timing errors clear with the clock, external ones
    /// with the collaborator. Closed windows never reopen.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChannelError::DeadlinePassed { .. }
            | ChannelError::DisputeWindowClosed { .. }
            | ChannelError::DisputeExpired(_) => false,
            other => matches!(
                other.class(),
                FailureClass::Proof
                    | FailureClass::Conservation
                    | FailureClass::Timing
                    | FailureClass::External
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::address_from_byte;

    #[test]
    fn test_capacity_error_message() {
        let err = ChannelError::CapacityExceeded {
            participants: 65,
            tokens: 2,
            max: 128,
        };
        assert!(err.to_string().contains("65 participants x 2 tokens"));
        assert_eq!(err.class(), FailureClass::Validation);
    }

    #[test]
    fn test_addresses_render_as_short_hex() {
        let err = ChannelError::NotOwner(address_from_byte(0xAB));
        assert!(err.to_string().starts_with("0xabab..abab"));
    }

    #[test]
    fn test_conservation_is_retryable() {
        let err = ChannelError::ConservationViolated {
            token: address_from_byte(1),
            expected: 30,
            actual: 31,
        };
        assert_eq!(err.class(), FailureClass::Conservation);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_idempotency_guards_never_retry() {
        for err in [
            ChannelError::AlreadyWithdrawn,
            ChannelError::BondAlreadySlashed,
            ChannelError::DuplicateDispute,
            ChannelError::AlreadyEmergencyWithdrawn,
        ] {
            assert_eq!(err.class(), FailureClass::Idempotency);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_closed_windows_never_retry() {
        let err = ChannelError::DeadlinePassed {
            now: 10,
            deadline: 5,
        };
        assert_eq!(err.class(), FailureClass::Timing);
        assert!(!err.is_retryable());
        assert!(ChannelError::DeadlineNotReached { now: 5, deadline: 10 }.is_retryable());
    }

    #[test]
    fn test_selector_renders_hex() {
        let err = ChannelError::FunctionNotRegistered([0xde, 0xad, 0xbe, 0xef]);
        assert!(err.to_string().contains("0xdeadbeef"));
        assert_eq!(err.class(), FailureClass::Proof);
    }
}
