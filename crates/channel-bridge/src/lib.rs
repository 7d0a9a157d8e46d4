//! # Channel Bridge
//!
//! Multi-party state channels with proof-gated settlement.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Participants lock tokens under a bonded leader, transact off-ledger and
//! settle by proving that the final balances conserve the deposits:
//!
//! 1. `open_channel` posts the leader bond and claims leadership
//! 2. participants `deposit` with an off-ledger key per token
//! 3. `initialize_state` proves the deposit tree (`Initialized -> Open`)
//! 4. after the timeout, `advance_to_closing` checks the transition chain and
//!    the group signature (`-> Closing`)
//! 5. `finalize_close` checks conservation (`-> Closed`); participants
//!    `withdraw`, the leader reclaims the bond after the dispute window
//!
//! A leader that misses `open + timeout + grace` is slashed by any
//! participant and deposits become claimable through `emergency_withdraw`.
//! An upheld dispute does the same for a settled channel.
//!
//! ## Security Properties
//!
//! | Property | Enforced by |
//! |----------|-------------|
//! | Single leadership | `security::EconomicSecurity` |
//! | Conservation | `domain::invariant_conservation` + conservation proof |
//! | Chain continuity | `proof_gate::ProofGate::verify_transition_chain` |
//! | No double withdrawal | `ledger::DepositLedger` flags |
//! | Bond slashed at most once | `security::EconomicSecurity::slash` |
//!
//! ## Module Structure
//!
//! ```text
//! channel-bridge/
//! ├── domain/       # Channel, config, errors, invariants
//! ├── ledger/       # Deposits, keys, withdrawable and emergency cells
//! ├── proof_gate/   # Public inputs, function registry, verifier dispatch
//! ├── security/     # Leadership registry, slashing, treasury pool
//! ├── dispute/      # Dispute book
//! ├── ports/        # ChannelBridgeApi, TokenGateway, TimeSource, ...
//! ├── adapters/     # In-memory and tracing implementations
//! ├── service/      # ChannelBridgeService
//! └── scenario      # In-memory harness and reference prover side
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod dispute;
pub mod domain;
pub mod events;
pub mod ledger;
pub mod metrics;
pub mod ports;
pub mod proof_gate;
pub mod scenario;
pub mod security;
pub mod service;

// Re-exports
pub use adapters::{
    FixedBlockContext, InMemoryEventLog, InMemoryTokenLedger, ManualClock, SchnorrSignerRecovery,
    SystemTimeSource, TracingEventPublisher,
};
pub use domain::{
    determine_tree_size, invariant_conservation, BlockContext, BondStatus, BridgeConfig, Channel,
    ChannelError, ChannelId, ChannelState, ClosePath, ConfigError, ConservationProof, Dispute,
    DisputeId, DisputeStatus, FailureClass, FunctionEntry, FunctionSelector, InitializationProof,
    OpenChannelRequest, WithdrawalPath,
};
pub use events::ChannelEvent;
pub use ports::{
    BlockContextProvider, ChannelBridgeApi, EventPublisher, SignerRecovery, TimeSource,
    TokenGateway,
};
pub use proof_gate::{ProofGate, VerifierSet};
pub use service::ChannelBridgeService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
