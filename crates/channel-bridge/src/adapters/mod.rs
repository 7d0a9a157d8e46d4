//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implementations of the outbound ports. The in-memory ones double as test
//! doubles and back the `bridge-sim` binary.

mod clock;
mod event_log;
mod signer;
mod token_ledger;

pub use clock::{FixedBlockContext, ManualClock, SystemTimeSource};
pub use event_log::{InMemoryEventLog, TracingEventPublisher};
pub use signer::SchnorrSignerRecovery;
pub use token_ledger::InMemoryTokenLedger;
