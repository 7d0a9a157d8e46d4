//! # Bridge Metrics
//!
//! Recording functions over the Prometheus statics in `bridge-telemetry`.
//! Collectors exist whether or not they were registered, so recording is
//! always safe; export requires `bridge_telemetry::register_metrics`.
//!
//! ## Metrics Recorded
//!
//! - `bridge_channels_opened_total` / `bridge_channels_live`
//! - `bridge_channels_closed_total{path}`
//! - `bridge_deposits_total`, `bridge_withdrawals_total{path}`
//! - `bridge_proof_verifications_total{kind,result}` and latency histogram
//! - `bridge_bonds_slashed_total`, `bridge_disputes_total{status}`
//! - `bridge_treasury_sweeps_total`
//! - `bridge_operation_errors_total{operation,class}`

use crate::domain::{ChannelError, ClosePath, DisputeStatus, WithdrawalPath};
use bridge_telemetry::metrics as m;
use bridge_telemetry::{metric_inc, metric_observe};
use std::time::Duration;

/// Proof kinds checked by the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProofKind {
    /// Deposit tree proof.
    Initialization,
    /// One link of a transition chain.
    Transition,
    /// Final balance proof.
    Conservation,
    /// Group signature over the final root.
    Signature,
}

impl ProofKind {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialization => "initialization",
            Self::Transition => "transition",
            Self::Conservation => "conservation",
            Self::Signature => "signature",
        }
    }
}

/// Record a channel opening.
pub fn record_channel_opened() {
    m::CHANNELS_OPENED.inc();
    m::CHANNELS_LIVE.inc();
}

/// Record a channel reaching `Closed`.
pub fn record_channel_closed(path: ClosePath) {
    m::CHANNELS_CLOSED.with_label_values(&[path.as_str()]).inc();
    m::CHANNELS_LIVE.dec();
}

/// Record a credited deposit.
pub fn record_deposit() {
    metric_inc!(m::DEPOSITS);
}

/// Record a payout.
pub fn record_withdrawal(path: WithdrawalPath) {
    metric_inc!(m::WITHDRAWALS, &[path.as_str()]);
}

/// Record an oracle verdict and its latency.
pub fn record_proof(kind: ProofKind, accepted: bool, elapsed: Duration) {
    let result = if accepted { "accepted" } else { "rejected" };
    metric_inc!(m::PROOF_VERIFICATIONS, &[kind.as_str(), result]);
    metric_observe!(m::PROOF_VERIFICATION_DURATION, &[kind.as_str()], elapsed.as_secs_f64());
}

/// Record a slashed bond.
pub fn record_bond_slashed() {
    m::BONDS_SLASHED.inc();
}

/// Record a dispute status change.
pub fn record_dispute(status: DisputeStatus) {
    let label = match status {
        DisputeStatus::Raised => "raised",
        DisputeStatus::Resolved => "resolved",
        DisputeStatus::Rejected => "rejected",
    };
    metric_inc!(m::DISPUTES, &[label]);
}

/// Record a treasury sweep.
pub fn record_treasury_sweep() {
    m::TREASURY_SWEEPS.inc();
}

/// Record a rejected operation.
pub fn record_error(operation: &str, error: &ChannelError) {
    m::OPERATION_ERRORS
        .with_label_values(&[operation, error.class().as_str()])
        .inc();
}
