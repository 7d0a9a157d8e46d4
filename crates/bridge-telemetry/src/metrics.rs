//! Prometheus metrics for the channel bridge.
//!
//! All metrics follow the naming convention: `bridge_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., channels_opened_total)
//! - **Gauge**: Value that can go up or down (e.g., channels_live)
//! - **Histogram**: Distribution of values (e.g., proof_verification_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // LIFECYCLE METRICS
    // =========================================================================

    /// Channels opened
    pub static ref CHANNELS_OPENED: Counter = Counter::new(
        "bridge_channels_opened_total",
        "Total number of channels opened"
    ).expect("metric creation failed");

    /// Channels closed, by path
    pub static ref CHANNELS_CLOSED: CounterVec = CounterVec::new(
        Opts::new("bridge_channels_closed_total", "Channels reaching Closed"),
        &["path"]  // path: settled/timeout/dispute
    ).expect("metric creation failed");

    /// Channels not yet closed
    pub static ref CHANNELS_LIVE: Gauge = Gauge::new(
        "bridge_channels_live",
        "Number of channels not yet closed"
    ).expect("metric creation failed");

    // =========================================================================
    // LEDGER METRICS
    // =========================================================================

    /// Deposits credited
    pub static ref DEPOSITS: Counter = Counter::new(
        "bridge_deposits_total",
        "Total number of deposits credited"
    ).expect("metric creation failed");

    /// Withdrawals paid, by path
    pub static ref WITHDRAWALS: CounterVec = CounterVec::new(
        Opts::new("bridge_withdrawals_total", "Withdrawals paid out"),
        &["path"]  // path: normal/emergency
    ).expect("metric creation failed");

    // =========================================================================
    // PROOF METRICS
    // =========================================================================

    /// Proof verifications by kind and result
    pub static ref PROOF_VERIFICATIONS: CounterVec = CounterVec::new(
        Opts::new("bridge_proof_verifications_total", "Proof verifications"),
        &["kind", "result"]  // kind: initialization/transition/conservation/signature
    ).expect("metric creation failed");

    /// Proof verification latency
    pub static ref PROOF_VERIFICATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "bridge_proof_verification_duration_seconds",
            "Time spent in verifier oracles"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).unwrap_or_default()),
        &["kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // SECURITY METRICS
    // =========================================================================

    /// Leader bonds slashed
    pub static ref BONDS_SLASHED: Counter = Counter::new(
        "bridge_bonds_slashed_total",
        "Total number of leader bonds slashed"
    ).expect("metric creation failed");

    /// Disputes by status transition
    pub static ref DISPUTES: CounterVec = CounterVec::new(
        Opts::new("bridge_disputes_total", "Dispute status transitions"),
        &["status"]  // status: raised/resolved/rejected
    ).expect("metric creation failed");

    /// Treasury sweeps
    pub static ref TREASURY_SWEEPS: Counter = Counter::new(
        "bridge_treasury_sweeps_total",
        "Total number of treasury pool sweeps"
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Rejected operations by error class
    pub static ref OPERATION_ERRORS: CounterVec = CounterVec::new(
        Opts::new("bridge_operation_errors_total", "Rejected operations by class"),
        &["operation", "class"]
    ).expect("metric creation failed");
}

/// Handle proving metrics were registered.
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    registered: usize,
}

impl MetricsHandle {
    /// Number of collectors newly registered by this call.
    pub fn registered(&self) -> usize {
        self.registered
    }
}

/// Register all metrics with the global registry.
///
/// Safe to call repeatedly; collectors already present are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Lifecycle
        Box::new(CHANNELS_OPENED.clone()),
        Box::new(CHANNELS_CLOSED.clone()),
        Box::new(CHANNELS_LIVE.clone()),
        // Ledger
        Box::new(DEPOSITS.clone()),
        Box::new(WITHDRAWALS.clone()),
        // Proofs
        Box::new(PROOF_VERIFICATIONS.clone()),
        Box::new(PROOF_VERIFICATION_DURATION.clone()),
        // Security
        Box::new(BONDS_SLASHED.clone()),
        Box::new(DISPUTES.clone()),
        Box::new(TREASURY_SWEEPS.clone()),
        // Errors
        Box::new(OPERATION_ERRORS.clone()),
    ];

    let mut registered = 0;
    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) => registered += 1,
            Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { registered })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
