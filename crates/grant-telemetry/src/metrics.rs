//! Prometheus metrics for grant operations.
//!
//! All metrics follow the naming convention: `grant_<subject>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Invocations by operation name and outcome (success/failure)
    pub static ref OPERATIONS: CounterVec = CounterVec::new(
        Opts::new("grant_operations_total", "Grant operations by outcome"),
        &["operation", "outcome"]
    ).expect("metric creation failed");

    /// Failed invocations by operation name and error kind
    pub static ref OPERATION_FAILURES: CounterVec = CounterVec::new(
        Opts::new("grant_operation_failures_total", "Failed grant operations by error kind"),
        &["operation", "kind"]
    ).expect("metric creation failed");

    /// Reimbursement requests refused by the budget check
    pub static ref ADMISSION_REJECTIONS: CounterVec = CounterVec::new(
        Opts::new("grant_admission_rejections_total", "Reimbursements refused by budget ceilings"),
        &["tier"]  // tier: main/sub/grant
    ).expect("metric creation failed");

    /// Minor currency units moved to cashed-out by accepted redemptions
    pub static ref CASHED_OUT: Counter = Counter::new(
        "grant_amount_cashed_out_total",
        "Total amount redeemed across all grants"
    ).expect("metric creation failed");
}

static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

/// Handle over the registry that owns the grant metrics.
#[derive(Debug, Clone)]
pub struct MetricsHandle {
    registry: Registry,
}

impl MetricsHandle {
    /// Encode all metrics as Prometheus text format.
    pub fn encode(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; only the first call registers and every
/// call reports its outcome.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    register_once(&REGISTERED, &REGISTRY)
}

fn register_once(
    cell: &OnceLock<Result<(), String>>,
    registry: &Registry,
) -> Result<MetricsHandle, TelemetryError> {
    cell.get_or_init(|| register_all(registry))
        .clone()
        .map_err(TelemetryError::MetricsInit)?;

    Ok(MetricsHandle {
        registry: registry.clone(),
    })
}

fn register_all(registry: &Registry) -> Result<(), String> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(OPERATIONS.clone()),
        Box::new(OPERATION_FAILURES.clone()),
        Box::new(ADMISSION_REJECTIONS.clone()),
        Box::new(CASHED_OUT.clone()),
    ];

    for metric in metrics {
        registry.register(metric).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Record the outcome of one operation.
///
/// `failure_kind` is `None` on success.
pub fn record_operation(operation: &str, failure_kind: Option<&str>) {
    match failure_kind {
        None => OPERATIONS.with_label_values(&[operation, "success"]).inc(),
        Some(kind) => {
            OPERATIONS.with_label_values(&[operation, "failure"]).inc();
            OPERATION_FAILURES
                .with_label_values(&[operation, kind])
                .inc();
        }
    }
}

/// Record a budget refusal for the given tier.
pub fn record_admission_rejection(tier: &str) {
    ADMISSION_REJECTIONS.with_label_values(&[tier]).inc();
}

/// Record an accepted redemption.
pub fn record_cashed_out(amount: u64) {
    CASHED_OUT.inc_by(amount as f64);
}
