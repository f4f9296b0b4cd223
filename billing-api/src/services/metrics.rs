//! Prometheus metrics for billing operations.

use once_cell::sync::Lazy;
use prometheus::{
    opts, register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

/// Recurring and proration invoices persisted.
pub static INVOICES_GENERATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "billing_invoices_generated_total",
        "Total invoices generated"
    ))
    .expect("Failed to register INVOICES_GENERATED_TOTAL")
});

/// Billing batch runs by outcome.
pub static BILLING_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!("billing_runs_total", "Billing batch runs by outcome"),
        &["outcome"]
    )
    .expect("Failed to register BILLING_RUNS_TOTAL")
});

/// Payment attempts by status and attempt kind.
pub static PAYMENTS_PROCESSED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "billing_payments_processed_total",
            "Payment attempts by status and attempt kind"
        ),
        &["status", "attempt"]
    )
    .expect("Failed to register PAYMENTS_PROCESSED_TOTAL")
});

/// Notification sends that failed (best-effort deliveries).
pub static NOTIFICATION_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "billing_notification_failures_total",
            "Notification deliveries that failed, by kind"
        ),
        &["kind"]
    )
    .expect("Failed to register NOTIFICATION_FAILURES_TOTAL")
});

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    Lazy::force(&INVOICES_GENERATED_TOTAL);
    Lazy::force(&BILLING_RUNS_TOTAL);
    Lazy::force(&PAYMENTS_PROCESSED_TOTAL);
    Lazy::force(&NOTIFICATION_FAILURES_TOTAL);
}

/// Render the default registry in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
