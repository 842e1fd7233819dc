//! Prometheus metrics for the reconciliation job
//!
//! Tracks passes, repairs by kind, and pass duration

use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter_vec, Histogram, IntCounterVec};
use std::time::Duration;

/// Total number of reconciliation passes (success/error)
static RECONCILE_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "blog_reconcile_runs_total",
        "Total number of reconciliation passes (success/error)",
        &["status"]
    )
    .expect("failed to register blog_reconcile_runs_total")
});

/// Repairs applied, by kind
static RECONCILE_REPAIRS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "blog_reconcile_repairs_total",
        "Divergences repaired between comments and post summaries",
        &["kind"]
    )
    .expect("failed to register blog_reconcile_repairs_total")
});

static RECONCILE_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "blog_reconcile_duration_seconds",
        "Duration of reconciliation passes",
        vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("failed to register blog_reconcile_duration_seconds")
});

pub fn record_reconcile_run(status: &str) {
    RECONCILE_RUNS_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_reconcile_repairs(kind: &str, count: u64) {
    if count > 0 {
        RECONCILE_REPAIRS_TOTAL.with_label_values(&[kind]).inc_by(count);
    }
}

pub fn record_reconcile_duration(duration: Duration) {
    RECONCILE_DURATION_SECONDS.observe(duration.as_secs_f64());
}
