//! Comment Reconciler Background Job
//!
//! Periodically runs a reconciliation pass so comments orphaned by a failed
//! summary append, left behind by a deleted post, or stuck mid-delete are repaired.

use crate::metrics;
use crate::services::{ReconcileReport, Reconciler};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

pub async fn start_reconciler(reconciler: Arc<Reconciler>, interval: Duration) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Starting comment reconciler background job"
    );

    loop {
        sleep(interval).await;
        run_pass(&reconciler).await;
    }
}

/// Run one pass and record its outcome
pub async fn run_pass(reconciler: &Reconciler) -> Option<ReconcileReport> {
    let started = Instant::now();

    match reconciler.run_once().await {
        Ok(report) => {
            metrics::record_reconcile_run(if report.failures == 0 { "success" } else { "partial" });
            metrics::record_reconcile_duration(started.elapsed());
            metrics::record_reconcile_repairs("reappended", report.reappended as u64);
            metrics::record_reconcile_repairs("collected", report.collected as u64);
            metrics::record_reconcile_repairs("pruned", report.pruned as u64);
            metrics::record_reconcile_repairs("duplicates", report.duplicates as u64);
            metrics::record_reconcile_repairs("deletes_finished", report.deletes_finished as u64);

            if report.repairs() > 0 || report.failures > 0 {
                tracing::info!(
                    checked = report.comments_checked,
                    reappended = report.reappended,
                    collected = report.collected,
                    pruned = report.pruned,
                    duplicates = report.duplicates,
                    deletes_finished = report.deletes_finished,
                    failures = report.failures,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Reconciliation pass repaired divergence"
                );
            } else {
                tracing::debug!(checked = report.comments_checked, "Reconciliation pass found nothing to repair");
            }
            Some(report)
        }
        Err(e) => {
            metrics::record_reconcile_run("error");
            metrics::record_reconcile_duration(started.elapsed());
            tracing::error!(error = %e, duration_ms = started.elapsed().as_millis() as u64, "Reconciliation pass failed");
            None
        }
    }
}
