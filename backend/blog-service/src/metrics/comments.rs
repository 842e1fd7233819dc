//! Comment operation outcomes and partial failures

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec};

/// Comment operations by type (create/delete) and outcome
static COMMENT_OPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "blog_comment_ops_total",
        "Comment operations by type and outcome",
        &["op", "outcome"]
    )
    .expect("failed to register blog_comment_ops_total")
});

/// Comments left without a post summary, by the stage reached
static COMMENT_ORPHANS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "blog_comment_orphans_total",
        "Comments stored without a matching post summary",
        &["stage"]
    )
    .expect("failed to register blog_comment_orphans_total")
});

pub fn record_comment_op(op: &str, outcome: &str) {
    COMMENT_OPS_TOTAL.with_label_values(&[op, outcome]).inc();
}

pub fn record_orphan(stage: &str) {
    COMMENT_ORPHANS_TOTAL.with_label_values(&[stage]).inc();
}
