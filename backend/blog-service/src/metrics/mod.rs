//! Comment-consistency metrics.
//!
//! `comments` counts write outcomes and orphans on the request path,
//! `reconcile` covers the repair job. Both register with the default
//! prometheus registry, which `/metrics` renders as text.

use crate::error::{AppError, Result};
use actix_web::HttpResponse;
use prometheus::{Encoder, TextEncoder};

pub mod comments;
pub mod reconcile;

pub use comments::{record_comment_op, record_orphan};
pub use reconcile::{record_reconcile_duration, record_reconcile_repairs, record_reconcile_run};

/// `GET /metrics`
pub async fn serve_metrics() -> Result<HttpResponse> {
    let encoder = TextEncoder::new();
    let mut body = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut body)
        .map_err(|e| AppError::internal("Failed to render metrics", e))?;

    Ok(HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(body))
}
