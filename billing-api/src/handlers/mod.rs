pub mod billing;
pub mod customers;
pub mod invoices;
pub mod payments;
pub mod plans;
pub mod subscriptions;

use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::services::metrics::gather_metrics;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "billing-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}

/// Clamp a caller-supplied page size to something sane.
pub(crate) fn page_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(50).clamp(1, 200)
}
