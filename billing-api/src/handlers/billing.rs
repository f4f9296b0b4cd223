//! Billing run handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use service_core::error::AppError;

use crate::dtos::{BillingRunRequest, BillingRunResponse, InvoiceResponse};
use crate::middleware::Principal;
use crate::startup::AppState;

/// POST /billing/run. Manual trigger for the daily batch; an optional body
/// narrows the run to one customer.
pub async fn run_billing(
    State(state): State<AppState>,
    principal: Principal,
    payload: Option<Json<BillingRunRequest>>,
) -> Result<Json<BillingRunResponse>, AppError> {
    principal.ensure_admin()?;
    let filter = payload.and_then(|Json(body)| body.customer_id);
    let invoices_generated = state
        .workflows
        .run_billing_batch(filter.as_deref())
        .await?;
    Ok(Json(BillingRunResponse { invoices_generated }))
}

/// POST /billing/customers/:id/invoice. Generates the next recurring
/// invoice immediately, skipping the due-window check.
pub async fn generate_invoice(
    State(state): State<AppState>,
    principal: Principal,
    Path(customer_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    principal.ensure_can_access(&customer_id)?;
    let invoice = state.workflows.generate_invoice(&customer_id).await?;
    let now = state.workflows.now();
    Ok((
        StatusCode::CREATED,
        Json(InvoiceResponse::from_invoice(invoice, now)),
    ))
}
