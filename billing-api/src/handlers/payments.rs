//! Payment handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::{
    ListPaymentsParams, PaymentListResponse, PaymentResponse, PaymentRetryResponse,
    ProcessPaymentRequest,
};
use crate::middleware::Principal;
use crate::models::PaymentStatus;
use crate::startup::AppState;
use crate::workflows::ProcessPaymentInput;

/// POST /payments. The paying customer comes from the caller identity, not
/// the body; the workflow re-checks that the invoice belongs to them.
pub async fn process_payment(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<ProcessPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let customer_id = principal.require_customer_id()?.to_string();
    let payment = state
        .workflows
        .process_payment(
            &customer_id,
            ProcessPaymentInput {
                invoice_id: payload.invoice_id,
                amount: payload.amount,
                payment_method: payload.payment_method,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(PaymentResponse::from(payment))))
}

pub async fn get_payment(
    State(state): State<AppState>,
    principal: Principal,
    Path(payment_id): Path<String>,
) -> Result<Json<PaymentResponse>, AppError> {
    let payment = state
        .workflows
        .stores()
        .payments
        .get(&payment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Payment not found")))?;
    principal.ensure_can_access(&payment.customer_id)?;
    Ok(Json(PaymentResponse::from(payment)))
}

pub async fn list_payments(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<ListPaymentsParams>,
) -> Result<Json<PaymentListResponse>, AppError> {
    principal.ensure_admin()?;
    let status = match params.status.as_deref() {
        None => None,
        Some("success") => Some(PaymentStatus::Success),
        Some("failed") => Some(PaymentStatus::Failed),
        Some("pending") => Some(PaymentStatus::Pending),
        Some(other) => {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Unknown payment status filter: {other}"
            )))
        }
    };
    let page = state
        .workflows
        .stores()
        .payments
        .list(
            status,
            super::page_limit(params.limit),
            params.cursor.as_deref(),
        )
        .await?;
    Ok(Json(PaymentListResponse {
        payments: page.items.into_iter().map(PaymentResponse::from).collect(),
        next_cursor: page.next_cursor,
    }))
}

/// POST /payments/retry. Manual trigger for the scheduled retry pass.
pub async fn retry_failed_payments(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<PaymentRetryResponse>, AppError> {
    principal.ensure_admin()?;
    let payments_recovered = state.workflows.retry_failed_payments().await?;
    Ok(Json(PaymentRetryResponse { payments_recovered }))
}
