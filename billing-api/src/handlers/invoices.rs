//! Invoice read handlers. Overdue is derived at read time from the due
//! date, never stored.

use axum::extract::{Path, Query, State};
use axum::Json;
use service_core::error::AppError;

use crate::dtos::{InvoiceListResponse, InvoiceResponse, ListInvoicesParams};
use crate::middleware::Principal;
use crate::startup::AppState;

pub async fn get_invoice(
    State(state): State<AppState>,
    principal: Principal,
    Path(invoice_id): Path<String>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .workflows
        .stores()
        .invoices
        .get(&invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
    principal.ensure_can_access(&invoice.customer_id)?;
    Ok(Json(InvoiceResponse::from_invoice(
        invoice,
        state.workflows.now(),
    )))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<ListInvoicesParams>,
) -> Result<Json<InvoiceListResponse>, AppError> {
    // Non-admins always see their own invoices, whatever filter they sent.
    let customer_filter = if principal.is_admin() {
        params.customer_id
    } else {
        Some(principal.require_customer_id()?.to_string())
    };

    let page = state
        .workflows
        .stores()
        .invoices
        .list(
            customer_filter.as_deref(),
            super::page_limit(params.limit),
            params.cursor.as_deref(),
        )
        .await?;

    let now = state.workflows.now();
    Ok(Json(InvoiceListResponse {
        invoices: page
            .items
            .into_iter()
            .map(|invoice| InvoiceResponse::from_invoice(invoice, now))
            .collect(),
        next_cursor: page.next_cursor,
    }))
}
