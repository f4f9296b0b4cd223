//! Subscription lifecycle handlers under /customers/:id/subscription.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::{
    ChangePlanRequest, CreateSubscriptionRequest, CustomerResponse, InvoiceResponse,
    SubscriptionActionRequest, SubscriptionDetailsResponse, SubscriptionResponse,
};
use crate::middleware::Principal;
use crate::models::SubscriptionStatus;
use crate::startup::AppState;

pub async fn get_subscription(
    State(state): State<AppState>,
    principal: Principal,
    Path(customer_id): Path<String>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    principal.ensure_can_access(&customer_id)?;
    let (customer, plan) = state.workflows.subscription_of(&customer_id).await?;
    Ok(Json(SubscriptionResponse::from_parts(&customer, &plan)))
}

pub async fn get_subscription_details(
    State(state): State<AppState>,
    principal: Principal,
    Path(customer_id): Path<String>,
) -> Result<Json<SubscriptionDetailsResponse>, AppError> {
    principal.ensure_can_access(&customer_id)?;
    let (customer, plan, cycle) = state.workflows.subscription_details(&customer_id).await?;
    Ok(Json(SubscriptionDetailsResponse::from_parts(
        customer, plan, cycle,
    )))
}

pub async fn create_subscription(
    State(state): State<AppState>,
    principal: Principal,
    Path(customer_id): Path<String>,
    Json(payload): Json<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    principal.ensure_can_access(&customer_id)?;
    payload.validate()?;
    let customer = state
        .workflows
        .create_subscription(&customer_id, &payload.plan_id)
        .await?;
    Ok((StatusCode::CREATED, Json(CustomerResponse::from(customer))))
}

/// PUT swaps the plan mid-cycle and returns the proration invoice.
pub async fn change_plan(
    State(state): State<AppState>,
    principal: Principal,
    Path(customer_id): Path<String>,
    Json(payload): Json<ChangePlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    principal.ensure_can_access(&customer_id)?;
    payload.validate()?;
    let invoice = state
        .workflows
        .change_plan(&customer_id, &payload.new_plan_id)
        .await?;
    let now = state.workflows.now();
    Ok((
        StatusCode::CREATED,
        Json(InvoiceResponse::from_invoice(invoice, now)),
    ))
}

pub async fn cancel_subscription(
    State(state): State<AppState>,
    principal: Principal,
    Path(customer_id): Path<String>,
) -> Result<Json<CustomerResponse>, AppError> {
    principal.ensure_can_access(&customer_id)?;
    let customer = state.workflows.cancel_subscription(&customer_id).await?;
    Ok(Json(CustomerResponse::from(customer)))
}

/// PATCH carries one administrative action: assign a plan without proration
/// or set the status directly.
pub async fn patch_subscription(
    State(state): State<AppState>,
    principal: Principal,
    Path(customer_id): Path<String>,
    Json(payload): Json<SubscriptionActionRequest>,
) -> Result<Json<CustomerResponse>, AppError> {
    let customer = match payload {
        SubscriptionActionRequest::AssignPlan { plan_id } => {
            principal.ensure_admin()?;
            state.workflows.assign_plan(&customer_id, &plan_id).await?
        }
        SubscriptionActionRequest::UpdateStatus { status } => {
            principal.ensure_can_access(&customer_id)?;
            let status = SubscriptionStatus::from_string(&status);
            state
                .workflows
                .update_subscription_status(&customer_id, status)
                .await?
        }
    };
    Ok(Json(CustomerResponse::from(customer)))
}
