//! Customer account handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use service_core::error::AppError;
use sha2::{Digest, Sha256};
use validator::Validate;

use crate::dtos::{
    CreateCustomerRequest, CustomerListResponse, CustomerResponse, ListParams,
    UpsertCustomerRequest,
};
use crate::middleware::Principal;
use crate::models::{BillingCycle, Customer, SubscriptionStatus};
use crate::startup::AppState;

fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// POST /customers. Open registration; the caller needs no prior identity.
pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let stores = state.workflows.stores();
    if stores.customers.find_by_email(&payload.email).await?.is_some() {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "A customer with this email already exists"
        )));
    }

    let customer = Customer {
        id: state.workflows.ids().customer_id(),
        name: payload.name,
        email: payload.email,
        password_hash: payload.password.as_deref().map(hash_password),
        subscription_plan_id: None,
        subscription_status: SubscriptionStatus::Inactive,
        subscription_start_date: None,
        subscription_end_date: None,
        roles: Customer::default_roles(),
    };
    stores.customers.put(&customer).await?;

    tracing::info!(customer_id = %customer.id, "Customer created");
    Ok((StatusCode::CREATED, Json(CustomerResponse::from(customer))))
}

pub async fn get_customer(
    State(state): State<AppState>,
    principal: Principal,
    Path(customer_id): Path<String>,
) -> Result<Json<CustomerResponse>, AppError> {
    principal.ensure_can_access(&customer_id)?;
    let customer = state
        .workflows
        .stores()
        .customers
        .get(&customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;
    Ok(Json(CustomerResponse::from(customer)))
}

/// PUT /customers/:id. Replace semantics: the stored document becomes the
/// payload, with credentials carried over when no new password is supplied.
/// Subscription dates supplied together also refresh the billing period.
pub async fn upsert_customer(
    State(state): State<AppState>,
    principal: Principal,
    Path(customer_id): Path<String>,
    Json(payload): Json<UpsertCustomerRequest>,
) -> Result<Json<CustomerResponse>, AppError> {
    principal.ensure_can_access(&customer_id)?;
    payload.validate()?;

    let stores = state.workflows.stores();
    let existing = stores.customers.get(&customer_id).await?;

    let password_hash = match payload.password.as_deref() {
        Some(password) => Some(hash_password(password)),
        None => existing.as_ref().and_then(|c| c.password_hash.clone()),
    };
    let roles = existing
        .map(|c| c.roles)
        .unwrap_or_else(Customer::default_roles);

    let customer = Customer {
        id: customer_id.clone(),
        name: payload.name,
        email: payload.email,
        password_hash,
        subscription_plan_id: payload.subscription_plan_id,
        subscription_status: payload
            .subscription_status
            .as_deref()
            .map(SubscriptionStatus::from_string)
            .unwrap_or(SubscriptionStatus::Inactive),
        subscription_start_date: payload.subscription_start_date,
        subscription_end_date: payload.subscription_end_date,
        roles,
    };
    stores.customers.put(&customer).await?;

    if let (Some(start), Some(end)) = (
        customer.subscription_start_date,
        customer.subscription_end_date,
    ) {
        stores
            .cycles
            .put(
                &customer_id,
                &BillingCycle {
                    start_date: start,
                    end_date: end,
                },
            )
            .await?;
    }

    tracing::info!(customer_id = %customer_id, "Customer upserted");
    Ok(Json(CustomerResponse::from(customer)))
}

pub async fn list_customers(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<ListParams>,
) -> Result<Json<CustomerListResponse>, AppError> {
    principal.ensure_admin()?;
    let page = state
        .workflows
        .stores()
        .customers
        .list(super::page_limit(params.limit), params.cursor.as_deref())
        .await?;
    Ok(Json(CustomerListResponse {
        customers: page.items.into_iter().map(CustomerResponse::from).collect(),
        next_cursor: page.next_cursor,
    }))
}
