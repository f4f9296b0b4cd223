//! Subscription plan management. Writes are admin-only; reads are open to
//! any caller so customers can browse the catalog.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::{
    CreatePlanRequest, ListParams, PlanListResponse, PlanResponse, UpdatePlanRequest,
};
use crate::middleware::Principal;
use crate::models::{PlanStatus, SubscriptionPlan};
use crate::startup::AppState;

pub async fn create_plan(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<CreatePlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    principal.ensure_admin()?;
    payload.validate()?;
    if payload.price <= Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Plan price must be positive"
        )));
    }

    let plan = SubscriptionPlan {
        id: state.workflows.ids().plan_id(state.workflows.now()),
        name: payload.name,
        description: payload.description,
        price: payload.price,
        billing_cycle: payload.billing_cycle.as_str().to_string(),
        features: payload.features,
        status: payload.status.unwrap_or(PlanStatus::Active),
    };
    state.workflows.stores().plans.put(&plan).await?;

    tracing::info!(plan_id = %plan.id, "Plan created");
    Ok((StatusCode::CREATED, Json(PlanResponse::from(plan))))
}

pub async fn get_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<Json<PlanResponse>, AppError> {
    let plan = state
        .workflows
        .stores()
        .plans
        .get(&plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Subscription plan not found")))?;
    Ok(Json(PlanResponse::from(plan)))
}

pub async fn list_plans(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PlanListResponse>, AppError> {
    let page = state
        .workflows
        .stores()
        .plans
        .list(super::page_limit(params.limit), params.cursor.as_deref())
        .await?;
    Ok(Json(PlanListResponse {
        plans: page.items.into_iter().map(PlanResponse::from).collect(),
        next_cursor: page.next_cursor,
    }))
}

/// PUT /plans/:id. Partial update; omitted fields keep their stored value.
/// Price or cycle changes only affect invoices generated afterwards.
pub async fn update_plan(
    State(state): State<AppState>,
    principal: Principal,
    Path(plan_id): Path<String>,
    Json(payload): Json<UpdatePlanRequest>,
) -> Result<Json<PlanResponse>, AppError> {
    principal.ensure_admin()?;
    payload.validate()?;

    let stores = state.workflows.stores();
    let mut plan = stores
        .plans
        .get(&plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Subscription plan not found")))?;

    if let Some(name) = payload.name {
        plan.name = name;
    }
    if let Some(description) = payload.description {
        plan.description = description;
    }
    if let Some(price) = payload.price {
        if price <= Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Plan price must be positive"
            )));
        }
        plan.price = price;
    }
    if let Some(cycle) = payload.billing_cycle {
        plan.billing_cycle = cycle.as_str().to_string();
    }
    if let Some(features) = payload.features {
        plan.features = features;
    }
    if let Some(status) = payload.status {
        plan.status = status;
    }
    stores.plans.put(&plan).await?;

    tracing::info!(plan_id = %plan_id, "Plan updated");
    Ok(Json(PlanResponse::from(plan)))
}

pub async fn delete_plan(
    State(state): State<AppState>,
    principal: Principal,
    Path(plan_id): Path<String>,
) -> Result<StatusCode, AppError> {
    principal.ensure_admin()?;
    let stores = state.workflows.stores();
    if stores.plans.get(&plan_id).await?.is_none() {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Subscription plan not found"
        )));
    }
    stores.plans.delete(&plan_id).await?;
    tracing::info!(plan_id = %plan_id, "Plan deleted");
    Ok(StatusCode::NO_CONTENT)
}
