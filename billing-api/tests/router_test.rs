mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use billing_api::startup::{router, AppState};

use common::TestContext;

fn app(ctx: &TestContext) -> axum::Router {
    router(AppState {
        workflows: Arc::clone(&ctx.workflows),
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_and_metrics_respond() {
    let ctx = TestContext::new(true);

    let response = app(&ctx)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");

    let response = app(&ctx)
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn customer_registration_and_self_access() {
    let ctx = TestContext::new(true);

    let response = app(&ctx)
        .oneshot(
            Request::post("/customers")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "name": "Ada Lovelace",
                        "email": "ada@example.com",
                        "password": "correct-horse"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let customer_id = body["id"].as_str().unwrap().to_string();
    assert!(customer_id.starts_with("CUST-"));
    assert!(body.get("password_hash").is_none());

    // Owner reads their own record.
    let response = app(&ctx)
        .oneshot(
            Request::get(format!("/customers/{}", customer_id))
                .header("x-customer-id", &customer_id)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A different customer is rejected.
    let response = app(&ctx)
        .oneshot(
            Request::get(format!("/customers/{}", customer_id))
                .header("x-customer-id", "CUST-SOMEONE-ELSE")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // An admin is not.
    let response = app(&ctx)
        .oneshot(
            Request::get(format!("/customers/{}", customer_id))
                .header("x-customer-id", "CUST-ADMIN")
                .header("x-roles", "admin")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let ctx = TestContext::new(true);
    let payload = json!({ "name": "Ada", "email": "ada@example.com" }).to_string();

    let response = app(&ctx)
        .oneshot(
            Request::post("/customers")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.clone()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app(&ctx)
        .oneshot(
            Request::post("/customers")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn plan_writes_require_the_admin_role() {
    let ctx = TestContext::new(true);
    let payload = json!({
        "name": "Basic",
        "price": "9.99",
        "billing_cycle": "monthly"
    })
    .to_string();

    let response = app(&ctx)
        .oneshot(
            Request::post("/plans")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-customer-id", "CUST-1")
                .body(Body::from(payload.clone()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app(&ctx)
        .oneshot(
            Request::post("/plans")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-roles", "admin")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert!(body["id"].as_str().unwrap().starts_with("PLAN-"));
}

#[tokio::test]
async fn invalid_registration_payload_is_unprocessable() {
    let ctx = TestContext::new(true);

    let response = app(&ctx)
        .oneshot(
            Request::post("/customers")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "name": "Ada", "email": "not-an-email" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn end_to_end_subscription_and_payment_flow() {
    let ctx = TestContext::new(true);
    ctx.seed_plan("PLAN-BASIC", "50", "monthly").await;
    ctx.seed_customer("CUST-1").await;

    let response = app(&ctx)
        .oneshot(
            Request::post("/customers/CUST-1/subscription")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-customer-id", "CUST-1")
                .body(Body::from(json!({ "plan_id": "PLAN-BASIC" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app(&ctx)
        .oneshot(
            Request::post("/billing/customers/CUST-1/invoice")
                .header("x-customer-id", "CUST-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let invoice = body_json(response).await;
    let invoice_id = invoice["id"].as_str().unwrap().to_string();

    let response = app(&ctx)
        .oneshot(
            Request::post("/payments")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-customer-id", "CUST-1")
                .body(Body::from(
                    json!({
                        "invoice_id": invoice_id,
                        "amount": "50",
                        "payment_method": "credit_card"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let payment = body_json(response).await;
    assert_eq!(payment["status"], "success");

    let response = app(&ctx)
        .oneshot(
            Request::get(format!("/invoices/{}", invoice_id))
                .header("x-customer-id", "CUST-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let invoice = body_json(response).await;
    assert_eq!(invoice["payment_status"], "paid");
}
