mod common;

use chrono::Months;
use service_core::error::AppError;

use billing_api::models::InvoiceStatus;

use common::{dec, TestContext};

#[tokio::test]
async fn halfway_upgrade_charges_the_price_difference_remainder() {
    let ctx = TestContext::new(true);
    ctx.seed_plan("PLAN-BASIC", "9.99", "monthly").await;
    ctx.seed_plan("PLAN-PRO", "19.99", "monthly").await;
    ctx.seed_subscribed_customer("CUST-1", "PLAN-BASIC").await;

    // The period runs Jan 1 to Feb 1; on Jan 17 exactly 15 of the 30
    // cycle days remain.
    ctx.advance_days(16);
    let invoice = ctx
        .workflows
        .change_plan("CUST-1", "PLAN-PRO")
        .await
        .unwrap();

    assert_eq!(invoice.amount, dec("5"));
    assert_eq!(invoice.payment_status, InvoiceStatus::Pending);
    assert_eq!(invoice.due_date, ctx.workflows.now());
    assert!(invoice.id.starts_with("INV-CHANGE-"));
}

#[tokio::test]
async fn downgrade_produces_a_negative_credit_amount() {
    let ctx = TestContext::new(true);
    ctx.seed_plan("PLAN-BASIC", "9.99", "monthly").await;
    ctx.seed_plan("PLAN-PRO", "19.99", "monthly").await;
    ctx.seed_subscribed_customer("CUST-1", "PLAN-PRO").await;

    ctx.advance_days(16);
    let invoice = ctx
        .workflows
        .change_plan("CUST-1", "PLAN-BASIC")
        .await
        .unwrap();

    assert_eq!(invoice.amount, dec("-5"));
}

#[tokio::test]
async fn change_to_same_plan_charges_nothing() {
    let ctx = TestContext::new(true);
    ctx.seed_plan("PLAN-BASIC", "9.99", "monthly").await;
    ctx.seed_subscribed_customer("CUST-1", "PLAN-BASIC").await;

    ctx.advance_days(7);
    let invoice = ctx
        .workflows
        .change_plan("CUST-1", "PLAN-BASIC")
        .await
        .unwrap();

    assert_eq!(invoice.amount, dec("0"));
}

#[tokio::test]
async fn change_restarts_the_billing_period_on_the_new_plan() {
    let ctx = TestContext::new(true);
    ctx.seed_plan("PLAN-BASIC", "9.99", "monthly").await;
    ctx.seed_plan("PLAN-ANNUAL", "99.99", "yearly").await;
    ctx.seed_subscribed_customer("CUST-1", "PLAN-BASIC").await;

    ctx.advance_days(15);
    ctx.workflows
        .change_plan("CUST-1", "PLAN-ANNUAL")
        .await
        .unwrap();

    let now = ctx.workflows.now();
    let expected_end = now.checked_add_months(Months::new(12)).unwrap();

    let customer = ctx.stores.customers.get("CUST-1").await.unwrap().unwrap();
    assert_eq!(customer.subscription_plan_id.as_deref(), Some("PLAN-ANNUAL"));
    assert_eq!(customer.subscription_start_date, Some(now));
    assert_eq!(customer.subscription_end_date, Some(expected_end));

    let cycle = ctx.stores.cycles.get("CUST-1").await.unwrap().unwrap();
    assert_eq!(cycle.start_date, now);
    assert_eq!(cycle.end_date, expected_end);
}

#[tokio::test]
async fn change_requires_an_existing_subscription() {
    let ctx = TestContext::new(true);
    ctx.seed_plan("PLAN-BASIC", "9.99", "monthly").await;
    ctx.seed_customer("CUST-1").await;

    let err = ctx
        .workflows
        .change_plan("CUST-1", "PLAN-BASIC")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn change_to_unknown_plan_leaves_subscription_untouched() {
    let ctx = TestContext::new(true);
    ctx.seed_plan("PLAN-BASIC", "9.99", "monthly").await;
    ctx.seed_subscribed_customer("CUST-1", "PLAN-BASIC").await;

    let err = ctx
        .workflows
        .change_plan("CUST-1", "PLAN-MISSING")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let customer = ctx.stores.customers.get("CUST-1").await.unwrap().unwrap();
    assert_eq!(customer.subscription_plan_id.as_deref(), Some("PLAN-BASIC"));
    let invoices = ctx.stores.invoices.list(Some("CUST-1"), 10, None).await.unwrap();
    assert!(invoices.items.is_empty());
}
