mod common;

use chrono::Months;
use service_core::error::AppError;

use billing_api::models::{Customer, InvoiceStatus, SubscriptionStatus};

use common::{dec, TestContext};

#[tokio::test]
async fn generate_invoice_bills_the_ending_period_and_rolls_forward() {
    let ctx = TestContext::new(true);
    ctx.seed_plan("PLAN-BASIC", "50", "monthly").await;
    ctx.seed_subscribed_customer("CUST-1", "PLAN-BASIC").await;

    let first_end = common::base_time().checked_add_months(Months::new(1)).unwrap();
    let invoice = ctx.workflows.generate_invoice("CUST-1").await.unwrap();

    assert_eq!(invoice.amount, dec("50"));
    assert_eq!(invoice.due_date, first_end);
    assert_eq!(invoice.payment_status, InvoiceStatus::Pending);
    assert!(invoice.payment_date.is_none());

    // The subscription and billing period advance by one cycle.
    let next_end = first_end.checked_add_months(Months::new(1)).unwrap();
    let customer = ctx.stores.customers.get("CUST-1").await.unwrap().unwrap();
    assert_eq!(customer.subscription_start_date, Some(first_end));
    assert_eq!(customer.subscription_end_date, Some(next_end));

    let cycle = ctx.stores.cycles.get("CUST-1").await.unwrap().unwrap();
    assert_eq!(cycle.start_date, first_end);
    assert_eq!(cycle.end_date, next_end);
}

#[tokio::test]
async fn generate_invoice_requires_an_active_subscription() {
    let ctx = TestContext::new(true);
    ctx.seed_customer("CUST-1").await;

    let err = ctx.workflows.generate_invoice("CUST-1").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn generate_invoice_requires_billing_cycle_data() {
    let ctx = TestContext::new(true);
    ctx.seed_plan("PLAN-BASIC", "50", "monthly").await;

    // An active subscriber whose billing period record is missing.
    let customer = Customer {
        id: "CUST-1".to_string(),
        name: "Customer".to_string(),
        email: "cust-1@example.com".to_string(),
        password_hash: None,
        subscription_plan_id: Some("PLAN-BASIC".to_string()),
        subscription_status: SubscriptionStatus::Active,
        subscription_start_date: Some(common::base_time()),
        subscription_end_date: common::base_time().checked_add_months(Months::new(1)),
        roles: Customer::default_roles(),
    };
    ctx.stores.customers.put(&customer).await.unwrap();

    let err = ctx.workflows.generate_invoice("CUST-1").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn billing_run_invoices_only_customers_inside_the_due_window() {
    let ctx = TestContext::new(true);
    ctx.seed_plan("PLAN-MONTHLY", "10", "monthly").await;
    ctx.seed_plan("PLAN-QUARTERLY", "25", "quarterly").await;
    ctx.seed_subscribed_customer("CUST-M", "PLAN-MONTHLY").await;
    ctx.seed_subscribed_customer("CUST-Q", "PLAN-QUARTERLY").await;

    // Jan 30: two days before the monthly period ends on Feb 1, well
    // outside the quarterly customer's 14-day window.
    ctx.advance_days(29);
    let generated = ctx.workflows.run_billing_batch(None).await.unwrap();
    assert_eq!(generated, 1);

    let monthly = ctx.stores.invoices.list(Some("CUST-M"), 10, None).await.unwrap();
    assert_eq!(monthly.items.len(), 1);
    let quarterly = ctx.stores.invoices.list(Some("CUST-Q"), 10, None).await.unwrap();
    assert!(quarterly.items.is_empty());

    // The billed period rolled forward, so an immediate second run is a
    // no-op.
    let generated = ctx.workflows.run_billing_batch(None).await.unwrap();
    assert_eq!(generated, 0);
}

#[tokio::test]
async fn billing_run_skips_broken_customers_and_keeps_going() {
    let ctx = TestContext::new(true);
    ctx.seed_plan("PLAN-MONTHLY", "10", "monthly").await;
    ctx.seed_subscribed_customer("CUST-OK", "PLAN-MONTHLY").await;

    // Active subscriber pointing at a plan that no longer exists.
    let broken = Customer {
        id: "CUST-BROKEN".to_string(),
        name: "Broken".to_string(),
        email: "broken@example.com".to_string(),
        password_hash: None,
        subscription_plan_id: Some("PLAN-GONE".to_string()),
        subscription_status: SubscriptionStatus::Active,
        subscription_start_date: Some(common::base_time()),
        subscription_end_date: common::base_time().checked_add_months(Months::new(1)),
        roles: Customer::default_roles(),
    };
    ctx.stores.customers.put(&broken).await.unwrap();

    ctx.advance_days(29);
    let generated = ctx.workflows.run_billing_batch(None).await.unwrap();
    assert_eq!(generated, 1);

    let ok = ctx.stores.invoices.list(Some("CUST-OK"), 10, None).await.unwrap();
    assert_eq!(ok.items.len(), 1);
}

#[tokio::test]
async fn billing_run_for_one_customer_respects_the_due_window() {
    let ctx = TestContext::new(true);
    ctx.seed_plan("PLAN-MONTHLY", "10", "monthly").await;
    ctx.seed_subscribed_customer("CUST-1", "PLAN-MONTHLY").await;

    // Day 5: twenty-seven days before the period ends, not yet due.
    ctx.advance_days(5);
    let generated = ctx
        .workflows
        .run_billing_batch(Some("CUST-1"))
        .await
        .unwrap();
    assert_eq!(generated, 0);

    ctx.advance_days(24);
    let generated = ctx
        .workflows
        .run_billing_batch(Some("CUST-1"))
        .await
        .unwrap();
    assert_eq!(generated, 1);
}

#[tokio::test]
async fn invoices_past_due_read_as_overdue_without_a_stored_transition() {
    let ctx = TestContext::new(true);
    ctx.seed_plan("PLAN-BASIC", "50", "monthly").await;
    ctx.seed_subscribed_customer("CUST-1", "PLAN-BASIC").await;

    let invoice = ctx.workflows.generate_invoice("CUST-1").await.unwrap();

    ctx.advance_days(45);
    let stored = ctx
        .stores
        .invoices
        .get(&invoice.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.payment_status, InvoiceStatus::Pending);
    assert_eq!(
        stored.effective_status(ctx.workflows.now()),
        InvoiceStatus::Overdue
    );
}
