//! Shared test fixtures: in-memory stores, a fixed clock and a
//! deterministic settlement gateway wired into the workflows.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use billing_api::models::{Customer, PlanStatus, SubscriptionPlan, SubscriptionStatus};
use billing_api::services::{
    FixedClock, FixedOutcomeGateway, InMemoryStores, NullNotifier, Stores,
};
use billing_api::workflows::Workflows;

pub const PAGE_SIZE: i64 = 10;

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub struct TestContext {
    pub stores: Stores,
    pub clock: Arc<FixedClock>,
    pub workflows: Arc<Workflows>,
}

impl TestContext {
    /// Context whose settlement gateway always returns `settles`.
    pub fn new(settles: bool) -> Self {
        let memory = InMemoryStores::new();
        let stores = memory.stores();
        let clock = Arc::new(FixedClock::new(base_time()));
        let gateway = if settles {
            FixedOutcomeGateway::succeeding()
        } else {
            FixedOutcomeGateway::failing()
        };
        let workflows = Arc::new(Workflows::new(
            stores.clone(),
            Arc::new(NullNotifier),
            Arc::new(gateway),
            clock.clone(),
            PAGE_SIZE,
        ));
        Self {
            stores,
            clock,
            workflows,
        }
    }

    /// A second workflow handle over the same stores and clock, with a
    /// different settlement outcome. Used to fail a first attempt and then
    /// settle the retry.
    pub fn workflows_with_gateway(&self, settles: bool) -> Arc<Workflows> {
        let gateway = if settles {
            FixedOutcomeGateway::succeeding()
        } else {
            FixedOutcomeGateway::failing()
        };
        Arc::new(Workflows::new(
            self.stores.clone(),
            Arc::new(NullNotifier),
            Arc::new(gateway),
            self.clock.clone(),
            PAGE_SIZE,
        ))
    }

    pub fn advance_days(&self, days: i64) {
        self.clock.advance(Duration::days(days));
    }

    pub async fn seed_plan(&self, id: &str, price: &str, billing_cycle: &str) -> SubscriptionPlan {
        let plan = SubscriptionPlan {
            id: id.to_string(),
            name: format!("{} plan", id),
            description: String::new(),
            price: dec(price),
            billing_cycle: billing_cycle.to_string(),
            features: vec![],
            status: PlanStatus::Active,
        };
        self.stores.plans.put(&plan).await.unwrap();
        plan
    }

    pub async fn seed_customer(&self, id: &str) -> Customer {
        let customer = Customer {
            id: id.to_string(),
            name: format!("Customer {}", id),
            email: format!("{}@example.com", id.to_lowercase()),
            password_hash: None,
            subscription_plan_id: None,
            subscription_status: SubscriptionStatus::Inactive,
            subscription_start_date: None,
            subscription_end_date: None,
            roles: Customer::default_roles(),
        };
        self.stores.customers.put(&customer).await.unwrap();
        customer
    }

    /// Customer already subscribed to `plan_id` with a billing period
    /// starting at the current clock time.
    pub async fn seed_subscribed_customer(&self, id: &str, plan_id: &str) -> Customer {
        self.seed_customer(id).await;
        self.workflows.create_subscription(id, plan_id).await.unwrap()
    }
}
