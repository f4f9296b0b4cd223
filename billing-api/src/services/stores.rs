//! Store contracts over the persistent key-value backend.
//!
//! Each store exposes per-key atomic get/put; no cross-key transactions are
//! assumed. Listing is uniformly cursor-based: callers pass the cursor from
//! the previous page and stop when `next_cursor` is `None`.

use async_trait::async_trait;
use service_core::error::AppError;

use crate::models::{BillingCycle, Customer, Invoice, Payment, PaymentStatus, SubscriptionPlan};

/// One page of results plus the continuation cursor.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Customer>, AppError>;
    async fn put(&self, customer: &Customer) -> Result<(), AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, AppError>;
    async fn list(&self, limit: i64, cursor: Option<&str>) -> Result<Page<Customer>, AppError>;
}

#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<SubscriptionPlan>, AppError>;
    async fn put(&self, plan: &SubscriptionPlan) -> Result<(), AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    async fn list(
        &self,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<Page<SubscriptionPlan>, AppError>;
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Invoice>, AppError>;
    async fn put(&self, invoice: &Invoice) -> Result<(), AppError>;
    async fn list(
        &self,
        customer_id: Option<&str>,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<Page<Invoice>, AppError>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Payment>, AppError>;
    async fn put(&self, payment: &Payment) -> Result<(), AppError>;
    async fn list(
        &self,
        status: Option<PaymentStatus>,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<Page<Payment>, AppError>;
}

#[async_trait]
pub trait BillingCycleStore: Send + Sync {
    async fn get(&self, customer_id: &str) -> Result<Option<BillingCycle>, AppError>;
    async fn put(&self, customer_id: &str, cycle: &BillingCycle) -> Result<(), AppError>;
}

/// The full set of stores a workflow needs, behind trait objects so tests
/// can substitute the in-memory backend.
#[derive(Clone)]
pub struct Stores {
    pub customers: std::sync::Arc<dyn CustomerStore>,
    pub plans: std::sync::Arc<dyn PlanStore>,
    pub invoices: std::sync::Arc<dyn InvoiceStore>,
    pub payments: std::sync::Arc<dyn PaymentStore>,
    pub cycles: std::sync::Arc<dyn BillingCycleStore>,
}
