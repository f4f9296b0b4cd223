//! Billing workflows.
//!
//! Each workflow is a read-modify-write sequence scoped to one customer id.
//! The storage backend only guarantees per-key atomicity, so every sequence
//! runs under the per-customer single-flight lock; two requests racing on
//! the same customer serialize here instead of losing an update.

pub mod invoicing;
pub mod payments;
pub mod subscription;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use service_core::error::AppError;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::{Customer, Invoice, SubscriptionPlan};
use crate::services::metrics::NOTIFICATION_FAILURES_TOTAL;
use crate::services::{Clock, IdGenerator, NotificationSender, SettlementGateway, Stores};

pub use payments::ProcessPaymentInput;

/// Single-flight locks keyed by customer id.
///
/// Entries accumulate as customers are touched; batch passes sweep every
/// customer, so they call [`CustomerLocks::evict_unlocked`] afterwards to
/// keep the map proportional to in-flight work rather than total customers.
#[derive(Default)]
pub struct CustomerLocks {
    inner: DashMap<String, Arc<Mutex<()>>>,
}

impl CustomerLocks {
    pub async fn acquire(&self, customer_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .inner
            .entry(customer_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        lock.lock_owned().await
    }

    /// Drop entries no task currently holds a handle to. A held or pending
    /// lock keeps its Arc count above one and survives; the shard lock taken
    /// by `retain` excludes concurrent `acquire` calls on the same entry.
    pub fn evict_unlocked(&self) {
        self.inner.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// All billing workflows over the injected collaborators.
pub struct Workflows {
    stores: Stores,
    notifier: Arc<dyn NotificationSender>,
    gateway: Arc<dyn SettlementGateway>,
    clock: Arc<dyn Clock>,
    ids: IdGenerator,
    locks: CustomerLocks,
    page_size: i64,
}

impl Workflows {
    pub fn new(
        stores: Stores,
        notifier: Arc<dyn NotificationSender>,
        gateway: Arc<dyn SettlementGateway>,
        clock: Arc<dyn Clock>,
        page_size: i64,
    ) -> Self {
        Self {
            stores,
            notifier,
            gateway,
            clock,
            ids: IdGenerator,
            locks: CustomerLocks::default(),
            page_size: page_size.max(1),
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) async fn require_customer(&self, customer_id: &str) -> Result<Customer, AppError> {
        self.stores
            .customers
            .get(customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))
    }

    pub(crate) async fn require_plan(&self, plan_id: &str) -> Result<SubscriptionPlan, AppError> {
        self.stores
            .plans
            .get(plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Subscription plan not found")))
    }

    /// Best-effort invoice notification. Failures are logged and counted,
    /// never propagated: the invoice is already persisted.
    pub(crate) async fn notify_invoice_created(&self, customer: &Customer, invoice: &Invoice) {
        if let Err(e) = self
            .notifier
            .send_invoice_created(&customer.email, &invoice.id, invoice.amount, invoice.due_date)
            .await
        {
            NOTIFICATION_FAILURES_TOTAL
                .with_label_values(&["invoice_created"])
                .inc();
            tracing::warn!(
                customer_id = %customer.id,
                invoice_id = %invoice.id,
                error = %e,
                "Failed to send invoice notification"
            );
        }
    }

    /// Best-effort payment outcome notification.
    pub(crate) async fn notify_payment_result(
        &self,
        customer: &Customer,
        invoice_id: &str,
        amount: Decimal,
        succeeded: bool,
    ) {
        let result = if succeeded {
            self.notifier
                .send_payment_succeeded(&customer.email, invoice_id, amount)
                .await
        } else {
            self.notifier
                .send_payment_failed(&customer.email, invoice_id, amount)
                .await
        };
        if let Err(e) = result {
            let kind = if succeeded {
                "payment_succeeded"
            } else {
                "payment_failed"
            };
            NOTIFICATION_FAILURES_TOTAL.with_label_values(&[kind]).inc();
            tracing::warn!(
                customer_id = %customer.id,
                invoice_id = %invoice_id,
                error = %e,
                "Failed to send payment notification"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn eviction_drops_released_locks_and_keeps_held_ones() {
        let locks = CustomerLocks::default();

        let held = locks.acquire("CUST-HELD").await;
        let released = locks.acquire("CUST-RELEASED").await;
        drop(released);
        assert_eq!(locks.len(), 2);

        locks.evict_unlocked();
        assert_eq!(locks.len(), 1);

        drop(held);
        locks.evict_unlocked();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn reacquiring_after_eviction_still_serializes_per_customer() {
        let locks = Arc::new(CustomerLocks::default());

        let guard = locks.acquire("CUST-1").await;
        locks.evict_unlocked();

        // The held entry survived eviction, so a second acquisition must
        // wait for the guard.
        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.acquire("CUST-1").await })
        };
        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.expect("lock task panicked");
    }
}
