//! In-memory store backend.
//!
//! Mirrors the per-key atomic semantics of the production backend with
//! `BTreeMap`s so workflows and handlers can be exercised hermetically in
//! tests. Keys iterate in lexicographic order, which is what the cursor
//! pagination contract expects.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use service_core::error::AppError;

use crate::models::{BillingCycle, Customer, Invoice, Payment, PaymentStatus, SubscriptionPlan};

use super::stores::{
    BillingCycleStore, CustomerStore, InvoiceStore, Page, PaymentStore, PlanStore, Stores,
};

#[derive(Default)]
pub struct InMemoryStores {
    customers: RwLock<BTreeMap<String, Customer>>,
    plans: RwLock<BTreeMap<String, SubscriptionPlan>>,
    invoices: RwLock<BTreeMap<String, Invoice>>,
    payments: RwLock<BTreeMap<String, Payment>>,
    cycles: RwLock<BTreeMap<String, BillingCycle>>,
}

impl InMemoryStores {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Bundle this backend behind the five store trait objects.
    pub fn stores(self: &Arc<Self>) -> Stores {
        Stores {
            customers: self.clone(),
            plans: self.clone(),
            invoices: self.clone(),
            payments: self.clone(),
            cycles: self.clone(),
        }
    }
}

fn poisoned() -> AppError {
    AppError::InternalError(anyhow::anyhow!("store lock poisoned"))
}

fn page_of<T: Clone>(
    map: &BTreeMap<String, T>,
    limit: i64,
    cursor: Option<&str>,
    mut matches: impl FnMut(&T) -> bool,
) -> Page<T> {
    let limit = limit.max(1) as usize;
    let mut items = Vec::new();
    let mut next_cursor = None;

    for (key, value) in map.iter() {
        if let Some(c) = cursor {
            if key.as_str() <= c {
                continue;
            }
        }
        if !matches(value) {
            continue;
        }
        items.push(value.clone());
        if items.len() == limit {
            next_cursor = Some(key.clone());
            break;
        }
    }

    Page { items, next_cursor }
}

#[async_trait]
impl CustomerStore for InMemoryStores {
    async fn get(&self, id: &str) -> Result<Option<Customer>, AppError> {
        Ok(self
            .customers
            .read()
            .map_err(|_| poisoned())?
            .get(id)
            .cloned())
    }

    async fn put(&self, customer: &Customer) -> Result<(), AppError> {
        self.customers
            .write()
            .map_err(|_| poisoned())?
            .insert(customer.id.clone(), customer.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, AppError> {
        Ok(self
            .customers
            .read()
            .map_err(|_| poisoned())?
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn list(&self, limit: i64, cursor: Option<&str>) -> Result<Page<Customer>, AppError> {
        let map = self.customers.read().map_err(|_| poisoned())?;
        Ok(page_of(&map, limit, cursor, |_| true))
    }
}

#[async_trait]
impl PlanStore for InMemoryStores {
    async fn get(&self, id: &str) -> Result<Option<SubscriptionPlan>, AppError> {
        Ok(self.plans.read().map_err(|_| poisoned())?.get(id).cloned())
    }

    async fn put(&self, plan: &SubscriptionPlan) -> Result<(), AppError> {
        self.plans
            .write()
            .map_err(|_| poisoned())?
            .insert(plan.id.clone(), plan.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.plans.write().map_err(|_| poisoned())?.remove(id);
        Ok(())
    }

    async fn list(
        &self,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<Page<SubscriptionPlan>, AppError> {
        let map = self.plans.read().map_err(|_| poisoned())?;
        Ok(page_of(&map, limit, cursor, |_| true))
    }
}

#[async_trait]
impl InvoiceStore for InMemoryStores {
    async fn get(&self, id: &str) -> Result<Option<Invoice>, AppError> {
        Ok(self
            .invoices
            .read()
            .map_err(|_| poisoned())?
            .get(id)
            .cloned())
    }

    async fn put(&self, invoice: &Invoice) -> Result<(), AppError> {
        self.invoices
            .write()
            .map_err(|_| poisoned())?
            .insert(invoice.id.clone(), invoice.clone());
        Ok(())
    }

    async fn list(
        &self,
        customer_id: Option<&str>,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<Page<Invoice>, AppError> {
        let map = self.invoices.read().map_err(|_| poisoned())?;
        Ok(page_of(&map, limit, cursor, |inv| {
            customer_id.map_or(true, |cid| inv.customer_id == cid)
        }))
    }
}

#[async_trait]
impl PaymentStore for InMemoryStores {
    async fn get(&self, id: &str) -> Result<Option<Payment>, AppError> {
        Ok(self
            .payments
            .read()
            .map_err(|_| poisoned())?
            .get(id)
            .cloned())
    }

    async fn put(&self, payment: &Payment) -> Result<(), AppError> {
        self.payments
            .write()
            .map_err(|_| poisoned())?
            .insert(payment.id.clone(), payment.clone());
        Ok(())
    }

    async fn list(
        &self,
        status: Option<PaymentStatus>,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<Page<Payment>, AppError> {
        let map = self.payments.read().map_err(|_| poisoned())?;
        Ok(page_of(&map, limit, cursor, |p| {
            status.map_or(true, |s| p.status == s)
        }))
    }
}

#[async_trait]
impl BillingCycleStore for InMemoryStores {
    async fn get(&self, customer_id: &str) -> Result<Option<BillingCycle>, AppError> {
        Ok(self
            .cycles
            .read()
            .map_err(|_| poisoned())?
            .get(customer_id)
            .copied())
    }

    async fn put(&self, customer_id: &str, cycle: &BillingCycle) -> Result<(), AppError> {
        self.cycles
            .write()
            .map_err(|_| poisoned())?
            .insert(customer_id.to_string(), *cycle);
        Ok(())
    }
}
