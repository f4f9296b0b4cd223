//! MongoDB store backend.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{FindOptions, IndexOptions, ReplaceOptions};
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::models::{BillingCycle, Customer, Invoice, Payment, PaymentStatus, SubscriptionPlan};

use super::stores::{
    BillingCycleStore, CustomerStore, InvoiceStore, Page, PaymentStore, PlanStore, Stores,
};

/// Billing cycle as persisted, keyed by customer id.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BillingCycleRecord {
    #[serde(rename = "_id")]
    customer_id: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

pub struct MongoStores {
    db: Database,
    customers: Collection<Customer>,
    plans: Collection<SubscriptionPlan>,
    invoices: Collection<Invoice>,
    payments: Collection<Payment>,
    cycles: Collection<BillingCycleRecord>,
}

impl MongoStores {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            customers: db.collection("customers"),
            plans: db.collection("plans"),
            invoices: db.collection("invoices"),
            payments: db.collection("payments"),
            cycles: db.collection("billing_cycles"),
        }
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

    /// Initialize indexes used by lookups and list filters.
    pub async fn init_indexes(&self) -> Result<(), AppError> {
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("customer_email_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.customers.create_index(email_index, None).await?;

        let invoice_customer_index = IndexModel::builder()
            .keys(doc! { "customer_id": 1, "_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("invoice_customer_idx".to_string())
                    .build(),
            )
            .build();
        self.invoices.create_index(invoice_customer_index, None).await?;

        let payment_status_index = IndexModel::builder()
            .keys(doc! { "status": 1, "_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("payment_status_idx".to_string())
                    .build(),
            )
            .build();
        self.payments.create_index(payment_status_index, None).await?;

        tracing::info!("Billing store indexes initialized");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

fn upsert() -> ReplaceOptions {
    ReplaceOptions::builder().upsert(true).build()
}

fn find_page(limit: i64) -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "_id": 1 })
        .limit(limit.max(1))
        .build()
}

fn cursor_filter(filter: mongodb::bson::Document, cursor: Option<&str>) -> mongodb::bson::Document {
    let mut filter = filter;
    if let Some(c) = cursor {
        filter.insert("_id", doc! { "$gt": c });
    }
    filter
}

fn next_cursor_from<T>(items: &[T], limit: i64, id_of: impl Fn(&T) -> &str) -> Option<String> {
    if items.len() as i64 == limit.max(1) {
        items.last().map(|item| id_of(item).to_string())
    } else {
        None
    }
}

#[async_trait]
impl CustomerStore for MongoStores {
    async fn get(&self, id: &str) -> Result<Option<Customer>, AppError> {
        Ok(self.customers.find_one(doc! { "_id": id }, None).await?)
    }

    async fn put(&self, customer: &Customer) -> Result<(), AppError> {
        self.customers
            .replace_one(doc! { "_id": &customer.id }, customer, upsert())
            .await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, AppError> {
        Ok(self.customers.find_one(doc! { "email": email }, None).await?)
    }

    async fn list(&self, limit: i64, cursor: Option<&str>) -> Result<Page<Customer>, AppError> {
        let filter = cursor_filter(doc! {}, cursor);
        let found = self.customers.find(filter, find_page(limit)).await?;
        let items: Vec<Customer> = found.try_collect().await?;
        let next_cursor = next_cursor_from(&items, limit, |c| c.id.as_str());
        Ok(Page { items, next_cursor })
    }
}

#[async_trait]
impl PlanStore for MongoStores {
    async fn get(&self, id: &str) -> Result<Option<SubscriptionPlan>, AppError> {
        Ok(self.plans.find_one(doc! { "_id": id }, None).await?)
    }

    async fn put(&self, plan: &SubscriptionPlan) -> Result<(), AppError> {
        self.plans
            .replace_one(doc! { "_id": &plan.id }, plan, upsert())
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.plans.delete_one(doc! { "_id": id }, None).await?;
        Ok(())
    }

    async fn list(
        &self,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<Page<SubscriptionPlan>, AppError> {
        let filter = cursor_filter(doc! {}, cursor);
        let found = self.plans.find(filter, find_page(limit)).await?;
        let items: Vec<SubscriptionPlan> = found.try_collect().await?;
        let next_cursor = next_cursor_from(&items, limit, |p| p.id.as_str());
        Ok(Page { items, next_cursor })
    }
}

#[async_trait]
impl InvoiceStore for MongoStores {
    async fn get(&self, id: &str) -> Result<Option<Invoice>, AppError> {
        Ok(self.invoices.find_one(doc! { "_id": id }, None).await?)
    }

    async fn put(&self, invoice: &Invoice) -> Result<(), AppError> {
        self.invoices
            .replace_one(doc! { "_id": &invoice.id }, invoice, upsert())
            .await?;
        Ok(())
    }

    async fn list(
        &self,
        customer_id: Option<&str>,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<Page<Invoice>, AppError> {
        let mut filter = doc! {};
        if let Some(cid) = customer_id {
            filter.insert("customer_id", cid);
        }
        let filter = cursor_filter(filter, cursor);
        let found = self.invoices.find(filter, find_page(limit)).await?;
        let items: Vec<Invoice> = found.try_collect().await?;
        let next_cursor = next_cursor_from(&items, limit, |i| i.id.as_str());
        Ok(Page { items, next_cursor })
    }
}

#[async_trait]
impl PaymentStore for MongoStores {
    async fn get(&self, id: &str) -> Result<Option<Payment>, AppError> {
        Ok(self.payments.find_one(doc! { "_id": id }, None).await?)
    }

    async fn put(&self, payment: &Payment) -> Result<(), AppError> {
        self.payments
            .replace_one(doc! { "_id": &payment.id }, payment, upsert())
            .await?;
        Ok(())
    }

    async fn list(
        &self,
        status: Option<PaymentStatus>,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<Page<Payment>, AppError> {
        let mut filter = doc! {};
        if let Some(status) = status {
            filter.insert("status", status.as_str());
        }
        let filter = cursor_filter(filter, cursor);
        let found = self.payments.find(filter, find_page(limit)).await?;
        let items: Vec<Payment> = found.try_collect().await?;
        let next_cursor = next_cursor_from(&items, limit, |p| p.id.as_str());
        Ok(Page { items, next_cursor })
    }
}

#[async_trait]
impl BillingCycleStore for MongoStores {
    async fn get(&self, customer_id: &str) -> Result<Option<BillingCycle>, AppError> {
        let record = self.cycles.find_one(doc! { "_id": customer_id }, None).await?;
        Ok(record.map(|r| BillingCycle {
            start_date: r.start_date,
            end_date: r.end_date,
        }))
    }

    async fn put(&self, customer_id: &str, cycle: &BillingCycle) -> Result<(), AppError> {
        let record = BillingCycleRecord {
            customer_id: customer_id.to_string(),
            start_date: cycle.start_date,
            end_date: cycle.end_date,
        };
        self.cycles
            .replace_one(doc! { "_id": customer_id }, record, upsert())
            .await?;
        Ok(())
    }
}
