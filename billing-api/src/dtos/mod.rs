//! Request and response payloads for the HTTP surface.
//!
//! Stored documents keep their `_id` field internal; every response here
//! exposes plain `id` and never includes credential material.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{
    BillingCycle, BillingInterval, Customer, Invoice, InvoiceStatus, Payment, PaymentMethod,
    PaymentStatus, PlanStatus, SubscriptionPlan, SubscriptionStatus,
};

// --- customers ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
}

/// Full-document replacement for PUT. Absent optional fields reset to their
/// defaults, mirroring replace semantics in the store.
#[derive(Debug, Deserialize, Validate)]
pub struct UpsertCustomerRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    pub subscription_plan_id: Option<String>,
    pub subscription_status: Option<String>,
    pub subscription_start_date: Option<DateTime<Utc>>,
    pub subscription_end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subscription_plan_id: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub subscription_start_date: Option<DateTime<Utc>>,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub roles: Vec<String>,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            subscription_plan_id: c.subscription_plan_id,
            subscription_status: c.subscription_status,
            subscription_start_date: c.subscription_start_date,
            subscription_end_date: c.subscription_end_date,
            roles: c.roles,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerListResponse {
    pub customers: Vec<CustomerResponse>,
    pub next_cursor: Option<String>,
}

// --- plans ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlanRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub billing_cycle: BillingInterval,
    #[serde(default)]
    pub features: Vec<String>,
    pub status: Option<PlanStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePlanRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub billing_cycle: Option<BillingInterval>,
    pub features: Option<Vec<String>>,
    pub status: Option<PlanStatus>,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub billing_cycle: String,
    pub features: Vec<String>,
    pub status: PlanStatus,
}

impl From<SubscriptionPlan> for PlanResponse {
    fn from(p: SubscriptionPlan) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            billing_cycle: p.billing_cycle,
            features: p.features,
            status: p.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanListResponse {
    pub plans: Vec<PlanResponse>,
    pub next_cursor: Option<String>,
}

// --- subscriptions ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubscriptionRequest {
    #[validate(length(min = 1))]
    pub plan_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePlanRequest {
    #[validate(length(min = 1))]
    pub new_plan_id: String,
}

/// PATCH body: exactly one action per request.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SubscriptionActionRequest {
    AssignPlan { plan_id: String },
    UpdateStatus { status: String },
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub customer_id: String,
    pub plan_id: String,
    pub plan_name: String,
    pub status: SubscriptionStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl SubscriptionResponse {
    pub fn from_parts(customer: &Customer, plan: &SubscriptionPlan) -> Self {
        Self {
            customer_id: customer.id.clone(),
            plan_id: plan.id.clone(),
            plan_name: plan.name.clone(),
            status: customer.subscription_status,
            start_date: customer.subscription_start_date,
            end_date: customer.subscription_end_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionDetailsResponse {
    pub customer_id: String,
    pub customer_name: String,
    pub email: String,
    pub plan: PlanResponse,
    pub status: SubscriptionStatus,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
}

impl SubscriptionDetailsResponse {
    pub fn from_parts(customer: Customer, plan: SubscriptionPlan, cycle: BillingCycle) -> Self {
        Self {
            customer_id: customer.id,
            customer_name: customer.name,
            email: customer.email,
            status: customer.subscription_status,
            plan: plan.into(),
            current_period_start: cycle.start_date,
            current_period_end: cycle.end_date,
        }
    }
}

// --- invoices ---

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: String,
    pub customer_id: String,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub payment_status: InvoiceStatus,
    pub payment_date: Option<DateTime<Utc>>,
}

impl InvoiceResponse {
    /// Builds the response with the overdue state derived at read time.
    pub fn from_invoice(invoice: Invoice, now: DateTime<Utc>) -> Self {
        let payment_status = invoice.effective_status(now);
        Self {
            id: invoice.id,
            customer_id: invoice.customer_id,
            amount: invoice.amount,
            due_date: invoice.due_date,
            payment_status,
            payment_date: invoice.payment_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListInvoicesParams {
    pub customer_id: Option<String>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceResponse>,
    pub next_cursor: Option<String>,
}

// --- payments ---

#[derive(Debug, Deserialize, Validate)]
pub struct ProcessPaymentRequest {
    #[validate(length(min = 1))]
    pub invoice_id: String,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub invoice_id: String,
    pub customer_id: String,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_date: DateTime<Utc>,
    pub status: PaymentStatus,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            invoice_id: p.invoice_id,
            customer_id: p.customer_id,
            amount: p.amount,
            payment_method: p.payment_method,
            payment_date: p.payment_date,
            status: p.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListPaymentsParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentListResponse {
    pub payments: Vec<PaymentResponse>,
    pub next_cursor: Option<String>,
}

// --- billing operations ---

#[derive(Debug, Deserialize, Default)]
pub struct BillingRunRequest {
    pub customer_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BillingRunResponse {
    pub invoices_generated: u64,
}

#[derive(Debug, Serialize)]
pub struct PaymentRetryResponse {
    pub payments_recovered: u64,
}
