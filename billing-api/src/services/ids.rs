//! Identifier generation.
//!
//! Invoice and payment ids embed a millisecond timestamp plus the customer
//! id, which makes collisions practically (not cryptographically)
//! impossible while keeping ids grep-able in logs.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator;

impl IdGenerator {
    pub fn customer_id(&self) -> String {
        format!("CUST-{}", Uuid::new_v4())
    }

    pub fn plan_id(&self, now: DateTime<Utc>) -> String {
        format!("PLAN-{}", now.timestamp_millis())
    }

    pub fn invoice_id(&self, now: DateTime<Utc>, customer_id: &str) -> String {
        format!("INV-{}-{}", now.timestamp_millis(), customer_id)
    }

    /// Id for an invoice raised by a mid-cycle plan change.
    pub fn plan_change_invoice_id(&self, now: DateTime<Utc>, customer_id: &str) -> String {
        format!("INV-CHANGE-{}-{}", now.timestamp_millis(), customer_id)
    }

    pub fn payment_id(&self, now: DateTime<Utc>, customer_id: &str) -> String {
        format!("PAY-{}-{}", now.timestamp_millis(), customer_id)
    }
}
