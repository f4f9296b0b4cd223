//! Invoice model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Invoice payment status.
///
/// `Overdue` is a read-time classification, never persisted: a `Pending`
/// invoice whose due date has passed reports as overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
}

/// Invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(rename = "_id")]
    pub id: String,
    pub customer_id: String,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub payment_status: InvoiceStatus,
    pub payment_date: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Status as seen by callers: pending invoices past their due date
    /// classify as overdue.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvoiceStatus {
        if self.payment_status == InvoiceStatus::Pending && self.due_date < now {
            InvoiceStatus::Overdue
        } else {
            self.payment_status
        }
    }
}
