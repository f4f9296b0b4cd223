//! Subscription plan model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Billing interval for plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingInterval {
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingInterval::Monthly => "monthly",
            BillingInterval::Quarterly => "quarterly",
            BillingInterval::Yearly => "yearly",
        }
    }
}

/// Plan status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Active,
    Inactive,
}

/// Subscription plan.
///
/// `billing_cycle` is stored as a plain string; the proration engine treats
/// unrecognized values with documented fallbacks rather than failing.
/// Price and cycle changes apply only to future invoices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub billing_cycle: String,
    pub features: Vec<String>,
    pub status: PlanStatus,
}
