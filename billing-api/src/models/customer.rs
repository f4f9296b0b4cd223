//! Customer model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Customer subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Inactive,
    Active,
    Pending,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "active" => SubscriptionStatus::Active,
            "pending" => SubscriptionStatus::Pending,
            "cancelled" => SubscriptionStatus::Cancelled,
            _ => SubscriptionStatus::Inactive,
        }
    }
}

/// Customer record.
///
/// Invariant: `subscription_status == Active` implies `subscription_plan_id`
/// and both subscription dates are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub subscription_plan_id: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub subscription_start_date: Option<DateTime<Utc>>,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub roles: Vec<String>,
}

impl Customer {
    pub fn default_roles() -> Vec<String> {
        vec!["customer".to_string()]
    }

    pub fn has_active_subscription(&self) -> bool {
        self.subscription_status == SubscriptionStatus::Active
            && self.subscription_plan_id.is_some()
    }
}
