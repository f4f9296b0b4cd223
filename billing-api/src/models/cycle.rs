//! Billing cycle record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current paid period boundaries for one customer.
///
/// Keyed 1:1 by customer id in the billing-cycle store; overwritten on each
/// rollover or plan change, never versioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingCycle {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}
