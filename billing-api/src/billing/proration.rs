//! Pure date arithmetic and proration math.
//!
//! Every function takes the current time from the caller so workflows stay
//! deterministic under test. Cycle names are matched as strings with
//! explicit fallbacks: an unrecognized cycle bills like a monthly one for
//! proration purposes, never advances a period, and never triggers a
//! recurring invoice.

use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;

use crate::models::SubscriptionPlan;

const SECONDS_PER_DAY: i64 = 86_400;

/// Nominal days in a billing cycle. A fixed approximation used as the
/// proration denominator, not a calendar computation.
pub fn days_in_cycle(cycle: &str) -> i64 {
    match cycle {
        "quarterly" => 90,
        "yearly" => 365,
        _ => 30,
    }
}

/// End date of the cycle starting at `start`.
///
/// Returns `start` unchanged for an unrecognized cycle; callers must treat
/// that as a "no advance" signal, not an error.
pub fn cycle_end_date(cycle: &str, start: DateTime<Utc>) -> DateTime<Utc> {
    let months = match cycle {
        "monthly" => 1,
        "quarterly" => 3,
        "yearly" => 12,
        _ => return start,
    };
    start.checked_add_months(Months::new(months)).unwrap_or(start)
}

/// Whether a recurring invoice should be generated for a subscription
/// ending at `end`. Each cycle has its own lead-time threshold; an unknown
/// cycle never triggers.
pub fn is_invoice_due(end: DateTime<Utc>, cycle: &str, now: DateTime<Utc>) -> bool {
    let days_until_end =
        ((end - now).num_seconds() as f64 / SECONDS_PER_DAY as f64).ceil() as i64;

    match cycle {
        "monthly" => days_until_end <= 3,
        "quarterly" => days_until_end <= 7,
        "yearly" => days_until_end <= 14,
        _ => false,
    }
}

/// Net amount owed when switching plans mid-cycle: the prorated charge for
/// the new plan minus the prorated refund for the unused part of the old
/// one. Negative results (net credit) are preserved, not clamped.
pub fn prorated_amount(
    old_plan: Option<&SubscriptionPlan>,
    new_plan: &SubscriptionPlan,
    old_end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Decimal {
    let days_left =
        Decimal::from((old_end - now).num_seconds()) / Decimal::from(SECONDS_PER_DAY);
    let cycle = old_plan
        .map(|p| p.billing_cycle.as_str())
        .unwrap_or(new_plan.billing_cycle.as_str());
    let total_days = Decimal::from(days_in_cycle(cycle));

    let refund = old_plan
        .map(|p| p.price * days_left / total_days)
        .unwrap_or(Decimal::ZERO);
    let charge = new_plan.price * days_left / total_days;

    charge - refund
}
