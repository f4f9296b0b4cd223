//! Billing-cycle and proration engine.

pub mod proration;

pub use proration::{cycle_end_date, days_in_cycle, is_invoice_due, prorated_amount};
