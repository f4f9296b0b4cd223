//! Domain models for the billing API.

pub mod customer;
pub mod cycle;
pub mod invoice;
pub mod payment;
pub mod plan;

pub use customer::{Customer, SubscriptionStatus};
pub use cycle::BillingCycle;
pub use invoice::{Invoice, InvoiceStatus};
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use plan::{BillingInterval, PlanStatus, SubscriptionPlan};
