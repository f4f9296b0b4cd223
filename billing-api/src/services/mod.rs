//! Collaborator services: storage, clock, ids, settlement, notifications,
//! metrics.

pub mod clock;
pub mod ids;
pub mod memory;
pub mod metrics;
pub mod mongo;
pub mod notification;
pub mod settlement;
pub mod stores;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ids::IdGenerator;
pub use memory::InMemoryStores;
pub use metrics::{gather_metrics, init_metrics};
pub use mongo::MongoStores;
pub use notification::{EmailNotifier, NotificationSender, NullNotifier};
pub use settlement::{FixedOutcomeGateway, RandomDrawGateway, SettlementAttempt, SettlementGateway};
pub use stores::{
    BillingCycleStore, CustomerStore, InvoiceStore, Page, PaymentStore, PlanStore, Stores,
};
