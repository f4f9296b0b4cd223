//! Settlement gateway abstraction.
//!
//! Collection is simulated with a random draw; the probability differs
//! between first attempts and scheduled retries. Behind a trait so tests
//! can force either outcome.

use rand::Rng;

/// Which pass is attempting collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementAttempt {
    First,
    Retry,
}

pub trait SettlementGateway: Send + Sync {
    /// Attempt to collect; `true` means the payment settled.
    fn settle(&self, attempt: SettlementAttempt) -> bool;
}

/// Simulated gateway drawing success with a per-attempt-kind probability.
pub struct RandomDrawGateway {
    first_attempt_rate: f64,
    retry_rate: f64,
}

impl RandomDrawGateway {
    pub fn new(first_attempt_rate: f64, retry_rate: f64) -> Self {
        Self {
            first_attempt_rate,
            retry_rate,
        }
    }
}

impl SettlementGateway for RandomDrawGateway {
    fn settle(&self, attempt: SettlementAttempt) -> bool {
        let rate = match attempt {
            SettlementAttempt::First => self.first_attempt_rate,
            SettlementAttempt::Retry => self.retry_rate,
        };
        rand::thread_rng().gen_bool(rate.clamp(0.0, 1.0))
    }
}

/// Deterministic gateway for tests.
pub struct FixedOutcomeGateway {
    outcome: bool,
}

impl FixedOutcomeGateway {
    pub fn succeeding() -> Self {
        Self { outcome: true }
    }

    pub fn failing() -> Self {
        Self { outcome: false }
    }
}

impl SettlementGateway for FixedOutcomeGateway {
    fn settle(&self, _attempt: SettlementAttempt) -> bool {
        self.outcome
    }
}
