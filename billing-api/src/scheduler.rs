//! Background loops: the daily billing run and the payment retry pass.

use std::sync::Arc;
use std::time::Duration;

use crate::config::BillingConfig;
use crate::services::metrics::BILLING_RUNS_TOTAL;
use crate::workflows::Workflows;

/// Spawn both loops. An interval of zero leaves that loop disabled.
pub fn spawn(workflows: Arc<Workflows>, config: &BillingConfig) {
    if config.billing_run_interval_secs > 0 {
        let every = Duration::from_secs(config.billing_run_interval_secs);
        let wf = workflows.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(every).await;
                tracing::info!("Starting scheduled billing run");
                match wf.run_billing_batch(None).await {
                    Ok(generated) => {
                        tracing::info!(invoices_generated = generated, "Scheduled billing run finished");
                    }
                    Err(e) => {
                        BILLING_RUNS_TOTAL.with_label_values(&["failed"]).inc();
                        tracing::error!(error = %e, "Scheduled billing run failed");
                    }
                }
            }
        });
    }

    if config.payment_retry_interval_secs > 0 {
        let every = Duration::from_secs(config.payment_retry_interval_secs);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(every).await;
                tracing::info!("Starting scheduled payment retry pass");
                match workflows.retry_failed_payments().await {
                    Ok(recovered) => {
                        tracing::info!(payments_recovered = recovered, "Scheduled payment retry pass finished");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Scheduled payment retry pass failed");
                    }
                }
            }
        });
    }
}
