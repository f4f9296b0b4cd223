//! Recurring invoice generation, single-customer and batch.

use service_core::error::AppError;

use crate::billing::{cycle_end_date, is_invoice_due};
use crate::models::{BillingCycle, Customer, Invoice, InvoiceStatus, SubscriptionPlan};
use crate::services::metrics::{BILLING_RUNS_TOTAL, INVOICES_GENERATED_TOTAL};

use super::Workflows;

impl Workflows {
    /// Generate the next recurring invoice for one customer, regardless of
    /// whether the period end is near. Rolls the billing period forward.
    pub async fn generate_invoice(&self, customer_id: &str) -> Result<Invoice, AppError> {
        let _guard = self.locks.acquire(customer_id).await;
        let customer = self.require_customer(customer_id).await?;
        if !customer.has_active_subscription() {
            return Err(AppError::InvalidState(anyhow::anyhow!(
                "Customer does not have an active subscription"
            )));
        }
        let plan_id = customer.subscription_plan_id.clone().ok_or_else(|| {
            AppError::InvalidState(anyhow::anyhow!("Customer does not have an active subscription"))
        })?;
        let plan = self.require_plan(&plan_id).await?;
        let cycle = self
            .stores()
            .cycles
            .get(customer_id)
            .await?
            .ok_or_else(|| {
                AppError::InvalidState(anyhow::anyhow!("Billing cycle data not found"))
            })?;
        self.issue_recurring_invoice(customer, &plan, cycle).await
    }

    /// Persist the invoice for the period that is ending, then advance the
    /// subscription and billing period by one cycle. The notification sits
    /// between the two writes and is best-effort, matching the order
    /// customers observe: invoice first, rolled period second.
    async fn issue_recurring_invoice(
        &self,
        mut customer: Customer,
        plan: &SubscriptionPlan,
        cycle: BillingCycle,
    ) -> Result<Invoice, AppError> {
        let now = self.now();
        let invoice = Invoice {
            id: self.ids().invoice_id(now, &customer.id),
            customer_id: customer.id.clone(),
            amount: plan.price,
            due_date: cycle.end_date,
            payment_status: InvoiceStatus::Pending,
            payment_date: None,
        };
        self.stores().invoices.put(&invoice).await?;
        INVOICES_GENERATED_TOTAL.inc();
        self.notify_invoice_created(&customer, &invoice).await;

        let next_start = cycle.end_date;
        let next_end = cycle_end_date(&plan.billing_cycle, next_start);
        customer.subscription_start_date = Some(next_start);
        customer.subscription_end_date = Some(next_end);
        self.stores().customers.put(&customer).await?;
        self.stores()
            .cycles
            .put(
                &customer.id,
                &BillingCycle {
                    start_date: next_start,
                    end_date: next_end,
                },
            )
            .await?;

        tracing::info!(
            customer_id = %customer.id,
            invoice_id = %invoice.id,
            amount = %invoice.amount,
            "Invoice generated"
        );
        Ok(invoice)
    }

    /// Walk every customer (or one, when `only` is set) and invoice those
    /// whose billing period end falls inside the plan's due window. A
    /// customer that fails is logged and skipped; the run keeps going.
    /// Returns how many invoices were generated.
    pub async fn run_billing_batch(&self, only: Option<&str>) -> Result<u64, AppError> {
        let mut generated = 0u64;

        if let Some(customer_id) = only {
            let customer = self.require_customer(customer_id).await?;
            if self.bill_if_due(&customer.id).await {
                generated += 1;
            }
        } else {
            let mut cursor: Option<String> = None;
            loop {
                let page = self
                    .stores()
                    .customers
                    .list(self.page_size, cursor.as_deref())
                    .await?;
                for customer in &page.items {
                    if self.bill_if_due(&customer.id).await {
                        generated += 1;
                    }
                }
                cursor = page.next_cursor;
                if cursor.is_none() {
                    break;
                }
            }
        }

        self.locks.evict_unlocked();
        BILLING_RUNS_TOTAL.with_label_values(&["completed"]).inc();
        tracing::info!(invoices_generated = generated, "Billing run completed");
        Ok(generated)
    }

    /// One customer's slice of the batch. Re-reads the customer under the
    /// lock so the due check runs against fresh state. Never propagates an
    /// error; any problem is logged and counts as "not billed".
    async fn bill_if_due(&self, customer_id: &str) -> bool {
        let _guard = self.locks.acquire(customer_id).await;

        let customer = match self.stores().customers.get(customer_id).await {
            Ok(Some(c)) => c,
            Ok(None) => return false,
            Err(e) => {
                tracing::error!(customer_id = %customer_id, error = %e, "Failed to load customer during billing run");
                return false;
            }
        };
        if !customer.has_active_subscription() {
            return false;
        }
        let plan_id = match &customer.subscription_plan_id {
            Some(id) => id.clone(),
            None => return false,
        };
        let plan = match self.stores().plans.get(&plan_id).await {
            Ok(Some(p)) => p,
            Ok(None) => {
                tracing::warn!(customer_id = %customer_id, plan_id = %plan_id, "Subscribed plan no longer exists, skipping");
                return false;
            }
            Err(e) => {
                tracing::error!(customer_id = %customer_id, error = %e, "Failed to load plan during billing run");
                return false;
            }
        };
        let end = match customer.subscription_end_date {
            Some(end) => end,
            None => {
                tracing::warn!(customer_id = %customer_id, "Active subscription has no end date, skipping");
                return false;
            }
        };
        if !is_invoice_due(end, &plan.billing_cycle, self.now()) {
            return false;
        }
        let cycle = match self.stores().cycles.get(customer_id).await {
            Ok(Some(c)) => c,
            Ok(None) => {
                tracing::error!(customer_id = %customer_id, "Invalid billing cycle data, skipping");
                return false;
            }
            Err(e) => {
                tracing::error!(customer_id = %customer_id, error = %e, "Failed to load billing cycle during billing run");
                return false;
            }
        };
        match self.issue_recurring_invoice(customer, &plan, cycle).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(customer_id = %customer_id, error = %e, "Failed to generate invoice during billing run");
                false
            }
        }
    }
}
