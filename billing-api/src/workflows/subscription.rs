//! Subscription lifecycle: create, assign, change plan, cancel.

use service_core::error::AppError;

use crate::billing::{cycle_end_date, prorated_amount};
use crate::models::{
    BillingCycle, Customer, Invoice, InvoiceStatus, SubscriptionPlan, SubscriptionStatus,
};
use crate::services::metrics::INVOICES_GENERATED_TOTAL;

use super::Workflows;

impl Workflows {
    /// Customer plus the plan they are subscribed to.
    pub async fn subscription_of(
        &self,
        customer_id: &str,
    ) -> Result<(Customer, SubscriptionPlan), AppError> {
        let customer = self.require_customer(customer_id).await?;
        let plan_id = customer.subscription_plan_id.clone().ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Customer does not have a subscription"))
        })?;
        let plan = self.require_plan(&plan_id).await?;
        Ok((customer, plan))
    }

    /// Customer, plan and the current billing period in one read.
    pub async fn subscription_details(
        &self,
        customer_id: &str,
    ) -> Result<(Customer, SubscriptionPlan, BillingCycle), AppError> {
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
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Billing cycle not found")))?;
        Ok((customer, plan, cycle))
    }

    /// First-time subscription. Refused when the customer already holds a
    /// plan; plan changes go through [`Workflows::change_plan`].
    pub async fn create_subscription(
        &self,
        customer_id: &str,
        plan_id: &str,
    ) -> Result<Customer, AppError> {
        let _guard = self.locks.acquire(customer_id).await;
        let customer = self.require_customer(customer_id).await?;
        if customer.subscription_plan_id.is_some() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Customer already has a subscription"
            )));
        }
        let plan = self.require_plan(plan_id).await?;
        self.activate_plan(customer, &plan).await
    }

    /// Administrative plan assignment. Overwrites whatever subscription the
    /// customer currently holds without raising a proration invoice.
    pub async fn assign_plan(
        &self,
        customer_id: &str,
        plan_id: &str,
    ) -> Result<Customer, AppError> {
        let _guard = self.locks.acquire(customer_id).await;
        let customer = self.require_customer(customer_id).await?;
        let plan = self.require_plan(plan_id).await?;
        self.activate_plan(customer, &plan).await
    }

    async fn activate_plan(
        &self,
        mut customer: Customer,
        plan: &SubscriptionPlan,
    ) -> Result<Customer, AppError> {
        let now = self.now();
        let end = cycle_end_date(&plan.billing_cycle, now);
        customer.subscription_plan_id = Some(plan.id.clone());
        customer.subscription_status = SubscriptionStatus::Active;
        customer.subscription_start_date = Some(now);
        customer.subscription_end_date = Some(end);
        self.stores().customers.put(&customer).await?;
        self.stores()
            .cycles
            .put(
                &customer.id,
                &BillingCycle {
                    start_date: now,
                    end_date: end,
                },
            )
            .await?;
        tracing::info!(
            customer_id = %customer.id,
            plan_id = %plan.id,
            "Subscription activated"
        );
        Ok(customer)
    }

    /// Mid-cycle plan change. Raises a proration invoice for the unused
    /// remainder of the old plan against the same remainder of the new one,
    /// then restarts the billing period on the new plan from now.
    pub async fn change_plan(
        &self,
        customer_id: &str,
        new_plan_id: &str,
    ) -> Result<Invoice, AppError> {
        let _guard = self.locks.acquire(customer_id).await;
        let mut customer = self.require_customer(customer_id).await?;
        let old_plan_id = customer.subscription_plan_id.clone().ok_or_else(|| {
            AppError::InvalidState(anyhow::anyhow!("Customer does not have an active subscription"))
        })?;
        let new_plan = self.require_plan(new_plan_id).await?;
        // A dangling old plan id degrades to charge-only proration.
        let old_plan = self.stores().plans.get(&old_plan_id).await?;

        let now = self.now();
        let old_end = customer.subscription_end_date.unwrap_or(now);
        let amount = prorated_amount(old_plan.as_ref(), &new_plan, old_end, now);

        let invoice = Invoice {
            id: self.ids().plan_change_invoice_id(now, customer_id),
            customer_id: customer_id.to_string(),
            amount,
            due_date: now,
            payment_status: InvoiceStatus::Pending,
            payment_date: None,
        };
        self.stores().invoices.put(&invoice).await?;
        INVOICES_GENERATED_TOTAL.inc();
        self.notify_invoice_created(&customer, &invoice).await;

        let new_end = cycle_end_date(&new_plan.billing_cycle, now);
        customer.subscription_plan_id = Some(new_plan.id.clone());
        customer.subscription_start_date = Some(now);
        customer.subscription_end_date = Some(new_end);
        self.stores().customers.put(&customer).await?;
        self.stores()
            .cycles
            .put(
                customer_id,
                &BillingCycle {
                    start_date: now,
                    end_date: new_end,
                },
            )
            .await?;

        tracing::info!(
            customer_id = %customer_id,
            old_plan_id = %old_plan_id,
            new_plan_id = %new_plan.id,
            amount = %invoice.amount,
            "Plan changed with proration invoice"
        );
        Ok(invoice)
    }

    /// Cancel an existing subscription. The plan id is kept for history;
    /// the end date records when service stops.
    pub async fn cancel_subscription(&self, customer_id: &str) -> Result<Customer, AppError> {
        let _guard = self.locks.acquire(customer_id).await;
        let customer = self.require_customer(customer_id).await?;
        if customer.subscription_plan_id.is_none() {
            return Err(AppError::InvalidState(anyhow::anyhow!(
                "Customer does not have a subscription to cancel"
            )));
        }
        self.apply_status(customer, SubscriptionStatus::Cancelled)
            .await
    }

    /// Directly set the subscription status. Cancelling also stamps the end
    /// date to now.
    pub async fn update_subscription_status(
        &self,
        customer_id: &str,
        status: SubscriptionStatus,
    ) -> Result<Customer, AppError> {
        let _guard = self.locks.acquire(customer_id).await;
        let customer = self.require_customer(customer_id).await?;
        self.apply_status(customer, status).await
    }

    async fn apply_status(
        &self,
        mut customer: Customer,
        status: SubscriptionStatus,
    ) -> Result<Customer, AppError> {
        customer.subscription_status = status;
        if status == SubscriptionStatus::Cancelled {
            customer.subscription_end_date = Some(self.now());
        }
        self.stores().customers.put(&customer).await?;
        tracing::info!(
            customer_id = %customer.id,
            status = %status.as_str(),
            "Subscription status updated"
        );
        Ok(customer)
    }
}
