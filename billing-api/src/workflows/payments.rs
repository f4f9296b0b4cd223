//! Payment settlement and the scheduled retry pass.

use rust_decimal::Decimal;
use service_core::error::AppError;

use crate::models::{Invoice, InvoiceStatus, Payment, PaymentMethod, PaymentStatus};
use crate::services::metrics::PAYMENTS_PROCESSED_TOTAL;
use crate::services::SettlementAttempt;

use super::Workflows;

pub struct ProcessPaymentInput {
    pub invoice_id: String,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
}

impl Workflows {
    /// Settle an invoice. An insufficient amount is rejected before any
    /// record is written; a declined first attempt leaves a failed payment
    /// behind for the retry pass to pick up.
    pub async fn process_payment(
        &self,
        customer_id: &str,
        input: ProcessPaymentInput,
    ) -> Result<Payment, AppError> {
        if input.invoice_id.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!("Invalid payment data")));
        }
        if input.amount <= Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Payment amount must be positive"
            )));
        }

        let _guard = self.locks.acquire(customer_id).await;
        let invoice = self
            .stores()
            .invoices
            .get(&input.invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
        let customer = self.require_customer(customer_id).await?;
        if invoice.customer_id != customer.id {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "Invoice does not belong to this customer"
            )));
        }
        if invoice.payment_status == InvoiceStatus::Paid {
            return Err(AppError::Conflict(anyhow::anyhow!("Invoice is already paid")));
        }

        if input.amount < invoice.amount {
            PAYMENTS_PROCESSED_TOTAL
                .with_label_values(&["insufficient", "first"])
                .inc();
            self.notify_payment_result(&customer, &invoice.id, input.amount, false)
                .await;
            return Err(AppError::PaymentRequired(
                "Payment failed due to insufficient funds".to_string(),
            ));
        }

        let now = self.now();
        let settled = self.gateway.settle(SettlementAttempt::First);
        let payment = Payment {
            id: self.ids().payment_id(now, customer_id),
            invoice_id: invoice.id.clone(),
            customer_id: customer_id.to_string(),
            amount: input.amount,
            payment_method: input.payment_method,
            payment_date: now,
            status: if settled {
                PaymentStatus::Success
            } else {
                PaymentStatus::Failed
            },
        };
        self.stores().payments.put(&payment).await?;
        PAYMENTS_PROCESSED_TOTAL
            .with_label_values(&[payment.status.as_str(), "first"])
            .inc();

        if settled {
            self.mark_invoice_paid(invoice).await?;
            self.notify_payment_result(&customer, &payment.invoice_id, payment.amount, true)
                .await;
            tracing::info!(
                customer_id = %customer_id,
                payment_id = %payment.id,
                invoice_id = %payment.invoice_id,
                "Payment settled"
            );
            Ok(payment)
        } else {
            self.notify_payment_result(&customer, &payment.invoice_id, payment.amount, false)
                .await;
            tracing::warn!(
                customer_id = %customer_id,
                payment_id = %payment.id,
                invoice_id = %payment.invoice_id,
                "Payment declined"
            );
            Err(AppError::PaymentRequired("Payment failed".to_string()))
        }
    }

    /// Re-attempt every failed payment. Each payment is updated in place
    /// with the retry outcome and a fresh payment date, so one payment
    /// record tracks the latest attempt for its invoice. Returns how many
    /// payments settled this pass.
    pub async fn retry_failed_payments(&self) -> Result<u64, AppError> {
        let mut recovered = 0u64;
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .stores()
                .payments
                .list(
                    Some(PaymentStatus::Failed),
                    self.page_size,
                    cursor.as_deref(),
                )
                .await?;
            for payment in page.items {
                let payment_id = payment.id.clone();
                match self.retry_payment(payment).await {
                    Ok(true) => recovered += 1,
                    Ok(false) => {}
                    Err(e) => {
                        tracing::error!(payment_id = %payment_id, error = %e, "Failed to retry payment");
                    }
                }
            }
            cursor = page.next_cursor;
            if cursor.is_none() {
                break;
            }
        }
        self.locks.evict_unlocked();
        tracing::info!(payments_recovered = recovered, "Payment retry pass completed");
        Ok(recovered)
    }

    async fn retry_payment(&self, mut payment: Payment) -> Result<bool, AppError> {
        let _guard = self.locks.acquire(&payment.customer_id).await;

        let invoice = self
            .stores()
            .invoices
            .get(&payment.invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
        // The invoice may have been settled through another channel since
        // this payment failed.
        if invoice.payment_status == InvoiceStatus::Paid {
            return Ok(false);
        }
        let customer = self.require_customer(&payment.customer_id).await?;

        let settled = self.gateway.settle(SettlementAttempt::Retry);
        payment.status = if settled {
            PaymentStatus::Success
        } else {
            PaymentStatus::Failed
        };
        payment.payment_date = self.now();
        self.stores().payments.put(&payment).await?;
        PAYMENTS_PROCESSED_TOTAL
            .with_label_values(&[payment.status.as_str(), "retry"])
            .inc();

        if settled {
            self.mark_invoice_paid(invoice).await?;
            self.notify_payment_result(&customer, &payment.invoice_id, payment.amount, true)
                .await;
            tracing::info!(
                payment_id = %payment.id,
                invoice_id = %payment.invoice_id,
                "Payment recovered on retry"
            );
            Ok(true)
        } else {
            self.notify_payment_result(&customer, &payment.invoice_id, payment.amount, false)
                .await;
            Ok(false)
        }
    }

    async fn mark_invoice_paid(&self, mut invoice: Invoice) -> Result<(), AppError> {
        invoice.payment_status = InvoiceStatus::Paid;
        invoice.payment_date = Some(self.now());
        self.stores().invoices.put(&invoice).await
    }
}
