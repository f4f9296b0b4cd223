//! Outbound customer notifications.
//!
//! Delivery is best-effort relative to billing state: workflows log a
//! failure and move on, they never roll back a persisted invoice or
//! payment because an email did not go out.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, Secret};
use serde_json::json;
use service_core::error::AppError;
use std::time::Duration;

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_invoice_created(
        &self,
        email: &str,
        invoice_id: &str,
        amount: Decimal,
        due_date: DateTime<Utc>,
    ) -> Result<(), AppError>;

    async fn send_payment_succeeded(
        &self,
        email: &str,
        invoice_id: &str,
        amount: Decimal,
    ) -> Result<(), AppError>;

    async fn send_payment_failed(
        &self,
        email: &str,
        invoice_id: &str,
        amount: Decimal,
    ) -> Result<(), AppError>;
}

/// Notifier posting to a SendGrid-compatible mail API.
pub struct EmailNotifier {
    http: reqwest::Client,
    api_url: String,
    api_key: Secret<String>,
    from_email: String,
}

impl EmailNotifier {
    pub fn new(api_url: String, api_key: Secret<String>, from_email: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_url,
            api_key,
            from_email,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.expose_secret().is_empty()
    }

    async fn send_email(&self, to: &str, subject: &str, text: &str) -> Result<(), AppError> {
        if !self.is_configured() {
            tracing::debug!(to = %to, subject = %subject, "Email API not configured, skipping send");
            return Ok(());
        }

        let body = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from_email },
            "subject": subject,
            "content": [
                { "type": "text/plain", "value": text },
                { "type": "text/html", "value": format!("<p>{}</p>", text) },
            ],
        });

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::EmailError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::EmailError(format!(
                "mail API returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl NotificationSender for EmailNotifier {
    async fn send_invoice_created(
        &self,
        email: &str,
        invoice_id: &str,
        amount: Decimal,
        due_date: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let subject = format!("New Invoice Generated - {}", invoice_id);
        let text = format!(
            "A new invoice ({}) for ${} has been generated. It is due on {}.",
            invoice_id,
            amount,
            due_date.to_rfc3339()
        );
        self.send_email(email, &subject, &text).await
    }

    async fn send_payment_succeeded(
        &self,
        email: &str,
        invoice_id: &str,
        amount: Decimal,
    ) -> Result<(), AppError> {
        let subject = format!("Payment Successful - Invoice {}", invoice_id);
        let text = format!(
            "Your payment of ${} for invoice {} has been successfully processed.",
            amount, invoice_id
        );
        self.send_email(email, &subject, &text).await
    }

    async fn send_payment_failed(
        &self,
        email: &str,
        invoice_id: &str,
        amount: Decimal,
    ) -> Result<(), AppError> {
        let subject = format!("Payment Failed - Invoice {}", invoice_id);
        let text = format!(
            "Your payment of ${} for invoice {} has failed. Please update your payment method and try again.",
            amount, invoice_id
        );
        self.send_email(email, &subject, &text).await
    }
}

/// No-op notifier for tests.
pub struct NullNotifier;

#[async_trait]
impl NotificationSender for NullNotifier {
    async fn send_invoice_created(
        &self,
        _email: &str,
        _invoice_id: &str,
        _amount: Decimal,
        _due_date: DateTime<Utc>,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn send_payment_succeeded(
        &self,
        _email: &str,
        _invoice_id: &str,
        _amount: Decimal,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn send_payment_failed(
        &self,
        _email: &str,
        _invoice_id: &str,
        _amount: Decimal,
    ) -> Result<(), AppError> {
        Ok(())
    }
}
