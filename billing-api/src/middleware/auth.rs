//! Caller identity extracted from gateway headers.
//!
//! Authentication happens upstream; the gateway forwards the verified
//! identity in `X-Customer-ID` and `X-Roles`. Handlers receive an explicit
//! [`Principal`] argument and decide access per resource instead of
//! trusting ambient request state.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";
pub const ROLES_HEADER: &str = "x-roles";

#[derive(Debug, Clone)]
pub struct Principal {
    pub customer_id: Option<String>,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == "admin")
    }

    pub fn require_customer_id(&self) -> Result<&str, AppError> {
        self.customer_id
            .as_deref()
            .ok_or_else(|| AppError::AuthError(anyhow::anyhow!("Missing customer identity")))
    }

    /// Admins can touch any customer; everyone else only their own records.
    pub fn ensure_can_access(&self, customer_id: &str) -> Result<(), AppError> {
        if self.is_admin() || self.customer_id.as_deref() == Some(customer_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(anyhow::anyhow!(
                "Not authorized to access this customer"
            )))
        }
    }

    pub fn ensure_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(anyhow::anyhow!(
                "Administrator role required"
            )))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer_id = parts
            .headers
            .get(CUSTOMER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string());

        let roles = parts
            .headers
            .get(ROLES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                v.split(',')
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|roles| !roles.is_empty())
            .unwrap_or_else(|| vec!["customer".to_string()]);

        Ok(Principal { customer_id, roles })
    }
}
