//! Environment-driven configuration.

use secrecy::Secret;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub email: EmailConfig,
    pub billing: BillingConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub db_name: String,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    pub from_email: String,
}

#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Settlement probability for first payment attempts.
    pub first_attempt_success_rate: f64,
    /// Settlement probability for scheduled retries.
    pub retry_success_rate: f64,
    /// Seconds between automatic billing runs; 0 disables the loop.
    pub billing_run_interval_secs: u64,
    /// Seconds between automatic payment retry passes; 0 disables the loop.
    pub payment_retry_interval_secs: u64,
    /// Page size for batch scans over customers and payments.
    pub page_size: i64,
}

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env_or("BILLING_HOST", "0.0.0.0"),
                port: parse_env_or("BILLING_PORT", 8080),
            },
            database: DatabaseConfig {
                url: Secret::new(env_or("MONGODB_URL", "mongodb://localhost:27017")),
                db_name: env_or("MONGODB_DB_NAME", "billing"),
            },
            email: EmailConfig {
                api_url: env_or("EMAIL_API_URL", "https://api.sendgrid.com/v3/mail/send"),
                api_key: Secret::new(env_or("EMAIL_API_KEY", "")),
                from_email: env_or("EMAIL_FROM", "billing@example.com"),
            },
            billing: BillingConfig {
                first_attempt_success_rate: parse_env_or("PAYMENT_SUCCESS_RATE", 0.9),
                retry_success_rate: parse_env_or("PAYMENT_RETRY_SUCCESS_RATE", 0.7),
                billing_run_interval_secs: parse_env_or("BILLING_RUN_INTERVAL_SECS", 86_400),
                payment_retry_interval_secs: parse_env_or("PAYMENT_RETRY_INTERVAL_SECS", 14_400),
                page_size: parse_env_or("BILLING_PAGE_SIZE", 100),
            },
            observability: ObservabilityConfig {
                service_name: env_or("SERVICE_NAME", "billing-api"),
                log_level: env_or("LOG_LEVEL", "info"),
                otlp_endpoint: env_or("OTLP_ENDPOINT", "http://localhost:4317"),
            },
        }
    }
}
