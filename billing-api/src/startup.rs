//! Application wiring and the HTTP router.

use std::sync::Arc;

use axum::middleware as axum_middleware;
use axum::routing::{get, post};
use axum::Router;
use mongodb::options::ClientOptions;
use mongodb::Client;
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::request_id_middleware;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handlers;
use crate::scheduler;
use crate::services::metrics::init_metrics;
use crate::services::{EmailNotifier, MongoStores, RandomDrawGateway, SystemClock};
use crate::workflows::Workflows;

#[derive(Clone)]
pub struct AppState {
    pub workflows: Arc<Workflows>,
}

/// The full route table over any [`AppState`]. Public so tests can drive
/// the router against in-memory stores without binding a socket.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .route("/customers", post(handlers::customers::create_customer))
        .route("/customers", get(handlers::customers::list_customers))
        .route(
            "/customers/:customer_id",
            get(handlers::customers::get_customer).put(handlers::customers::upsert_customer),
        )
        .route(
            "/customers/:customer_id/subscription",
            get(handlers::subscriptions::get_subscription)
                .post(handlers::subscriptions::create_subscription)
                .put(handlers::subscriptions::change_plan)
                .delete(handlers::subscriptions::cancel_subscription)
                .patch(handlers::subscriptions::patch_subscription),
        )
        .route(
            "/customers/:customer_id/subscription/details",
            get(handlers::subscriptions::get_subscription_details),
        )
        .route("/plans", post(handlers::plans::create_plan).get(handlers::plans::list_plans))
        .route(
            "/plans/:plan_id",
            get(handlers::plans::get_plan)
                .put(handlers::plans::update_plan)
                .delete(handlers::plans::delete_plan),
        )
        .route("/invoices", get(handlers::invoices::list_invoices))
        .route("/invoices/:invoice_id", get(handlers::invoices::get_invoice))
        .route("/payments", post(handlers::payments::process_payment))
        .route("/payments", get(handlers::payments::list_payments))
        .route(
            "/payments/retry",
            post(handlers::payments::retry_failed_payments),
        )
        .route("/payments/:payment_id", get(handlers::payments::get_payment))
        .route("/billing/run", post(handlers::billing::run_billing))
        .route(
            "/billing/customers/:customer_id/invoice",
            post(handlers::billing::generate_invoice),
        )
        .layer(axum_middleware::from_fn(metrics_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
    config: Config,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self, AppError> {
        init_metrics();

        let mut options = ClientOptions::parse(config.database.url.expose_secret())
            .await
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid MongoDB URL: {}", e)))?;
        options.app_name = Some(config.observability.service_name.clone());
        let client = Client::with_options(options)?;
        let db = client.database(&config.database.db_name);

        let mongo = Arc::new(MongoStores::new(&db));
        mongo.init_indexes().await?;
        mongo.health_check().await?;
        let stores = mongo.stores();

        let notifier = Arc::new(EmailNotifier::new(
            config.email.api_url.clone(),
            config.email.api_key.clone(),
            config.email.from_email.clone(),
        ));
        let gateway = Arc::new(RandomDrawGateway::new(
            config.billing.first_attempt_success_rate,
            config.billing.retry_success_rate,
        ));
        let clock = Arc::new(SystemClock);

        let workflows = Arc::new(Workflows::new(
            stores,
            notifier,
            gateway,
            clock,
            config.billing.page_size,
        ));

        let address = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(&address).await?;
        let port = listener.local_addr()?.port();
        tracing::info!(address = %address, port = port, "Server listening");

        Ok(Self {
            port,
            listener,
            state: AppState { workflows },
            config,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        scheduler::spawn(self.state.workflows.clone(), &self.config.billing);
        let app = router(self.state);
        axum::serve(self.listener, app).await?;
        Ok(())
    }
}
