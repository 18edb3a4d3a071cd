use axum::{
    routing::{get, post},
    Router,
};
use http::HeaderName;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::config::TopupSettings;
use crate::observability::HealthChecker;
use crate::provider::{ProviderGateway, SignatureVerifier};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub verifier: SignatureVerifier,
    pub provider: Arc<dyn ProviderGateway>,
    pub topup: TopupSettings,
    pub metrics_handle: Option<PrometheusHandle>,
    pub health_checker: Option<Arc<HealthChecker>>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        verifier: SignatureVerifier,
        provider: Arc<dyn ProviderGateway>,
        topup: TopupSettings,
    ) -> Self {
        Self {
            pool,
            verifier,
            provider,
            topup,
            metrics_handle: None,
            health_checker: None,
        }
    }

    /// Adds metrics handle to the state.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Adds health checker to the state.
    pub fn with_health_checker(mut self, checker: Arc<HealthChecker>) -> Self {
        self.health_checker = Some(checker);
        self
    }
}

/// Creates the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/detailed", get(handlers::detailed_health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/live", get(handlers::liveness_check))
        // Metrics endpoint
        .route("/metrics", get(handlers::metrics_endpoint))
        // Provider callback endpoint
        .route("/callbacks/payment", post(handlers::payment_callback))
        // Transaction endpoints
        .route("/transactions", post(handlers::create_topup))
        .route("/transactions/:merchant_ref", get(handlers::get_transaction))
        .route(
            "/transactions/:merchant_ref/reconcile",
            post(handlers::reconcile_transaction),
        )
        // Wallet endpoints
        .route("/wallets/:user_id/balance", get(handlers::get_wallet_balance))
        // Layers run outermost-last: the request id is assigned before the
        // trace span opens, and propagated onto the response on the way out.
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
        .with_state(state)
}
