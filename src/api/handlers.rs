use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;

use crate::api::requests::CreateTopupRequest;
use crate::api::responses::{
    ApiResponse, BalanceResponse, CallbackAck, ErrorResponse, HealthResponse, ServiceHealth,
    TransactionResponse, ValidationErrorDetail,
};
use crate::error::AppError;
use crate::observability::health::AggregatedHealth;
use crate::observability::{get_metrics, LatencyTimer};
use crate::services::{Reconciler, TopupService};

use super::routes::AppState;

/// Header carrying the provider's HMAC signature over the raw request body.
pub const SIGNATURE_HEADER: &str = "X-Callback-Signature";

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let db_healthy = sqlx::query("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();

    let response = HealthResponse {
        status: if db_healthy { "healthy".to_string() } else { "degraded".to_string() },
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        services: ServiceHealth {
            database: db_healthy,
        },
    };

    Json(ApiResponse::success(response))
}

/// Detailed health check with per-dependency latency.
pub async fn detailed_health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AggregatedHealth>>, StatusCode> {
    match state.health_checker.as_ref() {
        Some(checker) => Ok(Json(ApiResponse::success(checker.check_all().await))),
        None => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

/// Readiness check endpoint.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    let db_healthy = sqlx::query("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();

    if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Liveness check endpoint.
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Prometheus metrics endpoint.
pub async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, StatusCode> {
    match state.metrics_handle.as_ref() {
        Some(handle) => Ok(handle.render()),
        None => Err(StatusCode::NOT_FOUND),
    }
}

// ============================================================================
// Callback Handlers
// ============================================================================

/// Receives a payment status callback from the provider.
///
/// The body is taken as raw bytes so the signature is checked over exactly
/// what the provider sent. Parsing happens only after verification.
pub async fn payment_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<CallbackAck>) {
    let timer = LatencyTimer::new();

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let source = headers
        .get("X-Forwarded-For")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .unwrap_or("unknown");

    let reconciler = Reconciler::new(
        state.pool.clone(),
        state.verifier.clone(),
        state.provider.clone(),
    );

    let result = reconciler.reconcile_callback(&body, signature, source).await;
    get_metrics().record_callback_latency(timer.elapsed_ms());

    match result {
        Ok(_) => (StatusCode::OK, Json(CallbackAck::ok())),
        Err(AppError::Unauthorized(msg)) => {
            (StatusCode::UNAUTHORIZED, Json(CallbackAck::rejected(msg)))
        }
        Err(AppError::Validation(msg)) => {
            (StatusCode::BAD_REQUEST, Json(CallbackAck::rejected(msg)))
        }
        Err(AppError::NotFound(msg)) => (StatusCode::NOT_FOUND, Json(CallbackAck::rejected(msg))),
        Err(AppError::Conflict(msg)) => (StatusCode::CONFLICT, Json(CallbackAck::rejected(msg))),
        Err(e) => {
            tracing::error!("Failed to process callback: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CallbackAck::rejected("An internal error occurred")),
            )
        }
    }
}

// ============================================================================
// Top-up Handlers
// ============================================================================

/// Create a new top-up transaction.
pub async fn create_topup(
    State(state): State<AppState>,
    Json(request): Json<CreateTopupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionResponse>>), (StatusCode, Json<ApiResponse<()>>)>
{
    if let Err(errors) = request.validate() {
        let details: Vec<ValidationErrorDetail> = errors
            .iter()
            .map(|e| ValidationErrorDetail {
                field: e.field.clone(),
                message: e.message.clone(),
            })
            .collect();

        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(
                ErrorResponse::new("VALIDATION_ERROR", "Request validation failed")
                    .with_details(details),
            )),
        ));
    }

    let topup_service = TopupService::new(
        state.pool.clone(),
        state.provider.clone(),
        state.topup.clone(),
    );

    match topup_service
        .create_topup(request.user_id, request.amount, request.method)
        .await
    {
        Ok(tx) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(TransactionResponse::from(tx))),
        )),
        Err(AppError::Validation(msg)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(ErrorResponse::new("VALIDATION_ERROR", msg))),
        )),
        Err(AppError::Provider(msg)) => {
            tracing::warn!("Provider rejected top-up creation: {}", msg);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::<()>::error(ErrorResponse::new("PROVIDER_ERROR", msg))),
            ))
        }
        Err(e) => {
            tracing::error!("Failed to create top-up: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(ErrorResponse::new(
                    "INTERNAL_ERROR",
                    "An internal error occurred",
                ))),
            ))
        }
    }
}

/// Get transaction by merchant reference.
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(merchant_ref): Path<String>,
) -> Result<Json<ApiResponse<TransactionResponse>>, (StatusCode, Json<ApiResponse<()>>)> {
    let topup_service = TopupService::new(
        state.pool.clone(),
        state.provider.clone(),
        state.topup.clone(),
    );

    match topup_service.get_transaction(&merchant_ref).await {
        Ok(tx) => Ok(Json(ApiResponse::success(TransactionResponse::from(tx)))),
        Err(AppError::NotFound(msg)) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error(ErrorResponse::new("NOT_FOUND", msg))),
        )),
        Err(e) => {
            tracing::error!("Failed to get transaction: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(ErrorResponse::new(
                    "INTERNAL_ERROR",
                    "An internal error occurred",
                ))),
            ))
        }
    }
}

/// Re-query the provider for a transaction's current status and apply it.
pub async fn reconcile_transaction(
    State(state): State<AppState>,
    Path(merchant_ref): Path<String>,
) -> Result<Json<ApiResponse<TransactionResponse>>, (StatusCode, Json<ApiResponse<()>>)> {
    let reconciler = Reconciler::new(
        state.pool.clone(),
        state.verifier.clone(),
        state.provider.clone(),
    );

    match reconciler.reconcile_remote(&merchant_ref).await {
        Ok(tx) => Ok(Json(ApiResponse::success(TransactionResponse::from(tx)))),
        Err(AppError::NotFound(msg)) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error(ErrorResponse::new("NOT_FOUND", msg))),
        )),
        Err(AppError::Validation(msg)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(ErrorResponse::new("VALIDATION_ERROR", msg))),
        )),
        Err(AppError::Conflict(msg)) => Err((
            StatusCode::CONFLICT,
            Json(ApiResponse::<()>::error(ErrorResponse::new("CONFLICT", msg))),
        )),
        Err(AppError::Provider(msg)) => {
            tracing::warn!("Provider lookup failed during reconcile: {}", msg);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::<()>::error(ErrorResponse::new("PROVIDER_ERROR", msg))),
            ))
        }
        Err(e) => {
            tracing::error!("Failed to reconcile transaction: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(ErrorResponse::new(
                    "INTERNAL_ERROR",
                    "An internal error occurred",
                ))),
            ))
        }
    }
}

// ============================================================================
// Wallet Handlers
// ============================================================================

/// Get a user's wallet balance.
pub async fn get_wallet_balance(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<BalanceResponse>>, (StatusCode, Json<ApiResponse<()>>)> {
    let topup_service = TopupService::new(
        state.pool.clone(),
        state.provider.clone(),
        state.topup.clone(),
    );

    match topup_service.get_balance(user_id).await {
        Ok(balance) => Ok(Json(ApiResponse::success(BalanceResponse::from(balance)))),
        Err(AppError::NotFound(msg)) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error(ErrorResponse::new("NOT_FOUND", msg))),
        )),
        Err(e) => {
            tracing::error!("Failed to get wallet balance: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(ErrorResponse::new(
                    "INTERNAL_ERROR",
                    "An internal error occurred",
                ))),
            ))
        }
    }
}
