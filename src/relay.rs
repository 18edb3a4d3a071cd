//! Callback relay.
//!
//! A thin edge in front of the gateway: it accepts provider callbacks on a
//! public address and forwards them to the gateway's callback endpoint. The
//! body is passed through byte for byte and is never parsed here, so the
//! HMAC the gateway verifies is computed over exactly what the provider
//! signed. The relay holds no secrets and makes no judgement about the
//! payload; its only additions are the forwarding headers.

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::time::Duration;

use crate::api::responses::CallbackAck;
use crate::config::RelaySettings;
use crate::error::{AppError, Result};

/// Headers copied through to the gateway. Everything else is dropped.
const FORWARDED_HEADERS: [&str; 2] = ["X-Callback-Signature", "Content-Type"];

/// Relay state shared across handlers.
#[derive(Clone)]
pub struct RelayState {
    client: reqwest::Client,
    destination_url: String,
}

impl RelayState {
    pub fn new(settings: &RelaySettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.forward_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            destination_url: settings.destination_url.clone(),
        })
    }
}

/// Creates the relay router.
pub fn create_relay_router(state: RelayState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/callbacks/payment", post(forward_callback))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Forwards one callback delivery to the gateway.
///
/// The upstream's status code and body come back to the provider verbatim,
/// so the provider's retry behavior is driven by the gateway's verdict. If
/// the gateway cannot be reached at all, the provider sees 502 and retries.
async fn forward_callback(
    State(state): State<RelayState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut request = state
        .client
        .post(&state.destination_url)
        .body(body.to_vec());

    for name in FORWARDED_HEADERS {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            request = request.header(name, value);
        }
    }

    let peer = connect_info.map(|ConnectInfo(addr)| addr.ip().to_string());
    let existing = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let forwarded_for = match (existing, peer) {
        (Some(chain), Some(ip)) => Some(format!("{}, {}", chain, ip)),
        (Some(chain), None) => Some(chain),
        (None, Some(ip)) => Some(ip),
        (None, None) => None,
    };
    if let Some(value) = forwarded_for {
        request = request.header("X-Forwarded-For", value);
    }

    let upstream = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to forward callback to gateway: {}", e);
            return (
                StatusCode::BAD_GATEWAY,
                Json(CallbackAck::rejected("callback delivery failed")),
            )
                .into_response();
        }
    };

    // reqwest and axum sit on different http major versions, so the status
    // and headers cross the boundary as plain values.
    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to read gateway response: {}", e);
            return (
                StatusCode::BAD_GATEWAY,
                Json(CallbackAck::rejected("callback delivery failed")),
            )
                .into_response();
        }
    };

    tracing::info!(status = status.as_u16(), "Relayed callback to gateway");

    let mut builder = Response::builder().status(status);
    if let Some(value) = content_type {
        builder = builder.header("Content-Type", value);
    }
    match builder.body(Body::from(body.to_vec())) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to rebuild gateway response: {}", e);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}
