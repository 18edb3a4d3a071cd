use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::TransactionStatus;

/// Body of a provider payment callback. The signature is checked over the
/// raw bytes before this is ever parsed, so unknown extra fields are simply
/// ignored here and preserved verbatim in the audit payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackPayload {
    /// Provider-side transaction reference.
    pub reference: String,
    /// Our reference, echoed back by the provider.
    pub merchant_ref: String,
    /// Raw provider status string, e.g. `PAID` or `EXPIRED`.
    pub status: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_received: Option<i64>,
    /// Unix seconds, set by the provider on settlement.
    #[serde(default)]
    pub paid_at: Option<i64>,
}

impl CallbackPayload {
    pub fn paid_at_utc(&self) -> Option<DateTime<Utc>> {
        self.paid_at.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// How a verified delivery was settled against the transaction store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The transition was applied by this delivery.
    Applied,
    /// The transaction already held the target status.
    Duplicate,
    /// The state machine refused the transition.
    Conflict,
    /// The provider status is outside the known vocabulary.
    IgnoredUnknownStatus,
    /// No transaction matched the payload references.
    NotFound,
}

impl CallbackOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackOutcome::Applied => "applied",
            CallbackOutcome::Duplicate => "duplicate",
            CallbackOutcome::Conflict => "conflict",
            CallbackOutcome::IgnoredUnknownStatus => "ignored_unknown_status",
            CallbackOutcome::NotFound => "not_found",
        }
    }
}

/// Audit record of one verified provider callback. Written for every
/// delivery that passes signature verification, whatever happened after.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProviderCallback {
    pub id: Uuid,
    pub transaction_id: Option<Uuid>,
    pub provider_reference: Option<String>,
    pub merchant_ref: Option<String>,
    pub provider_status: String,
    pub mapped_status: Option<TransactionStatus>,
    pub outcome: String,
    pub payload: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

impl ProviderCallback {
    pub fn new(
        transaction_id: Option<Uuid>,
        payload: &CallbackPayload,
        raw: serde_json::Value,
        mapped_status: Option<TransactionStatus>,
        outcome: CallbackOutcome,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            provider_reference: Some(payload.reference.clone()).filter(|r| !r.is_empty()),
            merchant_ref: Some(payload.merchant_ref.clone()).filter(|r| !r.is_empty()),
            provider_status: payload.status.clone(),
            mapped_status,
            outcome: outcome.as_str().to_string(),
            payload: raw,
            received_at: Utc::now(),
        }
    }
}
