use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Transaction, TransactionStatus, WalletBalance};

/// Standard API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(error: ErrorResponse) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<ValidationErrorDetail>) -> Self {
        self.details = Some(details);
        self
    }
}

/// Validation error detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

/// Acknowledgement body returned to the payment provider.
///
/// Providers retry on anything other than a 2xx, so the shape stays minimal:
/// `{"success": true}` on acceptance, with a message only when rejecting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CallbackAck {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub services: ServiceHealth,
}

/// Service health status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub database: bool,
}

/// Transaction response DTO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub merchant_ref: String,
    pub provider_reference: Option<String>,
    pub status: TransactionStatus,
    pub amount: i64,
    pub fee: i64,
    pub amount_received: i64,
    pub payment_method: Option<String>,
    pub checkout_url: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            user_id: tx.user_id,
            merchant_ref: tx.merchant_ref,
            provider_reference: tx.provider_reference,
            status: tx.status,
            amount: tx.amount,
            fee: tx.fee,
            amount_received: tx.amount_received,
            payment_method: tx.payment_method,
            checkout_url: tx.checkout_url,
            paid_at: tx.paid_at,
            created_at: tx.created_at,
            updated_at: tx.updated_at,
        }
    }
}

/// Wallet balance response DTO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub user_id: Uuid,
    pub balance: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<WalletBalance> for BalanceResponse {
    fn from(balance: WalletBalance) -> Self {
        Self {
            user_id: balance.user_id,
            balance: balance.balance,
            updated_at: balance.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_ack_shape() {
        let ok = serde_json::to_value(CallbackAck::ok()).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true}));

        let rejected = serde_json::to_value(CallbackAck::rejected("invalid signature")).unwrap();
        assert_eq!(
            rejected,
            serde_json::json!({"success": false, "message": "invalid signature"})
        );
    }

    #[test]
    fn test_api_response_envelope() {
        let success = ApiResponse::success(42);
        assert!(success.success);
        assert_eq!(success.data, Some(42));
        assert!(success.error.is_none());

        let error = ApiResponse::<()>::error(ErrorResponse::new("NOT_FOUND", "missing"));
        assert!(!error.success);
        assert!(error.data.is_none());
        assert_eq!(error.error.unwrap().code, "NOT_FOUND");
    }
}
