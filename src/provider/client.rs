use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProviderSettings;
use crate::error::{AppError, Result};
use crate::observability::{get_metrics, LatencyTimer};

/// Request to open a payment with the provider.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentRequest {
    pub merchant_ref: String,
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Provider's view of a freshly opened payment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPayment {
    pub reference: String,
    #[serde(default)]
    pub checkout_url: Option<String>,
    #[serde(default)]
    pub fee: Option<i64>,
}

/// Provider's transaction detail, returned by the status query. `status` is
/// the structured field; nothing here is scraped out of display strings.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentDetail {
    pub reference: String,
    pub merchant_ref: String,
    pub status: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_received: Option<i64>,
    #[serde(default)]
    pub paid_at: Option<i64>,
}

impl PaymentDetail {
    pub fn paid_at_utc(&self) -> Option<DateTime<Utc>> {
        self.paid_at.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Outbound interface to the payment provider. Injected by constructor so
/// callers can be exercised without the real endpoint.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    async fn create_payment(&self, request: &CreatePaymentRequest) -> Result<CreatedPayment>;
    async fn payment_detail(&self, reference: &str) -> Result<PaymentDetail>;
}

/// reqwest-backed gateway speaking the provider's HTTP API with bearer
/// authentication.
pub struct HttpProviderGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpProviderGateway {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl ProviderGateway for HttpProviderGateway {
    async fn create_payment(&self, request: &CreatePaymentRequest) -> Result<CreatedPayment> {
        let timer = LatencyTimer::new();
        let url = format!("{}/transactions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                get_metrics().record_provider_request("create_payment", false, timer.elapsed_ms());
                AppError::Provider(format!("create payment request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            get_metrics().record_provider_request("create_payment", false, timer.elapsed_ms());
            return Err(AppError::Provider(format!(
                "create payment returned HTTP {}",
                status.as_u16()
            )));
        }

        let created = response.json::<CreatedPayment>().await.map_err(|e| {
            get_metrics().record_provider_request("create_payment", false, timer.elapsed_ms());
            AppError::Provider(format!("create payment response malformed: {}", e))
        })?;

        get_metrics().record_provider_request("create_payment", true, timer.elapsed_ms());
        Ok(created)
    }

    async fn payment_detail(&self, reference: &str) -> Result<PaymentDetail> {
        let timer = LatencyTimer::new();
        let url = format!("{}/transactions/{}", self.base_url, reference);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| {
                get_metrics().record_provider_request("payment_detail", false, timer.elapsed_ms());
                AppError::Provider(format!("payment detail request failed: {}", e))
            })?;

        let status = response.status();
        if status.as_u16() == 404 {
            get_metrics().record_provider_request("payment_detail", false, timer.elapsed_ms());
            return Err(AppError::NotFound(format!(
                "provider has no transaction {}",
                reference
            )));
        }
        if !status.is_success() {
            get_metrics().record_provider_request("payment_detail", false, timer.elapsed_ms());
            return Err(AppError::Provider(format!(
                "payment detail returned HTTP {}",
                status.as_u16()
            )));
        }

        let detail = response.json::<PaymentDetail>().await.map_err(|e| {
            get_metrics().record_provider_request("payment_detail", false, timer.elapsed_ms());
            AppError::Provider(format!("payment detail response malformed: {}", e))
        })?;

        get_metrics().record_provider_request("payment_detail", true, timer.elapsed_ms());
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let settings = ProviderSettings {
            base_url: "https://provider.example/api/".to_string(),
            api_key: "key".to_string(),
            private_key: "secret".to_string(),
            request_timeout_secs: 5,
        };
        let gateway = HttpProviderGateway::new(&settings).unwrap();
        assert_eq!(gateway.base_url, "https://provider.example/api");
    }

    #[test]
    fn test_create_payment_request_omits_absent_method() {
        let request = CreatePaymentRequest {
            merchant_ref: "TXN-1".to_string(),
            amount: 50_000,
            method: None,
        };
        let body = serde_json::to_string(&request).unwrap();
        assert_eq!(body, r#"{"merchant_ref":"TXN-1","amount":50000}"#);
    }

    #[test]
    fn test_payment_detail_paid_at_conversion() {
        let detail: PaymentDetail = serde_json::from_str(
            r#"{"reference":"T1","merchant_ref":"TXN-1","status":"PAID","amount":1000,"paid_at":1700000000}"#,
        )
        .unwrap();
        assert_eq!(detail.paid_at_utc().unwrap().timestamp(), 1_700_000_000);
    }
}
