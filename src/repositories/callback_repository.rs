use crate::error::{AppError, Result};
use crate::models::ProviderCallback;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for the provider callback audit log.
pub struct CallbackRepository {
    pool: PgPool,
}

impl CallbackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records one verified delivery.
    pub async fn record(&self, callback: &ProviderCallback) -> Result<ProviderCallback> {
        let row = sqlx::query_as::<_, ProviderCallback>(
            r#"
            INSERT INTO provider_callbacks (id, transaction_id, provider_reference, merchant_ref, provider_status, mapped_status, outcome, payload, received_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, transaction_id, provider_reference, merchant_ref, provider_status, mapped_status, outcome, payload, received_at
            "#,
        )
        .bind(callback.id)
        .bind(callback.transaction_id)
        .bind(&callback.provider_reference)
        .bind(&callback.merchant_ref)
        .bind(&callback.provider_status)
        .bind(callback.mapped_status)
        .bind(&callback.outcome)
        .bind(&callback.payload)
        .bind(callback.received_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Lists the audit trail for a transaction, oldest first.
    pub async fn find_by_transaction(&self, transaction_id: Uuid) -> Result<Vec<ProviderCallback>> {
        let rows = sqlx::query_as::<_, ProviderCallback>(
            r#"
            SELECT id, transaction_id, provider_reference, merchant_ref, provider_status, mapped_status, outcome, payload, received_at
            FROM provider_callbacks
            WHERE transaction_id = $1
            ORDER BY received_at
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }
}
