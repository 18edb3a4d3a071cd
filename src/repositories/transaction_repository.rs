use crate::error::{AppError, Result};
use crate::models::{Transaction, TransactionStatus, TransitionMetadata};
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for top-up transactions.
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persists a new transaction.
    pub async fn create(&self, transaction: &Transaction) -> Result<Transaction> {
        let row = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (id, user_id, merchant_ref, provider_reference, amount, fee, amount_received, status, provider_status, payment_method, checkout_url, paid_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id, user_id, merchant_ref, provider_reference, amount, fee, amount_received, status, provider_status, payment_method, checkout_url, paid_at, created_at, updated_at
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.user_id)
        .bind(&transaction.merchant_ref)
        .bind(&transaction.provider_reference)
        .bind(transaction.amount)
        .bind(transaction.fee)
        .bind(transaction.amount_received)
        .bind(transaction.status)
        .bind(&transaction.provider_status)
        .bind(&transaction.payment_method)
        .bind(&transaction.checkout_url)
        .bind(transaction.paid_at)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Finds a transaction by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>> {
        let row = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, merchant_ref, provider_reference, amount, fee, amount_received, status, provider_status, payment_method, checkout_url, paid_at, created_at, updated_at
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Finds a transaction by our merchant reference.
    pub async fn find_by_merchant_ref(&self, merchant_ref: &str) -> Result<Option<Transaction>> {
        let row = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, merchant_ref, provider_reference, amount, fee, amount_received, status, provider_status, payment_method, checkout_url, paid_at, created_at, updated_at
            FROM transactions
            WHERE merchant_ref = $1
            "#,
        )
        .bind(merchant_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Finds a transaction by the provider-side reference.
    pub async fn find_by_provider_reference(&self, reference: &str) -> Result<Option<Transaction>> {
        let row = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, merchant_ref, provider_reference, amount, fee, amount_received, status, provider_status, payment_method, checkout_url, paid_at, created_at, updated_at
            FROM transactions
            WHERE provider_reference = $1
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Applies a status transition only if the persisted status still equals
    /// `expected`. Returns `None` when the row has moved on, meaning a
    /// concurrent writer won; the caller decides what that means. The wallet
    /// credit trigger fires inside this same statement's transaction on the
    /// pending-to-paid edge.
    pub async fn try_transition(
        &self,
        id: Uuid,
        expected: TransactionStatus,
        new_status: TransactionStatus,
        metadata: &TransitionMetadata,
    ) -> Result<Option<Transaction>> {
        let row = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET status = $3,
                provider_status = COALESCE($4::varchar, provider_status),
                amount_received = COALESCE($5::bigint, amount_received),
                paid_at = COALESCE($6::timestamptz, paid_at),
                provider_reference = COALESCE(provider_reference, $7::varchar),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING id, user_id, merchant_ref, provider_reference, amount, fee, amount_received, status, provider_status, payment_method, checkout_url, paid_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(new_status)
        .bind(&metadata.provider_status)
        .bind(metadata.amount_received)
        .bind(metadata.paid_at)
        .bind(&metadata.provider_reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Stores provider-side details on a transaction. The provider reference
    /// is write-once; a stored reference is never overwritten.
    pub async fn record_provider_details(
        &self,
        id: Uuid,
        reference: &str,
        checkout_url: Option<&str>,
        fee: Option<i64>,
    ) -> Result<Option<Transaction>> {
        let row = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET provider_reference = COALESCE(provider_reference, $2),
                checkout_url = COALESCE($3::text, checkout_url),
                fee = COALESCE($4::bigint, fee),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, merchant_ref, provider_reference, amount, fee, amount_received, status, provider_status, payment_method, checkout_url, paid_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(reference)
        .bind(checkout_url)
        .bind(fee)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }
}
