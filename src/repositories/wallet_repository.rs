use crate::error::{AppError, Result};
use crate::models::WalletBalance;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for wallet balances. Deliberately has no credit or debit
/// method: the only writer of `balance` is the database trigger on the paid
/// transition.
pub struct WalletRepository {
    pool: PgPool,
}

impl WalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the user's wallet row, creating it with a zero balance when
    /// absent. An existing row is returned untouched.
    pub async fn ensure(&self, user_id: Uuid) -> Result<WalletBalance> {
        let row = sqlx::query_as::<_, WalletBalance>(
            r#"
            INSERT INTO wallet_balances (user_id, balance, updated_at)
            VALUES ($1, 0, NOW())
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING user_id, balance, updated_at
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Finds a wallet by user.
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<WalletBalance>> {
        let row = sqlx::query_as::<_, WalletBalance>(
            r#"
            SELECT user_id, balance, updated_at
            FROM wallet_balances
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }
}
