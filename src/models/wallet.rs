use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's wallet balance in minor currency units. Rows are only ever
/// credited by the database trigger on the paid transition; application code
/// creates and reads them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WalletBalance {
    pub user_id: Uuid,
    pub balance: i64,
    pub updated_at: DateTime<Utc>,
}
