use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Status of a top-up transaction in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Payment has been opened but the provider has not settled it.
    Pending,
    /// Provider confirmed the payment; the wallet has been credited.
    Paid,
    /// Provider rejected or aborted the payment.
    Failed,
    /// The payment window elapsed without settlement.
    Expired,
    /// A settled payment was returned to the payer.
    Refunded,
}

impl TransactionStatus {
    /// Returns true if no further transition can ever leave this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Failed | TransactionStatus::Expired | TransactionStatus::Refunded
        )
    }

    /// Returns true if the lifecycle admits the edge from `self` to `target`.
    /// The machine is monotone: `PENDING` fans out to the settled states and
    /// only `PAID` can still move, to `REFUNDED`.
    pub fn can_transition_to(&self, target: TransactionStatus) -> bool {
        matches!(
            (self, target),
            (TransactionStatus::Pending, TransactionStatus::Paid)
                | (TransactionStatus::Pending, TransactionStatus::Failed)
                | (TransactionStatus::Pending, TransactionStatus::Expired)
                | (TransactionStatus::Paid, TransactionStatus::Refunded)
        )
    }

    /// Maps the provider's status vocabulary onto the internal machine.
    /// Returns `None` for anything unrecognized; callers must treat that as
    /// a no-op, never coerce it.
    pub fn from_provider(raw: &str) -> Option<TransactionStatus> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "UNPAID" => Some(TransactionStatus::Pending),
            "PAID" => Some(TransactionStatus::Paid),
            "EXPIRED" => Some(TransactionStatus::Expired),
            "FAILED" => Some(TransactionStatus::Failed),
            "REFUND" => Some(TransactionStatus::Refunded),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Paid => "PAID",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Expired => "EXPIRED",
            TransactionStatus::Refunded => "REFUNDED",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A top-up transaction. Amounts are integer minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Locally minted reference the provider echoes back on callbacks.
    pub merchant_ref: String,
    /// Provider-side reference, known once the provider has opened the
    /// payment or after the first callback names it.
    pub provider_reference: Option<String>,
    pub amount: i64,
    pub fee: i64,
    /// Amount the provider reported as actually received; zero until a
    /// settlement callback carries it.
    pub amount_received: i64,
    pub status: TransactionStatus,
    /// Raw status string from the last applied provider report.
    pub provider_status: Option<String>,
    pub payment_method: Option<String>,
    pub checkout_url: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: Uuid,
        merchant_ref: String,
        amount: i64,
        fee: i64,
        payment_method: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            merchant_ref,
            provider_reference: None,
            amount,
            fee,
            amount_received: 0,
            status: TransactionStatus::Pending,
            provider_status: None,
            payment_method,
            checkout_url: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Amount that lands in the wallet when this transaction settles.
    /// Mirrors the database credit trigger.
    pub fn credit_amount(&self) -> i64 {
        if self.amount_received > 0 {
            self.amount_received
        } else {
            self.amount
        }
    }
}

/// Fields persisted alongside a status transition.
#[derive(Debug, Clone, Default)]
pub struct TransitionMetadata {
    pub provider_reference: Option<String>,
    pub provider_status: Option<String>,
    pub amount_received: Option<i64>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        use TransactionStatus::*;

        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Failed));
        assert!(Pending.can_transition_to(Expired));
        assert!(Paid.can_transition_to(Refunded));
    }

    #[test]
    fn test_forbidden_transitions() {
        use TransactionStatus::*;

        assert!(!Paid.can_transition_to(Failed));
        assert!(!Paid.can_transition_to(Expired));
        assert!(!Paid.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Paid));
        assert!(!Expired.can_transition_to(Paid));
        assert!(!Refunded.can_transition_to(Paid));
        assert!(!Pending.can_transition_to(Refunded));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(!TransactionStatus::Paid.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(TransactionStatus::Expired.is_terminal());
        assert!(TransactionStatus::Refunded.is_terminal());
    }

    #[test]
    fn test_provider_status_mapping() {
        assert_eq!(
            TransactionStatus::from_provider("PAID"),
            Some(TransactionStatus::Paid)
        );
        assert_eq!(
            TransactionStatus::from_provider("UNPAID"),
            Some(TransactionStatus::Pending)
        );
        assert_eq!(
            TransactionStatus::from_provider("EXPIRED"),
            Some(TransactionStatus::Expired)
        );
        assert_eq!(
            TransactionStatus::from_provider("FAILED"),
            Some(TransactionStatus::Failed)
        );
        assert_eq!(
            TransactionStatus::from_provider("REFUND"),
            Some(TransactionStatus::Refunded)
        );
    }

    #[test]
    fn test_provider_status_mapping_is_lenient_about_case() {
        assert_eq!(
            TransactionStatus::from_provider(" paid "),
            Some(TransactionStatus::Paid)
        );
    }

    #[test]
    fn test_unrecognized_provider_status_maps_to_none() {
        assert_eq!(TransactionStatus::from_provider("SETTLED"), None);
        assert_eq!(TransactionStatus::from_provider(""), None);
        assert_eq!(TransactionStatus::from_provider("PAID_OUT"), None);
    }

    #[test]
    fn test_credit_amount_prefers_amount_received() {
        let mut tx = Transaction::new(Uuid::new_v4(), "TXN-1".to_string(), 50_000, 500, None);
        assert_eq!(tx.credit_amount(), 50_000);

        tx.amount_received = 49_500;
        assert_eq!(tx.credit_amount(), 49_500);
    }
}
