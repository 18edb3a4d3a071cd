use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::config::TopupSettings;
use crate::error::{AppError, Result};
use crate::models::{Transaction, WalletBalance};
use crate::observability::get_metrics;
use crate::provider::{CreatePaymentRequest, ProviderGateway};
use crate::repositories::{TransactionRepository, WalletRepository};

/// Opens top-up transactions and serves the read side of the API.
pub struct TopupService {
    transactions: TransactionRepository,
    wallets: WalletRepository,
    provider: Arc<dyn ProviderGateway>,
    fees: TopupSettings,
}

impl TopupService {
    pub fn new(pool: PgPool, provider: Arc<dyn ProviderGateway>, fees: TopupSettings) -> Self {
        Self {
            transactions: TransactionRepository::new(pool.clone()),
            wallets: WalletRepository::new(pool),
            provider,
            fees,
        }
    }

    /// Creates a pending top-up and opens the payment with the provider.
    /// The local row is written first so a callback racing the create
    /// response can already resolve it by merchant reference. If the
    /// provider call fails the pending row stays behind, inert: the
    /// provider never opened anything that could settle it.
    pub async fn create_topup(
        &self,
        user_id: Uuid,
        amount: i64,
        method: Option<String>,
    ) -> Result<Transaction> {
        if amount <= 0 {
            return Err(AppError::Validation(
                "amount must be a positive number of minor units".to_string(),
            ));
        }

        let merchant_ref = Self::mint_merchant_ref();
        let fee = Self::estimate_fee(&self.fees, amount).ok_or_else(|| {
            AppError::Validation("amount is too large to price a fee for".to_string())
        })?;

        self.wallets.ensure(user_id).await?;

        let transaction = Transaction::new(user_id, merchant_ref, amount, fee, method.clone());
        let transaction = self.transactions.create(&transaction).await?;

        let request = CreatePaymentRequest {
            merchant_ref: transaction.merchant_ref.clone(),
            amount: transaction.amount,
            method,
        };
        let created = self.provider.create_payment(&request).await?;

        let updated = self
            .transactions
            .record_provider_details(
                transaction.id,
                &created.reference,
                created.checkout_url.as_deref(),
                created.fee,
            )
            .await?
            .unwrap_or(transaction);

        get_metrics().record_topup_created(updated.payment_method.as_deref().unwrap_or("default"));
        tracing::info!(
            merchant_ref = %updated.merchant_ref,
            reference = %created.reference,
            amount = updated.amount,
            "Opened top-up payment"
        );

        Ok(updated)
    }

    /// Finds a transaction by merchant reference.
    pub async fn get_transaction(&self, merchant_ref: &str) -> Result<Transaction> {
        self.transactions
            .find_by_merchant_ref(merchant_ref)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no transaction for merchant_ref {}", merchant_ref))
            })
    }

    /// Returns the user's wallet balance.
    pub async fn get_balance(&self, user_id: Uuid) -> Result<WalletBalance> {
        self.wallets
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no wallet for user {}", user_id)))
    }

    // The basis-point product can exceed i64 for extreme amounts, so the
    // arithmetic is checked and the caller turns None into a validation error.
    fn estimate_fee(fees: &TopupSettings, amount: i64) -> Option<i64> {
        let variable = amount.checked_mul(fees.fee_basis_points)? / 10_000;
        fees.flat_fee.checked_add(variable)
    }

    fn mint_merchant_ref() -> String {
        format!("TXN-{}", Uuid::new_v4().simple().to_string().to_uppercase())
    }
}
