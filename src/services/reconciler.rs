use std::sync::Arc;

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    CallbackOutcome, CallbackPayload, ProviderCallback, Transaction, TransactionStatus,
    TransitionMetadata,
};
use crate::observability::get_metrics;
use crate::provider::{ProviderGateway, SignatureVerifier};
use crate::repositories::{CallbackRepository, TransactionRepository};

/// Result of a successfully acknowledged callback.
#[derive(Debug, Clone)]
pub enum CallbackDisposition {
    /// This delivery applied the transition.
    Applied(Transaction),
    /// The transition had already been applied; nothing changed.
    Duplicate(Transaction),
    /// The provider status is outside the known vocabulary; acknowledged
    /// without touching the transaction.
    Ignored { provider_status: String },
}

/// Reconciles provider payment reports, pushed or pulled, against the
/// transaction store. Correctness under concurrent redelivery rests entirely
/// on the conditional status write; there is no in-process locking here.
pub struct Reconciler {
    transactions: TransactionRepository,
    callbacks: CallbackRepository,
    verifier: SignatureVerifier,
    provider: Arc<dyn ProviderGateway>,
}

impl Reconciler {
    pub fn new(
        pool: PgPool,
        verifier: SignatureVerifier,
        provider: Arc<dyn ProviderGateway>,
    ) -> Self {
        Self {
            transactions: TransactionRepository::new(pool.clone()),
            callbacks: CallbackRepository::new(pool),
            verifier,
            provider,
        }
    }

    /// Processes one inbound callback delivery: verify the signature over
    /// the raw bytes, parse, resolve the transaction, record the audit row,
    /// then transition. `source` only feeds the logs.
    pub async fn reconcile_callback(
        &self,
        body: &[u8],
        signature: Option<&str>,
        source: &str,
    ) -> Result<CallbackDisposition> {
        if let Err(e) = self.verifier.verify(body, signature) {
            get_metrics().record_callback_rejected(e.reason());
            tracing::warn!(source = %source, reason = e.reason(), "Rejected callback signature");
            return Err(AppError::Unauthorized(e.to_string()));
        }

        // A payload that does not parse cannot be written to the audit table
        // (there is no provider status to record), so the log line has to
        // carry everything needed to reconstruct the delivery.
        let raw: Value = match serde_json::from_slice(body) {
            Ok(raw) => raw,
            Err(e) => {
                get_metrics().record_callback_rejected("malformed");
                tracing::warn!(
                    source = %source,
                    error = %e,
                    body = %String::from_utf8_lossy(body),
                    "Rejected callback that is not valid JSON"
                );
                return Err(AppError::Validation(format!(
                    "malformed callback payload: {}",
                    e
                )));
            }
        };
        let payload: CallbackPayload = match serde_json::from_value(raw.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                get_metrics().record_callback_rejected("malformed");
                tracing::warn!(
                    source = %source,
                    error = %e,
                    body = %String::from_utf8_lossy(body),
                    "Rejected callback with missing or mistyped fields"
                );
                return Err(AppError::Validation(format!(
                    "callback payload missing fields: {}",
                    e
                )));
            }
        };

        let transaction = match self.resolve(&payload).await? {
            Some(tx) => tx,
            None => {
                self.audit(None, &payload, raw, None, CallbackOutcome::NotFound)
                    .await?;
                tracing::warn!(
                    merchant_ref = %payload.merchant_ref,
                    reference = %payload.reference,
                    "Callback for unknown transaction"
                );
                return Err(AppError::NotFound(format!(
                    "no transaction for merchant_ref {}",
                    payload.merchant_ref
                )));
            }
        };

        if payload.amount != transaction.amount {
            tracing::warn!(
                merchant_ref = %transaction.merchant_ref,
                expected = transaction.amount,
                reported = payload.amount,
                "Callback amount disagrees with stored transaction"
            );
        }

        let target = match TransactionStatus::from_provider(&payload.status) {
            Some(target) => target,
            None => {
                tracing::warn!(
                    merchant_ref = %transaction.merchant_ref,
                    provider_status = %payload.status,
                    "Unrecognized provider status, leaving transaction untouched"
                );
                self.audit(
                    Some(transaction.id),
                    &payload,
                    raw,
                    None,
                    CallbackOutcome::IgnoredUnknownStatus,
                )
                .await?;
                return Ok(CallbackDisposition::Ignored {
                    provider_status: payload.status,
                });
            }
        };

        let metadata = TransitionMetadata {
            provider_reference: Some(payload.reference.clone()).filter(|r| !r.is_empty()),
            provider_status: Some(payload.status.clone()),
            amount_received: payload.amount_received,
            paid_at: payload.paid_at_utc(),
        };

        match self.advance(&transaction, target, metadata).await {
            Ok((updated, CallbackOutcome::Applied)) => {
                self.audit(
                    Some(updated.id),
                    &payload,
                    raw,
                    Some(target),
                    CallbackOutcome::Applied,
                )
                .await?;
                tracing::info!(
                    merchant_ref = %updated.merchant_ref,
                    from = %transaction.status,
                    to = %target,
                    "Applied provider transition"
                );
                Ok(CallbackDisposition::Applied(updated))
            }
            Ok((current, _)) => {
                self.audit(
                    Some(current.id),
                    &payload,
                    raw,
                    Some(target),
                    CallbackOutcome::Duplicate,
                )
                .await?;
                tracing::info!(
                    merchant_ref = %current.merchant_ref,
                    status = %current.status,
                    "Duplicate delivery acknowledged"
                );
                Ok(CallbackDisposition::Duplicate(current))
            }
            Err(AppError::Conflict(msg)) => {
                self.audit(
                    Some(transaction.id),
                    &payload,
                    raw,
                    Some(target),
                    CallbackOutcome::Conflict,
                )
                .await?;
                tracing::warn!(merchant_ref = %transaction.merchant_ref, "{}", msg);
                Err(AppError::Conflict(msg))
            }
            Err(e) => Err(e),
        }
    }

    /// Pull-based reconciliation: queries the provider for the current
    /// payment state and applies it through the same transition path as
    /// callbacks, so a pull racing a push cannot double-apply.
    pub async fn reconcile_remote(&self, merchant_ref: &str) -> Result<Transaction> {
        let transaction = self
            .transactions
            .find_by_merchant_ref(merchant_ref)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no transaction for merchant_ref {}", merchant_ref))
            })?;

        let reference = transaction.provider_reference.clone().ok_or_else(|| {
            AppError::Validation(format!(
                "transaction {} has no provider reference to query",
                merchant_ref
            ))
        })?;

        let detail = self.provider.payment_detail(&reference).await?;

        let target = match TransactionStatus::from_provider(&detail.status) {
            Some(target) => target,
            None => {
                tracing::warn!(
                    merchant_ref = %merchant_ref,
                    provider_status = %detail.status,
                    "Status query returned a value outside the known vocabulary"
                );
                return Ok(transaction);
            }
        };

        let metadata = TransitionMetadata {
            provider_reference: None,
            provider_status: Some(detail.status.clone()),
            amount_received: detail.amount_received,
            paid_at: detail.paid_at_utc(),
        };

        let previous = transaction.status;
        let (updated, outcome) = self.advance(&transaction, target, metadata).await?;
        if outcome == CallbackOutcome::Applied {
            tracing::info!(
                merchant_ref = %merchant_ref,
                from = %previous,
                to = %target,
                "Applied provider transition from status query"
            );
        }
        Ok(updated)
    }

    /// Resolves the transaction a payload refers to: by provider reference
    /// when one is stored, falling back to our merchant reference. Never
    /// creates anything.
    async fn resolve(&self, payload: &CallbackPayload) -> Result<Option<Transaction>> {
        if !payload.reference.is_empty() {
            if let Some(tx) = self
                .transactions
                .find_by_provider_reference(&payload.reference)
                .await?
            {
                return Ok(Some(tx));
            }
        }
        if payload.merchant_ref.is_empty() {
            return Ok(None);
        }
        self.transactions
            .find_by_merchant_ref(&payload.merchant_ref)
            .await
    }

    /// Moves `current` to `target` if the machine admits it and no
    /// concurrent writer got there first. A lost race is decided by one
    /// re-read: same target means duplicate, anything else is a conflict.
    async fn advance(
        &self,
        current: &Transaction,
        target: TransactionStatus,
        metadata: TransitionMetadata,
    ) -> Result<(Transaction, CallbackOutcome)> {
        if current.status == target {
            // The first observed callback can still be the first time the
            // provider reference is known; persist it even on this path.
            let refreshed = match (&current.provider_reference, &metadata.provider_reference) {
                (None, Some(reference)) => self
                    .transactions
                    .record_provider_details(current.id, reference, None, None)
                    .await?
                    .unwrap_or_else(|| current.clone()),
                _ => current.clone(),
            };
            return Ok((refreshed, CallbackOutcome::Duplicate));
        }

        if !current.status.can_transition_to(target) {
            return Err(AppError::Conflict(format!(
                "transaction {} cannot move from {} to {}",
                current.merchant_ref, current.status, target
            )));
        }

        match self
            .transactions
            .try_transition(current.id, current.status, target, &metadata)
            .await?
        {
            Some(updated) => {
                get_metrics().record_transition(current.status.as_str(), target.as_str());
                if target == TransactionStatus::Paid {
                    get_metrics().record_wallet_credit();
                }
                Ok((updated, CallbackOutcome::Applied))
            }
            None => {
                let fresh = self
                    .transactions
                    .find_by_id(current.id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("transaction {} no longer exists", current.id))
                    })?;
                if fresh.status == target {
                    Ok((fresh, CallbackOutcome::Duplicate))
                } else {
                    Err(AppError::Conflict(format!(
                        "transaction {} moved to {} while applying {}",
                        fresh.merchant_ref, fresh.status, target
                    )))
                }
            }
        }
    }

    async fn audit(
        &self,
        transaction_id: Option<Uuid>,
        payload: &CallbackPayload,
        raw: Value,
        mapped_status: Option<TransactionStatus>,
        outcome: CallbackOutcome,
    ) -> Result<()> {
        let record = ProviderCallback::new(transaction_id, payload, raw, mapped_status, outcome);
        self.callbacks.record(&record).await?;
        get_metrics().record_callback_received(outcome.as_str());
        Ok(())
    }
}
