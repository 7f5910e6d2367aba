//! HandlePaymentWebhookHandler - verifies and reconciles Stripe webhooks.

use tracing::{error, info, warn};

use crate::domain::billing::{BillingError, StripeEvent, StripeWebhookVerifier};

use super::reconcile_event::{EventReconciler, ReconcileOutcome};

/// When the provider is told an event was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcknowledgePolicy {
    /// Acknowledge once the signature checks out; reconciliation failures
    /// are logged only.
    #[default]
    AfterVerification,
    /// Acknowledge only after reconciliation succeeded, so failures are
    /// redelivered by the provider.
    AfterPersist,
}

impl AcknowledgePolicy {
    pub fn from_redeliver_flag(redeliver_on_failure: bool) -> Self {
        if redeliver_on_failure {
            AcknowledgePolicy::AfterPersist
        } else {
            AcknowledgePolicy::AfterVerification
        }
    }
}

/// Command to handle a payment webhook.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw webhook body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value.
    pub signature: String,
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlePaymentWebhookResult {
    /// Event reconciled (or deliberately skipped).
    Processed {
        event_id: String,
        outcome: ReconcileOutcome,
    },
    /// Decoding or reconciliation failed after a good signature; acknowledged
    /// anyway under `AfterVerification`. `event_id` is absent when the body
    /// never decoded.
    FailedAcknowledged {
        event_id: Option<String>,
        error: String,
    },
}

pub struct HandlePaymentWebhookHandler {
    verifier: StripeWebhookVerifier,
    reconciler: EventReconciler,
    policy: AcknowledgePolicy,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        verifier: StripeWebhookVerifier,
        reconciler: EventReconciler,
        policy: AcknowledgePolicy,
    ) -> Self {
        Self {
            verifier,
            reconciler,
            policy,
        }
    }

    /// Verifies the signature, then decodes and reconciles.
    ///
    /// # Errors
    ///
    /// - `Verification` - the event never reaches the reconciler
    /// - `MalformedEvent` or any reconciliation error, only under
    ///   `AcknowledgePolicy::AfterPersist`
    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<HandlePaymentWebhookResult, BillingError> {
        self.verifier
            .verify(&cmd.payload, &cmd.signature)
            .map_err(|e| {
                warn!(reason = e.reason(), error = %e, "webhook rejected");
                BillingError::from(e)
            })?;

        let event = match StripeEvent::decode(&cmd.payload) {
            Ok(event) => event,
            Err(err) => {
                error!(error = %err, "verified webhook could not be decoded");
                return self.after_failure(None, err);
            }
        };

        info!(
            event_id = %event.id,
            event_type = event.kind.kind_name(),
            livemode = event.livemode,
            "webhook verified"
        );

        match self.reconciler.reconcile(&event).await {
            Ok(outcome) => Ok(HandlePaymentWebhookResult::Processed {
                event_id: event.id,
                outcome,
            }),
            Err(err) => {
                error!(
                    event_id = %event.id,
                    event_type = event.kind.kind_name(),
                    retryable = err.is_retryable(),
                    error = %err,
                    "webhook reconciliation failed"
                );
                self.after_failure(Some(event.id), err)
            }
        }
    }

    fn after_failure(
        &self,
        event_id: Option<String>,
        err: BillingError,
    ) -> Result<HandlePaymentWebhookResult, BillingError> {
        match self.policy {
            AcknowledgePolicy::AfterPersist => Err(err),
            AcknowledgePolicy::AfterVerification => {
                Ok(HandlePaymentWebhookResult::FailedAcknowledged {
                    event_id,
                    error: err.to_string(),
                })
            }
        }
    }
}
