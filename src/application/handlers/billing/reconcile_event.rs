//! EventReconciler - applies verified billing events to user records.
//!
//! State per email: no record, inactive, active. Every transition is a set of
//! plain field overwrites, so replaying an event converges on the same record
//! apart from its timestamps.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::billing::{
    resolve, BillingError, BillingEvent, CheckoutDetails, Email, IntervalUnit, UserRecord,
    VerifiedEvent, CUSTOM_PLAN_NAME,
};
use crate::domain::foundation::Timestamp;
use crate::ports::{PaymentProvider, UserRecordRepository};

/// What a reconciliation did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A new record was created.
    Created { email: String },
    /// An existing record was updated.
    Updated { email: String },
    /// Documented no-op; nothing was written.
    Skipped { reason: &'static str },
    /// Event kind we do not reconcile.
    Ignored { kind: String },
}

pub struct EventReconciler {
    repository: Arc<dyn UserRecordRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl EventReconciler {
    pub fn new(
        repository: Arc<dyn UserRecordRepository>,
        payment_provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            repository,
            payment_provider,
        }
    }

    pub async fn reconcile(&self, event: &VerifiedEvent) -> Result<ReconcileOutcome, BillingError> {
        self.apply(event, Timestamp::now()).await
    }

    /// Applies `event` as of `now`.
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` - invoice paid for an email with no record
    /// - `MissingField` - invoice without a billing interval, or customer
    ///   without an email
    /// - `Upstream` / `Storage` - collaborator failures
    pub async fn apply(
        &self,
        event: &VerifiedEvent,
        now: Timestamp,
    ) -> Result<ReconcileOutcome, BillingError> {
        match &event.kind {
            BillingEvent::CheckoutCompleted {
                email,
                customer_id,
                customer_name,
                plan_label,
            } => {
                let Some(email) = email else {
                    warn!(event_id = %event.id, "checkout completed without email, skipping");
                    return Ok(ReconcileOutcome::Skipped {
                        reason: "missing_email",
                    });
                };
                let checkout = CheckoutDetails {
                    customer_id: customer_id.clone(),
                    customer_name: customer_name.clone(),
                    plan_name: plan_label
                        .clone()
                        .unwrap_or_else(|| CUSTOM_PLAN_NAME.to_string()),
                };
                self.checkout_completed(&event.id, Email::parse(email)?, checkout, now)
                    .await
            }

            BillingEvent::InvoicePaid {
                customer_id,
                subscription_id,
                interval,
                interval_count,
            } => {
                let (Some(customer_id), Some(_)) = (customer_id, subscription_id) else {
                    warn!(
                        event_id = %event.id,
                        "invoice paid without customer or subscription, skipping"
                    );
                    return Ok(ReconcileOutcome::Skipped {
                        reason: "missing_customer_or_subscription",
                    });
                };
                let interval = interval.ok_or(BillingError::MissingField("interval"))?;
                self.invoice_paid(
                    &event.id,
                    customer_id,
                    interval,
                    interval_count.unwrap_or(1),
                    now,
                )
                .await
            }

            BillingEvent::SubscriptionCanceled { customer_id } => {
                let Some(customer_id) = customer_id else {
                    warn!(event_id = %event.id, "subscription canceled without customer, skipping");
                    return Ok(ReconcileOutcome::Skipped {
                        reason: "missing_customer",
                    });
                };
                self.subscription_canceled(&event.id, customer_id, now).await
            }

            BillingEvent::Other(kind) => {
                info!(event_id = %event.id, event_type = %kind, "unhandled event type, ignoring");
                Ok(ReconcileOutcome::Ignored { kind: kind.clone() })
            }
        }
    }

    async fn checkout_completed(
        &self,
        event_id: &str,
        email: Email,
        checkout: CheckoutDetails,
        now: Timestamp,
    ) -> Result<ReconcileOutcome, BillingError> {
        let record = match self.repository.find_by_email(&email).await? {
            Some(mut existing) => {
                existing.apply_checkout(checkout, now);
                existing
            }
            None => UserRecord::from_checkout(email, checkout, now),
        };

        // Upsert on both paths: a racing creation for the same email lands as
        // an update that keeps the first token and stamps `modified_at`.
        let stored = self.repository.upsert(&record).await?;
        let created = stored.modified_at.is_none();

        info!(
            event_id,
            email = %stored.email,
            customer_id = stored.external_customer_id.as_deref().unwrap_or(""),
            plan = stored.plan.as_deref().unwrap_or(""),
            created,
            "checkout reconciled"
        );

        let email = stored.email.to_string();
        Ok(if created {
            ReconcileOutcome::Created { email }
        } else {
            ReconcileOutcome::Updated { email }
        })
    }

    async fn invoice_paid(
        &self,
        event_id: &str,
        customer_id: &str,
        interval: IntervalUnit,
        interval_count: u32,
        now: Timestamp,
    ) -> Result<ReconcileOutcome, BillingError> {
        let email = match self.customer_email(customer_id).await? {
            Some(email) => email,
            None => return Err(BillingError::MissingField("customer.email")),
        };

        let mut record = self
            .repository
            .find_by_email(&email)
            .await?
            .ok_or_else(|| BillingError::RecordNotFound(email.to_string()))?;

        let plan = resolve(interval, interval_count);
        record.apply_payment(&plan, now);
        self.repository.update(&record).await?;

        info!(
            event_id,
            email = %record.email,
            customer_id,
            plan = %plan.plan_name,
            "invoice payment reconciled"
        );

        Ok(ReconcileOutcome::Updated {
            email: record.email.to_string(),
        })
    }

    async fn subscription_canceled(
        &self,
        event_id: &str,
        customer_id: &str,
        now: Timestamp,
    ) -> Result<ReconcileOutcome, BillingError> {
        let Some(email) = self.customer_email(customer_id).await? else {
            warn!(event_id, customer_id, "canceled customer has no email, skipping");
            return Ok(ReconcileOutcome::Skipped {
                reason: "customer_without_email",
            });
        };

        let Some(mut record) = self.repository.find_by_email(&email).await? else {
            warn!(event_id, email = %email, "cancellation for unknown record, skipping");
            return Ok(ReconcileOutcome::Skipped {
                reason: "no_record",
            });
        };

        record.apply_cancellation(now);
        self.repository.update(&record).await?;

        info!(event_id, email = %record.email, customer_id, "subscription cancellation reconciled");

        Ok(ReconcileOutcome::Updated {
            email: record.email.to_string(),
        })
    }

    /// Resolves a provider customer id to its email via the provider.
    async fn customer_email(&self, customer_id: &str) -> Result<Option<Email>, BillingError> {
        let customer = self.payment_provider.get_customer(customer_id).await?;
        match customer.and_then(|c| c.email) {
            Some(raw) => Ok(Some(Email::parse(raw)?)),
            None => Ok(None),
        }
    }
}
