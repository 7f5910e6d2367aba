//! CreateCheckoutSessionHandler - starts a hosted checkout for a catalog plan.

use std::sync::Arc;

use tracing::info;

use crate::domain::billing::{resolve_by_catalog_id, BillingError, Email};
use crate::ports::{CreateCheckoutRequest, PaymentProvider};

/// Checkout settings taken from configuration.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct CreateCheckoutSessionCommand {
    pub plan_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCheckoutSessionResult {
    pub session_id: String,
    pub url: Option<String>,
}

pub struct CreateCheckoutSessionHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    settings: CheckoutSettings,
}

impl CreateCheckoutSessionHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>, settings: CheckoutSettings) -> Self {
        Self {
            payment_provider,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutSessionCommand,
    ) -> Result<CreateCheckoutSessionResult, BillingError> {
        let plan_id = cmd.plan_id.trim();
        if plan_id.is_empty() {
            return Err(BillingError::validation("planId", "Plan ID is required"));
        }
        let plan = resolve_by_catalog_id(plan_id)?;

        let customer_email = match cmd.email.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(Email::parse(raw)?.to_string()),
            _ => None,
        };

        let session = self
            .payment_provider
            .create_checkout_session(CreateCheckoutRequest {
                plan_id: plan.id.to_string(),
                plan_name: plan.display_name.to_string(),
                unit_amount_minor_units: plan.price_amount_minor_units,
                currency: self.settings.currency.clone(),
                interval: plan.interval,
                interval_count: plan.interval_count,
                customer_email,
                success_url: self.settings.success_url.clone(),
                cancel_url: self.settings.cancel_url.clone(),
            })
            .await?;

        info!(plan_id = plan.id, session_id = %session.id, "checkout session created");

        Ok(CreateCheckoutSessionResult {
            session_id: session.id,
            url: session.url,
        })
    }
}
