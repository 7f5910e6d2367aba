//! Payment configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::application::handlers::billing::{AcknowledgePolicy, CheckoutSettings};
use crate::domain::billing::DEFAULT_TOLERANCE_SECS;

use super::error::ValidationError;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key
    pub stripe_api_key: SecretString,

    /// Stripe publishable key, served to the storefront
    #[serde(default)]
    pub stripe_publishable_key: String,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: SecretString,

    /// Override for the Stripe API base URL (stripe-mock, proxies)
    pub stripe_api_base_url: Option<String>,

    /// Accepted age of a webhook signature in seconds
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: i64,

    /// Checkout currency (ISO 4217, lowercase)
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Redirect after a completed checkout
    pub checkout_success_url: String,

    /// Redirect after an abandoned checkout
    pub checkout_cancel_url: String,

    /// Answer 500 on reconciliation failure so Stripe redelivers
    #[serde(default)]
    pub redeliver_on_failure: bool,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_test_")
    }

    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            currency: self.currency.to_lowercase(),
            success_url: self.checkout_success_url.clone(),
            cancel_url: self.checkout_cancel_url.clone(),
        }
    }

    pub fn acknowledge_policy(&self) -> AcknowledgePolicy {
        AcknowledgePolicy::from_redeliver_flag(self.redeliver_on_failure)
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let api_key = self.stripe_api_key.expose_secret();
        let webhook_secret = self.stripe_webhook_secret.expose_secret();

        if api_key.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__STRIPE_API_KEY"));
        }
        if webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired(
                "PAYMENT__STRIPE_WEBHOOK_SECRET",
            ));
        }

        // Secret keys are sk_ or restricted rk_
        if !api_key.starts_with("sk_") && !api_key.starts_with("rk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if !self.stripe_publishable_key.is_empty() && !self.stripe_publishable_key.starts_with("pk_")
        {
            return Err(ValidationError::InvalidStripePublishableKey);
        }

        if !(1..=3600).contains(&self.webhook_tolerance_secs) {
            return Err(ValidationError::InvalidWebhookTolerance);
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidCurrency);
        }
        if !is_absolute_url(&self.checkout_success_url) {
            return Err(ValidationError::InvalidRedirectUrl("checkout_success_url"));
        }
        if !is_absolute_url(&self.checkout_cancel_url) {
            return Err(ValidationError::InvalidRedirectUrl("checkout_cancel_url"));
        }

        Ok(())
    }
}

fn is_absolute_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn default_webhook_tolerance() -> i64 {
    DEFAULT_TOLERANCE_SECS
}

fn default_currency() -> String {
    "brl".to_string()
}
