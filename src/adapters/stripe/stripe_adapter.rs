//! Stripe payment provider adapter.
//!
//! Implements `PaymentProvider` against the Stripe REST API with form-encoded
//! requests and the secret key as basic-auth user.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key);
//! let adapter = StripePaymentAdapter::new(config);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest, Customer, PaymentError,
    PaymentErrorCode, PaymentProvider, Subscription,
};

use super::api_types::{
    StripeCheckoutSession, StripeCustomer, StripeErrorBody, StripeList, StripeSubscription,
};

/// Page size for list calls; a customer rarely has more.
const LIST_LIMIT: &str = "10";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Per-request timeout.
    timeout: Duration,
}

impl StripeConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: "https://api.stripe.com".to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Stripe payment provider adapter.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .timeout(self.config.timeout)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        builder: RequestBuilder,
    ) -> Result<T, PaymentError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            tracing::error!(operation, code = %err.code, error = %err.message, "Stripe API call failed");
            return Err(err);
        }

        response.json().await.map_err(|e| {
            PaymentError::new(
                PaymentErrorCode::ProviderError,
                format!("Failed to parse Stripe response: {}", e),
            )
        })
    }
}

async fn error_from_response(response: Response) -> PaymentError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<StripeErrorBody>(&body).ok();

    let code = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PaymentErrorCode::AuthenticationError,
        StatusCode::NOT_FOUND => PaymentErrorCode::NotFound,
        StatusCode::TOO_MANY_REQUESTS => PaymentErrorCode::RateLimitExceeded,
        StatusCode::BAD_REQUEST | StatusCode::PAYMENT_REQUIRED => PaymentErrorCode::InvalidRequest,
        s if s.is_server_error() => PaymentErrorCode::ProviderError,
        _ => PaymentErrorCode::Unknown,
    };

    let message = parsed
        .as_ref()
        .and_then(|b| b.error.message.clone())
        .unwrap_or(body);
    let err = PaymentError::new(code, format!("Stripe API error: {}", message));

    match parsed.and_then(|b| b.error.code) {
        Some(provider_code) => err.with_provider_code(provider_code),
        None => err,
    }
}

/// Form parameters for a subscription checkout with inline price data.
fn checkout_params(request: &CreateCheckoutRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("mode", "subscription".to_string()),
        ("line_items[0][quantity]", "1".to_string()),
        ("line_items[0][price_data][currency]", request.currency.clone()),
        (
            "line_items[0][price_data][unit_amount]",
            request.unit_amount_minor_units.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]",
            request.plan_name.clone(),
        ),
        (
            "line_items[0][price_data][recurring][interval]",
            request.interval.as_str().to_string(),
        ),
        (
            "line_items[0][price_data][recurring][interval_count]",
            request.interval_count.to_string(),
        ),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("metadata[plan_id]", request.plan_id.clone()),
        ("metadata[plan_name]", request.plan_name.clone()),
        ("subscription_data[metadata][plan_id]", request.plan_id.clone()),
    ];

    if let Some(email) = &request.customer_email {
        params.push(("customer_email", email.clone()));
    }

    params
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn list_customers_by_email(&self, email: &str) -> Result<Vec<Customer>, PaymentError> {
        let builder = self
            .http_client
            .get(self.url("/v1/customers"))
            .query(&[("email", email), ("limit", LIST_LIMIT)]);

        let list: StripeList<StripeCustomer> = self.send("list_customers", builder).await?;

        Ok(list
            .data
            .into_iter()
            .filter(|c| !c.deleted)
            .map(Customer::from)
            .collect())
    }

    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        let mut params = vec![("email", request.email.clone())];
        if let Some(name) = &request.name {
            params.push(("name", name.clone()));
        }

        let builder = self
            .http_client
            .post(self.url("/v1/customers"))
            .form(&params);

        let customer: StripeCustomer = self.send("create_customer", builder).await?;

        Ok(Customer {
            email: customer.email.clone().or(Some(request.email)),
            ..Customer::from(customer)
        })
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, PaymentError> {
        let builder = self
            .http_client
            .get(self.url(&format!("/v1/customers/{}", customer_id)));

        let customer: StripeCustomer = match self.send("get_customer", builder).await {
            Ok(customer) => customer,
            Err(err) if err.code == PaymentErrorCode::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };

        if customer.deleted {
            return Ok(None);
        }

        Ok(Some(customer.into()))
    }

    async fn list_subscriptions(
        &self,
        customer_id: &str,
    ) -> Result<Vec<Subscription>, PaymentError> {
        let builder = self.http_client.get(self.url("/v1/subscriptions")).query(&[
            ("customer", customer_id),
            ("status", "all"),
            ("limit", LIST_LIMIT),
        ]);

        let list: StripeList<StripeSubscription> =
            self.send("list_subscriptions", builder).await?;

        Ok(list.data.into_iter().map(Subscription::from).collect())
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let builder = self
            .http_client
            .post(self.url("/v1/checkout/sessions"))
            .form(&checkout_params(&request));

        let session: StripeCheckoutSession =
            self.send("create_checkout_session", builder).await?;

        Ok(CheckoutSession {
            id: session.id,
            url: session.url,
        })
    }
}
