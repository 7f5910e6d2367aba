//! Payment provider port for external payment processing.
//!
//! The billing core treats the provider as a black-box RPC client: customer
//! lookup and creation, subscription queries and checkout session creation.
//! Webhook verification is not part of this port; it is pure and lives in the
//! domain.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::IntervalUnit;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Lists customers registered with the given email, newest first.
    async fn list_customers_by_email(&self, email: &str) -> Result<Vec<Customer>, PaymentError>;

    /// Create a customer in the payment system.
    async fn create_customer(&self, request: CreateCustomerRequest)
        -> Result<Customer, PaymentError>;

    /// Get customer by provider ID.
    ///
    /// Returns `None` for unknown or deleted customers.
    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, PaymentError>;

    /// Lists the customer's subscriptions in every status, newest first.
    async fn list_subscriptions(&self, customer_id: &str)
        -> Result<Vec<Subscription>, PaymentError>;

    /// Create a hosted checkout session for a recurring plan.
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError>;
}

/// Request to create a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    pub email: String,
    pub name: Option<String>,
}

/// Customer in the payment system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Provider's customer ID.
    pub id: String,

    /// Customer email. Provider customers may lack one.
    pub email: Option<String>,

    pub name: Option<String>,

    /// When the customer was created (provider timestamp).
    pub created_at: i64,
}

/// Subscription in the payment system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Provider's subscription ID.
    pub id: String,

    /// Provider's customer ID.
    pub customer_id: String,

    pub status: ProviderSubscriptionStatus,

    /// Current billing period start (Unix timestamp).
    pub current_period_start: Option<i64>,

    /// Current billing period end (Unix timestamp).
    pub current_period_end: Option<i64>,

    pub cancel_at_period_end: bool,

    pub canceled_at: Option<i64>,

    /// Billing interval of the first subscription item.
    pub interval: Option<IntervalUnit>,

    pub interval_count: Option<u32>,
}

/// Subscription status as reported by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderSubscriptionStatus {
    Active,
    PastDue,
    Unpaid,
    Canceled,
    Incomplete,
    IncompleteExpired,
    Trialing,
    Paused,
    #[serde(other)]
    Unknown,
}

impl ProviderSubscriptionStatus {
    /// Check if subscription grants access.
    pub fn has_access(&self) -> bool {
        matches!(
            self,
            ProviderSubscriptionStatus::Active
                | ProviderSubscriptionStatus::Trialing
                | ProviderSubscriptionStatus::PastDue
        )
    }
}

/// Request to create a checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Catalog id, echoed back in session metadata.
    pub plan_id: String,

    /// Plan display name, echoed back in session metadata.
    pub plan_name: String,

    pub unit_amount_minor_units: i64,

    /// ISO currency code, lowercase.
    pub currency: String,

    pub interval: IntervalUnit,

    pub interval_count: u32,

    /// Customer email for pre-fill.
    pub customer_email: Option<String>,

    /// URL to redirect after successful checkout.
    pub success_url: String,

    /// URL to redirect after canceled checkout.
    pub cancel_url: String,
}

/// Checkout session for payment completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session ID.
    pub id: String,

    /// URL for customer to complete checkout.
    pub url: Option<String>,
}

/// Errors from payment provider operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        let code = match err.code {
            PaymentErrorCode::NotFound => ErrorCode::NotFound,
            PaymentErrorCode::InvalidRequest => ErrorCode::ValidationFailed,
            _ => ErrorCode::ExternalServiceError,
        };

        DomainError::new(code, err.message)
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Request rejected as invalid by the provider.
    InvalidRequest,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Provider API error.
    ProviderError,

    Unknown,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError | PaymentErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::ProviderError => "provider_error",
            PaymentErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn PaymentProvider) {}
    }

    #[test]
    fn subscription_status_access_checks() {
        assert!(ProviderSubscriptionStatus::Active.has_access());
        assert!(ProviderSubscriptionStatus::Trialing.has_access());
        assert!(ProviderSubscriptionStatus::PastDue.has_access());

        assert!(!ProviderSubscriptionStatus::Canceled.has_access());
        assert!(!ProviderSubscriptionStatus::Unpaid.has_access());
        assert!(!ProviderSubscriptionStatus::Incomplete.has_access());
    }

    #[test]
    fn unknown_provider_status_deserializes() {
        let status: ProviderSubscriptionStatus =
            serde_json::from_str("\"something_new\"").unwrap();
        assert_eq!(status, ProviderSubscriptionStatus::Unknown);

        let status: ProviderSubscriptionStatus = serde_json::from_str("\"past_due\"").unwrap();
        assert_eq!(status, ProviderSubscriptionStatus::PastDue);
    }

    #[test]
    fn payment_error_retryable() {
        assert!(PaymentError::network("timeout").retryable);
        assert!(PaymentErrorCode::RateLimitExceeded.is_retryable());

        assert!(!PaymentErrorCode::InvalidRequest.is_retryable());
        assert!(!PaymentError::not_found("Customer").retryable);
    }

    #[test]
    fn payment_error_display() {
        let err = PaymentError::provider("No such price").with_provider_code("resource_missing");
        assert_eq!(err.to_string(), "provider_error: No such price");
        assert_eq!(err.provider_code.as_deref(), Some("resource_missing"));
    }

    #[test]
    fn payment_error_converts_to_domain_error() {
        let err: DomainError = PaymentError::not_found("Customer").into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: DomainError = PaymentError::network("reset").into();
        assert_eq!(err.code, ErrorCode::ExternalServiceError);
    }
}
