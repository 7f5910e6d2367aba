//! Billing error taxonomy.
//!
//! | Error | Surfaced as |
//! |-------|-------------|
//! | Validation | 400 to the caller |
//! | Verification | 400 to the provider |
//! | MalformedEvent | logged on webhooks |
//! | InvalidPlan | 400 to the caller |
//! | RecordNotFound | 404 on queries, logged on webhooks |
//! | MissingField | logged on webhooks |
//! | Upstream | 500 on queries, logged on webhooks |
//! | Storage | 500 on queries, logged on webhooks |

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::PaymentError;

/// Why an inbound webhook was rejected before reaching the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Signature mismatch or malformed `Stripe-Signature` header.
    #[error("bad_signature: {0}")]
    BadSignature(String),

    /// Signature timestamp outside the accepted tolerance.
    #[error("stale: event is {age_secs}s from now")]
    Stale { age_secs: i64 },
}

impl VerificationError {
    /// Short machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            VerificationError::BadSignature(_) => "bad_signature",
            VerificationError::Stale { .. } => "stale",
        }
    }
}

/// Errors raised by billing operations.
#[derive(Debug, Clone, Error)]
pub enum BillingError {
    /// A required input field is missing or invalid.
    #[error("{message}")]
    Validation { field: String, message: String },

    /// Webhook did not come from the provider.
    #[error("Webhook verification failed: {0}")]
    Verification(#[from] VerificationError),

    /// Authenticated webhook body that does not decode into a known event shape.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// Checkout requested for a plan outside the catalog.
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    /// No local record exists for the email.
    #[error("No user record for {0}")]
    RecordNotFound(String),

    /// Event payload lacks data the transition needs.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Payment provider call failed.
    #[error("Payment provider error: {0}")]
    Upstream(String),

    /// Record store call failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BillingError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns true if retrying the same operation might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BillingError::Upstream(_) | BillingError::Storage(_) | BillingError::RecordNotFound(_)
        )
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed | ErrorCode::InvalidFormat => {
                let field = err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "input".to_string());
                BillingError::Validation {
                    field,
                    message: err.message,
                }
            }
            ErrorCode::ExternalServiceError => BillingError::Upstream(err.message),
            _ => BillingError::Storage(err.to_string()),
        }
    }
}

impl From<PaymentError> for BillingError {
    fn from(err: PaymentError) -> Self {
        BillingError::Upstream(err.to_string())
    }
}
