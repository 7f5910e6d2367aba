//! HTTP handlers for billing endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::billing::{
    AcknowledgePolicy, CheckoutSettings, CreateCheckoutSessionCommand,
    CreateCheckoutSessionHandler, CreateCustomerCommand, CreateCustomerHandler, EventReconciler,
    GetApiKeyHandler, GetApiKeyQuery, GetSubscriptionHandler, GetSubscriptionQuery,
    GetUserInfoHandler, GetUserInfoQuery, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, VerifyUserHandler, VerifyUserQuery,
};
use crate::domain::billing::{BillingError, StripeWebhookVerifier, VerificationError};
use crate::domain::foundation::DomainError;
use crate::ports::{PaymentProvider, UserRecordRepository};

use super::dto::{
    ApiKeyResponse, CheckoutSessionResponse, ConfigResponse, CreateCheckoutSessionRequest,
    CreateCustomerRequest, CreateCustomerResponse, EmailQuery, ErrorResponse, HealthResponse,
    MeResponse, SubscriptionResponse, UserInfoResponse, VerifyUserRequest, VerifyUserResponse,
    WebhookAckResponse,
};

const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; handlers are built on demand from the shared parts.
#[derive(Clone)]
pub struct BillingAppState {
    pub user_repository: Arc<dyn UserRecordRepository>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub webhook_verifier: StripeWebhookVerifier,
    pub checkout_settings: CheckoutSettings,
    pub acknowledge_policy: AcknowledgePolicy,
    /// Publishable key handed to the storefront.
    pub stripe_public_key: String,
}

impl BillingAppState {
    pub fn create_customer_handler(&self) -> CreateCustomerHandler {
        CreateCustomerHandler::new(self.payment_provider.clone())
    }

    pub fn create_checkout_session_handler(&self) -> CreateCheckoutSessionHandler {
        CreateCheckoutSessionHandler::new(
            self.payment_provider.clone(),
            self.checkout_settings.clone(),
        )
    }

    pub fn verify_user_handler(&self) -> VerifyUserHandler {
        VerifyUserHandler::new(self.user_repository.clone())
    }

    pub fn get_user_info_handler(&self) -> GetUserInfoHandler {
        GetUserInfoHandler::new(self.user_repository.clone())
    }

    pub fn get_api_key_handler(&self) -> GetApiKeyHandler {
        GetApiKeyHandler::new(self.user_repository.clone())
    }

    pub fn get_subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.payment_provider.clone())
    }

    pub fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        HandlePaymentWebhookHandler::new(
            self.webhook_verifier.clone(),
            EventReconciler::new(self.user_repository.clone(), self.payment_provider.clone()),
            self.acknowledge_policy,
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/config - Publishable key for the storefront
pub async fn get_config(State(state): State<BillingAppState>) -> impl IntoResponse {
    Json(ConfigResponse {
        success: true,
        stripe_public_key: state.stripe_public_key.clone(),
    })
}

/// GET /api/user-info?email= - Stored subscription details
pub async fn get_user_info(
    State(state): State<BillingAppState>,
    Query(query): Query<EmailQuery>,
) -> Result<impl IntoResponse, BillingApiError> {
    let email = required_email(query.email)?;
    let record = state
        .get_user_info_handler()
        .handle(GetUserInfoQuery { email })
        .await?;

    Ok(Json(UserInfoResponse {
        success: true,
        user: record.into(),
    }))
}

/// GET /api/user/api-key?email= - Access token, issued on first request
pub async fn get_api_key(
    State(state): State<BillingAppState>,
    Query(query): Query<EmailQuery>,
) -> Result<impl IntoResponse, BillingApiError> {
    let email = required_email(query.email)?;
    let token = state
        .get_api_key_handler()
        .handle(GetApiKeyQuery { email })
        .await?;

    Ok(Json(ApiKeyResponse {
        success: true,
        api_key: token.into_inner(),
    }))
}

/// GET /api/subscription/:customerId - Live subscription at the provider
pub async fn get_subscription(
    State(state): State<BillingAppState>,
    Path(customer_id): Path<String>,
) -> Result<axum::response::Response, BillingApiError> {
    let subscription = state
        .get_subscription_handler()
        .handle(GetSubscriptionQuery { customer_id })
        .await?;

    let response = match subscription {
        Some(subscription) => Json(SubscriptionResponse {
            success: true,
            subscription,
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                "SUBSCRIPTION_NOT_FOUND",
                "No subscription found for customer",
            )),
        )
            .into_response(),
    };

    Ok(response)
}

/// GET /api/me - Subscription summary of the bearer-token holder
pub async fn get_me(RequireAuth(record): RequireAuth) -> impl IntoResponse {
    Json(MeResponse::from(record))
}

/// GET /health - Liveness probe
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/create-customer - Find or create the provider customer
pub async fn create_customer(
    State(state): State<BillingAppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state
        .create_customer_handler()
        .handle(CreateCustomerCommand {
            email: request.email,
            name: request.name,
        })
        .await?;

    Ok(Json(CreateCustomerResponse {
        success: true,
        customer_id: result.customer_id,
    }))
}

/// POST /api/verify-user - Whether a record exists for the email
pub async fn verify_user(
    State(state): State<BillingAppState>,
    Json(request): Json<VerifyUserRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state
        .verify_user_handler()
        .handle(VerifyUserQuery {
            email: request.email,
        })
        .await?;

    Ok(Json(VerifyUserResponse {
        success: true,
        exists: result.exists,
        status: result.status,
        customer_id: result.customer_id,
    }))
}

/// POST /api/create-checkout-session - Hosted checkout for a catalog plan
pub async fn create_checkout_session(
    State(state): State<BillingAppState>,
    Json(request): Json<CreateCheckoutSessionRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state
        .create_checkout_session_handler()
        .handle(CreateCheckoutSessionCommand {
            plan_id: request.plan_id,
            email: request.email,
        })
        .await?;

    Ok(Json(CheckoutSessionResponse {
        success: true,
        session_id: result.session_id,
        url: result.url,
    }))
}

/// POST /webhook-stripe - Stripe webhook events
///
/// The body is taken as raw bytes; the signature covers them exactly.
pub async fn handle_stripe_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, BillingApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            BillingError::from(VerificationError::BadSignature(
                "missing Stripe-Signature header".to_string(),
            ))
        })?;

    state
        .webhook_handler()
        .handle(HandlePaymentWebhookCommand {
            payload: body.to_vec(),
            signature: signature.to_string(),
        })
        .await?;

    Ok(Json(WebhookAckResponse::success()))
}

fn required_email(email: Option<String>) -> Result<String, BillingError> {
    email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| BillingError::validation("email", "Email is required"))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for BillingApiError {
    fn from(err: DomainError) -> Self {
        Self(BillingError::from(err))
    }
}

impl BillingApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            BillingError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            BillingError::InvalidPlan(_) => (StatusCode::BAD_REQUEST, "INVALID_PLAN"),
            BillingError::Verification(_) => (StatusCode::BAD_REQUEST, "INVALID_WEBHOOK"),
            BillingError::MalformedEvent(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "MALFORMED_EVENT")
            }
            BillingError::MissingField(_) => (StatusCode::BAD_REQUEST, "MISSING_FIELD"),
            BillingError::RecordNotFound(_) => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            BillingError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_ERROR"),
            BillingError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        }
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, error = %self.0, "Request failed");
        }
        let body = ErrorResponse::new(code, self.0.to_string());
        (status, Json(body)).into_response()
    }
}
