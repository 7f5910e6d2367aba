//! Axum router configuration for billing endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::adapters::http::middleware::auth_middleware;

use super::handlers::{
    create_checkout_session, create_customer, get_api_key, get_config, get_me, get_subscription,
    get_user_info, handle_stripe_webhook, health, verify_user, BillingAppState,
};

/// Public storefront API.
///
/// # Routes
/// - `GET /api/config`
/// - `POST /api/create-customer`
/// - `POST /api/verify-user`
/// - `GET /api/user-info?email=`
/// - `GET /api/user/api-key?email=`
/// - `GET /api/subscription/:customerId`
/// - `POST /api/create-checkout-session`
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/api/config", get(get_config))
        .route("/api/create-customer", post(create_customer))
        .route("/api/verify-user", post(verify_user))
        .route("/api/user-info", get(get_user_info))
        .route("/api/user/api-key", get(get_api_key))
        .route("/api/subscription/:customer_id", get(get_subscription))
        .route("/api/create-checkout-session", post(create_checkout_session))
}

/// Stripe webhook endpoint. No user auth; the signature is verified instead.
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/webhook-stripe", post(handle_stripe_webhook))
}

/// Routes behind the bearer access-token middleware.
pub fn account_routes(state: &BillingAppState) -> Router<BillingAppState> {
    Router::new()
        .route("/api/me", get(get_me))
        .route_layer(middleware::from_fn_with_state(
            state.user_repository.clone(),
            auth_middleware,
        ))
}

/// Complete billing router with state applied.
///
/// # Example
///
/// ```ignore
/// let app = billing_router(state).layer(TraceLayer::new_for_http());
/// axum::serve(listener, app).await?;
/// ```
pub fn billing_router(state: BillingAppState) -> Router {
    Router::new()
        .merge(billing_routes())
        .merge(webhook_routes())
        .merge(account_routes(&state))
        .route("/health", get(health))
        .with_state(state)
}
