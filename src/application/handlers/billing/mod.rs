//! Billing handlers.
//!
//! ## Commands
//! - Reconciling verified webhook events into user records
//! - Creating provider customers and checkout sessions
//!
//! ## Queries
//! - Record existence, user info and access token by email
//! - Live subscription lookup at the provider

mod create_checkout_session;
mod create_customer;
mod get_api_key;
mod get_subscription;
mod get_user_info;
mod handle_payment_webhook;
mod reconcile_event;
mod verify_user;

// Commands
pub use create_checkout_session::{
    CheckoutSettings, CreateCheckoutSessionCommand, CreateCheckoutSessionHandler,
    CreateCheckoutSessionResult,
};
pub use create_customer::{CreateCustomerCommand, CreateCustomerHandler, CreateCustomerResult};
pub use handle_payment_webhook::{
    AcknowledgePolicy, HandlePaymentWebhookCommand, HandlePaymentWebhookHandler,
    HandlePaymentWebhookResult,
};
pub use reconcile_event::{EventReconciler, ReconcileOutcome};

// Queries
pub use get_api_key::{GetApiKeyHandler, GetApiKeyQuery};
pub use get_subscription::{GetSubscriptionHandler, GetSubscriptionQuery};
pub use get_user_info::{GetUserInfoHandler, GetUserInfoQuery};
pub use verify_user::{VerifyUserHandler, VerifyUserQuery, VerifyUserResult};
