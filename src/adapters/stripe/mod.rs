//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port for Stripe integration:
//! - Customer lookup and creation
//! - Subscription listing
//! - Checkout sessions with inline catalog prices
//!
//! Webhook verification is not here; it needs no network and lives in the
//! billing domain.

mod api_types;
mod mock_payment_provider;
mod stripe_adapter;

pub use api_types::{
    StripeCheckoutSession, StripeCustomer, StripeErrorBody, StripeList, StripeSubscription,
};
pub use mock_payment_provider::{MethodCall, MockPaymentProvider};
pub use stripe_adapter::{StripeConfig, StripePaymentAdapter};
