//! Billing domain - subscription state of one user record per email.
//!
//! # Module Organization
//!
//! - `user_record` - The record and its lifecycle transitions
//! - `plan` - Plan resolution and the checkout catalog
//! - `billing_event` - Closed set of verified lifecycle events
//! - `stripe_event` - Stripe envelope decoding into `BillingEvent`
//! - `webhook_verifier` - `Stripe-Signature` verification
//! - `access_token` - Opaque bearer token issuance

mod access_token;
mod billing_event;
mod email;
mod errors;
mod plan;
mod status;
mod stripe_event;
mod user_record;
mod webhook_verifier;

pub use access_token::AccessToken;
pub use billing_event::{BillingEvent, VerifiedEvent};
pub use email::Email;
pub use errors::{BillingError, VerificationError};
pub use plan::{
    resolve, resolve_by_catalog_id, CatalogPlan, IntervalUnit, ResolvedPlan, ANNUAL_PLAN_NAME,
    CATALOG, CUSTOM_PLAN_NAME, MONTHLY_PLAN_NAME, QUARTERLY_PLAN_NAME,
};
pub use status::SubscriptionStatus;
pub use stripe_event::{StripeEvent, StripeEventData, StripeEventType};
pub use user_record::{CheckoutDetails, UserRecord, CHECKOUT_RENEWAL_MONTHS};
pub use webhook_verifier::{
    sign_payload, verify, SignatureHeader, StripeWebhookVerifier, DEFAULT_TOLERANCE_SECS,
};
