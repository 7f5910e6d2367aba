//! HTTP adapter for billing endpoints.
//!
//! Exposes the billing handlers via REST API:
//! - `GET /api/config` - Stripe publishable key
//! - `POST /api/create-customer` - Find or create a Stripe customer
//! - `POST /api/verify-user` - Record existence by email
//! - `GET /api/user-info` - Stored subscription details
//! - `GET /api/user/api-key` - Access token for an email
//! - `GET /api/subscription/:customerId` - Live Stripe subscription
//! - `POST /api/create-checkout-session` - Hosted checkout for a catalog plan
//! - `POST /webhook-stripe` - Stripe webhooks
//! - `GET /api/me` - Bearer-authenticated summary
//! - `GET /health` - Liveness

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{BillingApiError, BillingAppState};
pub use routes::{account_routes, billing_router, billing_routes, webhook_routes};
