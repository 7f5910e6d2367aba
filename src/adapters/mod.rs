//! Adapters - Implementations of ports for specific technologies.
//!
//! - `http` - axum REST API
//! - `memory` - in-memory record store for tests and local runs
//! - `postgres` - sqlx record store
//! - `stripe` - Stripe REST client and a mock provider

pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;
