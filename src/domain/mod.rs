//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (timestamps, errors)
//! - `billing` - User records, plans, events and webhook verification

pub mod billing;
pub mod foundation;
