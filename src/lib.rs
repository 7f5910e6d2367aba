//! Billing Bridge - Stripe subscription lifecycle kept in local user records
//!
//! Stripe webhooks are verified and reconciled into one record per customer
//! email; a small REST API serves those records and starts checkouts.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
