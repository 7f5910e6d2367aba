//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `PaymentProvider` - Stripe customers, subscriptions and checkout
//! - `UserRecordRepository` - Persistence of the one record per email

mod payment_provider;
mod user_record_repository;

pub use payment_provider::{
    CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest, Customer, PaymentError,
    PaymentErrorCode, PaymentProvider, ProviderSubscriptionStatus, Subscription,
};
pub use user_record_repository::UserRecordRepository;
