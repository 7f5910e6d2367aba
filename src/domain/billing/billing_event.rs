//! Verified billing events.
//!
//! The closed set of lifecycle events the reconciler understands. Each variant
//! carries only the fields its transition reads; anything the provider sends
//! that we do not handle arrives as `Other`.

use super::plan::IntervalUnit;

/// Event that passed signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedEvent {
    /// Provider event id (evt_...).
    pub id: String,
    /// Provider creation time, Unix seconds.
    pub created: i64,
    pub livemode: bool,
    pub kind: BillingEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    /// A checkout session finished and a subscription started.
    CheckoutCompleted {
        email: Option<String>,
        customer_id: Option<String>,
        customer_name: Option<String>,
        plan_label: Option<String>,
    },

    /// A subscription invoice was paid.
    InvoicePaid {
        customer_id: Option<String>,
        subscription_id: Option<String>,
        interval: Option<IntervalUnit>,
        interval_count: Option<u32>,
    },

    /// The subscription was canceled.
    SubscriptionCanceled { customer_id: Option<String> },

    /// Any event type we do not reconcile.
    Other(String),
}

impl BillingEvent {
    /// Short label for logs.
    pub fn kind_name(&self) -> &str {
        match self {
            BillingEvent::CheckoutCompleted { .. } => "checkout_completed",
            BillingEvent::InvoicePaid { .. } => "invoice_paid",
            BillingEvent::SubscriptionCanceled { .. } => "subscription_canceled",
            BillingEvent::Other(kind) => kind,
        }
    }
}
