//! Stripe REST API response types.
//!
//! Only the fields the adapter reads are modeled; serde ignores the rest.

use serde::Deserialize;

use crate::domain::billing::IntervalUnit;
use crate::ports::{Customer, ProviderSubscriptionStatus, Subscription};

/// Paginated Stripe list.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeList<T> {
    pub data: Vec<T>,

    #[serde(default)]
    pub has_more: bool,
}

/// Stripe customer object (cus_xxx). Deleted customers come back with only
/// `id` and `deleted: true`.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomer {
    pub id: String,

    pub email: Option<String>,

    pub name: Option<String>,

    #[serde(default)]
    pub created: i64,

    #[serde(default)]
    pub deleted: bool,
}

impl From<StripeCustomer> for Customer {
    fn from(c: StripeCustomer) -> Self {
        Customer {
            id: c.id,
            email: c.email,
            name: c.name,
            created_at: c.created,
        }
    }
}

/// Stripe subscription object (sub_xxx).
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: String,

    pub customer: String,

    pub status: ProviderSubscriptionStatus,

    /// Moved to the subscription item in newer API versions.
    pub current_period_start: Option<i64>,

    pub current_period_end: Option<i64>,

    #[serde(default)]
    pub cancel_at_period_end: bool,

    pub canceled_at: Option<i64>,

    #[serde(default)]
    pub items: StripeSubscriptionItems,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeSubscriptionItems {
    #[serde(default)]
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    pub price: Option<StripePrice>,

    pub current_period_start: Option<i64>,

    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePrice {
    pub recurring: Option<StripeRecurring>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeRecurring {
    pub interval: String,

    pub interval_count: Option<u32>,
}

impl From<StripeSubscription> for Subscription {
    fn from(s: StripeSubscription) -> Self {
        let item = s.items.data.into_iter().next();
        let recurring = item
            .as_ref()
            .and_then(|i| i.price.as_ref())
            .and_then(|p| p.recurring.clone());

        Subscription {
            id: s.id,
            customer_id: s.customer,
            status: s.status,
            current_period_start: s
                .current_period_start
                .or_else(|| item.as_ref().and_then(|i| i.current_period_start)),
            current_period_end: s
                .current_period_end
                .or_else(|| item.as_ref().and_then(|i| i.current_period_end)),
            cancel_at_period_end: s.cancel_at_period_end,
            canceled_at: s.canceled_at,
            interval: recurring
                .as_ref()
                .and_then(|r| IntervalUnit::parse(&r.interval)),
            interval_count: recurring.and_then(|r| r.interval_count),
        }
    }
}

/// Stripe checkout session object (cs_xxx).
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,

    /// Hosted payment page.
    pub url: Option<String>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    pub error: StripeApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiError {
    #[serde(rename = "type")]
    pub error_type: Option<String>,

    pub code: Option<String>,

    pub message: Option<String>,
}
