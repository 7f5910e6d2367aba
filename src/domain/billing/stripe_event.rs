//! Stripe webhook event envelope.
//!
//! Parses the raw Stripe event and narrows it to a `BillingEvent`. Only the
//! fields the reconciler reads are captured; everything else is ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::billing_event::{BillingEvent, VerifiedEvent};
use super::errors::BillingError;
use super::plan::IntervalUnit;

/// Stripe webhook event (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,

    #[serde(default)]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,
}

/// Stripe event types that we reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventType {
    CheckoutSessionCompleted,
    InvoicePaid,
    CustomerSubscriptionDeleted,
    Unknown,
}

impl StripeEventType {
    pub fn from_type(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            // Older integrations listen for payment_succeeded; both mean paid.
            "invoice.paid" | "invoice.payment_succeeded" => Self::InvoicePaid,
            "customer.subscription.deleted" => Self::CustomerSubscriptionDeleted,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    customer: Option<String>,
    customer_email: Option<String>,
    customer_details: Option<CustomerDetails>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvoiceObject {
    customer: Option<String>,
    subscription: Option<String>,
    parent: Option<InvoiceParent>,
    lines: Option<InvoiceLines>,
}

#[derive(Debug, Deserialize)]
struct InvoiceParent {
    subscription_details: Option<SubscriptionDetails>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionDetails {
    subscription: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvoiceLines {
    #[serde(default)]
    data: Vec<InvoiceLine>,
}

#[derive(Debug, Deserialize)]
struct InvoiceLine {
    price: Option<LinePrice>,
    plan: Option<Recurring>,
}

#[derive(Debug, Deserialize)]
struct LinePrice {
    recurring: Option<Recurring>,
}

#[derive(Debug, Deserialize)]
struct Recurring {
    interval: String,
    interval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionObject {
    customer: Option<String>,
}

impl StripeEvent {
    /// Parses the raw body. Call only after the signature checked out.
    pub fn parse(payload: &[u8]) -> Result<Self, BillingError> {
        serde_json::from_slice(payload).map_err(|e| BillingError::MalformedEvent(e.to_string()))
    }

    /// Parses an authenticated body straight into a `VerifiedEvent`.
    pub fn decode(payload: &[u8]) -> Result<VerifiedEvent, BillingError> {
        Self::parse(payload)?.into_verified()
    }

    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::from_type(&self.event_type)
    }

    fn object<T: serde::de::DeserializeOwned>(&self) -> Result<T, BillingError> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|e| BillingError::MalformedEvent(format!("{}: {}", self.event_type, e)))
    }

    /// Narrows the envelope to the closed billing event set.
    pub fn into_verified(self) -> Result<VerifiedEvent, BillingError> {
        let kind = match self.parsed_type() {
            StripeEventType::CheckoutSessionCompleted => {
                let session: CheckoutSessionObject = self.object()?;
                let (details_email, customer_name) = session
                    .customer_details
                    .map(|d| (d.email, d.name))
                    .unwrap_or((None, None));

                BillingEvent::CheckoutCompleted {
                    email: non_empty(details_email).or_else(|| non_empty(session.customer_email)),
                    customer_id: non_empty(session.customer),
                    customer_name: non_empty(customer_name),
                    plan_label: non_empty(session.metadata.get("plan_name").cloned()),
                }
            }

            StripeEventType::InvoicePaid => {
                let invoice: InvoiceObject = self.object()?;
                let subscription_id = invoice.subscription.or_else(|| {
                    invoice
                        .parent
                        .and_then(|p| p.subscription_details)
                        .and_then(|d| d.subscription)
                });
                let recurring = invoice
                    .lines
                    .and_then(|lines| lines.data.into_iter().next())
                    .and_then(|line| line.price.and_then(|p| p.recurring).or(line.plan));

                BillingEvent::InvoicePaid {
                    customer_id: non_empty(invoice.customer),
                    subscription_id: non_empty(subscription_id),
                    interval: recurring
                        .as_ref()
                        .and_then(|r| IntervalUnit::parse(&r.interval)),
                    interval_count: recurring.and_then(|r| r.interval_count),
                }
            }

            StripeEventType::CustomerSubscriptionDeleted => {
                let subscription: SubscriptionObject = self.object()?;
                BillingEvent::SubscriptionCanceled {
                    customer_id: non_empty(subscription.customer),
                }
            }

            StripeEventType::Unknown => BillingEvent::Other(self.event_type.clone()),
        };

        Ok(VerifiedEvent {
            id: self.id,
            created: self.created,
            livemode: self.livemode,
            kind,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
