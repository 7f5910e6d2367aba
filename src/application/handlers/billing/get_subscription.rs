//! GetSubscriptionHandler - live subscription lookup at the provider.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::ports::{PaymentProvider, Subscription};

#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub customer_id: String,
}

pub struct GetSubscriptionHandler {
    payment_provider: Arc<dyn PaymentProvider>,
}

impl GetSubscriptionHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self { payment_provider }
    }

    /// Returns the customer's most relevant subscription: the newest one that
    /// grants access, else the newest of any status.
    pub async fn handle(
        &self,
        query: GetSubscriptionQuery,
    ) -> Result<Option<Subscription>, BillingError> {
        let customer_id = query.customer_id.trim();
        if customer_id.is_empty() {
            return Err(BillingError::validation("customerId", "Customer ID is required"));
        }

        let subscriptions = self.payment_provider.list_subscriptions(customer_id).await?;
        let preferred = subscriptions
            .iter()
            .position(|s| s.status.has_access())
            .unwrap_or(0);

        Ok(subscriptions.into_iter().nth(preferred))
    }
}
