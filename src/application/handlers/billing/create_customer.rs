//! CreateCustomerHandler - finds or creates the provider customer for an email.

use std::sync::Arc;

use tracing::info;

use crate::domain::billing::{BillingError, Email};
use crate::ports::{CreateCustomerRequest, PaymentProvider};

#[derive(Debug, Clone)]
pub struct CreateCustomerCommand {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCustomerResult {
    pub customer_id: String,
    /// False when an existing customer with the email was reused.
    pub created: bool,
}

pub struct CreateCustomerHandler {
    payment_provider: Arc<dyn PaymentProvider>,
}

impl CreateCustomerHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self { payment_provider }
    }

    pub async fn handle(
        &self,
        cmd: CreateCustomerCommand,
    ) -> Result<CreateCustomerResult, BillingError> {
        let email = Email::parse(&cmd.email)?;

        let existing = self
            .payment_provider
            .list_customers_by_email(email.as_str())
            .await?;
        if let Some(customer) = existing.into_iter().next() {
            return Ok(CreateCustomerResult {
                customer_id: customer.id,
                created: false,
            });
        }

        let customer = self
            .payment_provider
            .create_customer(CreateCustomerRequest {
                email: email.to_string(),
                name: cmd.name.filter(|n| !n.trim().is_empty()),
            })
            .await?;

        info!(email = %email, customer_id = %customer.id, "provider customer created");

        Ok(CreateCustomerResult {
            customer_id: customer.id,
            created: true,
        })
    }
}
