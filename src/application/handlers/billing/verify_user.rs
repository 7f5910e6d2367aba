//! VerifyUserHandler - reports whether a record exists for an email.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Email, SubscriptionStatus};
use crate::ports::UserRecordRepository;

#[derive(Debug, Clone)]
pub struct VerifyUserQuery {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyUserResult {
    pub exists: bool,
    pub status: Option<SubscriptionStatus>,
    pub customer_id: Option<String>,
}

pub struct VerifyUserHandler {
    repository: Arc<dyn UserRecordRepository>,
}

impl VerifyUserHandler {
    pub fn new(repository: Arc<dyn UserRecordRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: VerifyUserQuery) -> Result<VerifyUserResult, BillingError> {
        let email = Email::parse(&query.email)?;
        let record = self.repository.find_by_email(&email).await?;

        Ok(match record {
            Some(record) => VerifyUserResult {
                exists: true,
                status: Some(record.status),
                customer_id: record.external_customer_id,
            },
            None => VerifyUserResult {
                exists: false,
                status: None,
                customer_id: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryUserRecordRepository;
    use crate::domain::billing::{CheckoutDetails, UserRecord};
    use crate::domain::foundation::Timestamp;

    #[tokio::test]
    async fn existing_record_reports_status_and_customer() {
        let record = UserRecord::from_checkout(
            Email::parse("a@x.com").unwrap(),
            CheckoutDetails {
                customer_id: Some("cus_1".to_string()),
                customer_name: None,
                plan_name: "Plano Anual".to_string(),
            },
            Timestamp::now(),
        );
        let repo = InMemoryUserRecordRepository::with_records([record]).await;
        let handler = VerifyUserHandler::new(Arc::new(repo));

        let result = handler
            .handle(VerifyUserQuery {
                email: "a@x.com".to_string(),
            })
            .await
            .unwrap();

        assert!(result.exists);
        assert_eq!(result.status, Some(SubscriptionStatus::Active));
        assert_eq!(result.customer_id.as_deref(), Some("cus_1"));
    }

    #[tokio::test]
    async fn unknown_email_does_not_exist() {
        let handler = VerifyUserHandler::new(Arc::new(InMemoryUserRecordRepository::new()));

        let result = handler
            .handle(VerifyUserQuery {
                email: "nobody@x.com".to_string(),
            })
            .await
            .unwrap();

        assert!(!result.exists);
        assert_eq!(result.status, None);
    }

    #[tokio::test]
    async fn missing_email_is_validation_error() {
        let handler = VerifyUserHandler::new(Arc::new(InMemoryUserRecordRepository::new()));

        let err = handler
            .handle(VerifyUserQuery {
                email: String::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::Validation { .. }));
    }
}
