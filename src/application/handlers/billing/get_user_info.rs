//! GetUserInfoHandler - loads the record for an email.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Email, UserRecord};
use crate::ports::UserRecordRepository;

#[derive(Debug, Clone)]
pub struct GetUserInfoQuery {
    pub email: String,
}

pub struct GetUserInfoHandler {
    repository: Arc<dyn UserRecordRepository>,
}

impl GetUserInfoHandler {
    pub fn new(repository: Arc<dyn UserRecordRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: GetUserInfoQuery) -> Result<UserRecord, BillingError> {
        let email = Email::parse(&query.email)?;
        self.repository
            .find_by_email(&email)
            .await?
            .ok_or_else(|| BillingError::RecordNotFound(email.to_string()))
    }
}
