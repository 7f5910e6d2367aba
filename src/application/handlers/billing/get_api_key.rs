//! GetApiKeyHandler - returns the access token of a record.
//!
//! Records created before tokens existed get one on first request. Only the
//! token column is written, and the store keeps whichever token landed first.

use std::sync::Arc;

use tracing::info;

use crate::domain::billing::{AccessToken, BillingError, Email};
use crate::ports::UserRecordRepository;

#[derive(Debug, Clone)]
pub struct GetApiKeyQuery {
    pub email: String,
}

pub struct GetApiKeyHandler {
    repository: Arc<dyn UserRecordRepository>,
}

impl GetApiKeyHandler {
    pub fn new(repository: Arc<dyn UserRecordRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: GetApiKeyQuery) -> Result<AccessToken, BillingError> {
        let email = Email::parse(&query.email)?;
        let record = self
            .repository
            .find_by_email(&email)
            .await?
            .ok_or_else(|| BillingError::RecordNotFound(email.to_string()))?;

        if let Some(token) = record.access_token {
            return Ok(token);
        }

        let stored = self
            .repository
            .assign_access_token(&email, &AccessToken::issue())
            .await?;
        info!(email = %email, "access token issued");

        stored
            .access_token
            .ok_or_else(|| BillingError::Storage("access token was not persisted".to_string()))
    }
}
