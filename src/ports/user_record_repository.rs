//! User record repository port.
//!
//! A key-value store of `UserRecord`s keyed by email. No cross-record
//! transactions are needed; the only concurrency guarantee required is that
//! a record's access token, once stored, is never replaced.

use async_trait::async_trait;

use crate::domain::billing::{AccessToken, Email, UserRecord};
use crate::domain::foundation::DomainError;

#[async_trait]
pub trait UserRecordRepository: Send + Sync {
    /// Find a record by its email.
    ///
    /// Returns `None` if no record exists.
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, DomainError>;

    /// Find the record holding the given access token.
    async fn find_by_access_token(&self, token: &str) -> Result<Option<UserRecord>, DomainError>;

    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// - `RecordExists` if a record for the email already exists
    /// - `DatabaseError` on persistence failure
    async fn create(&self, record: &UserRecord) -> Result<(), DomainError>;

    /// Insert or update the record keyed by its email.
    ///
    /// If a record already exists, its `created_at` is kept and so is its
    /// access token when one is set. An incoming record without `modified_at`
    /// that lands on an existing one stamps `modified_at` with its own
    /// `created_at`, so a stored record with no `modified_at` was inserted by
    /// this call. Returns the record as stored.
    async fn upsert(&self, record: &UserRecord) -> Result<UserRecord, DomainError>;

    /// Store `token` on the record for `email` unless it already has one.
    /// No other field is written. Returns the record as stored.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no record exists for the email
    /// - `DatabaseError` on persistence failure
    async fn assign_access_token(
        &self,
        email: &Email,
        token: &AccessToken,
    ) -> Result<UserRecord, DomainError>;

    /// Update an existing record. The stored access token is never replaced
    /// once set.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no record exists for the email
    /// - `DatabaseError` on persistence failure
    async fn update(&self, record: &UserRecord) -> Result<(), DomainError>;
}
