//! In-memory implementation of `UserRecordRepository`.
//!
//! Mirrors the PostgreSQL adapter's semantics: one record per email, `upsert`
//! never replaces a stored access token or `created_at`. All writes take the
//! same lock, so concurrent upserts for one email are serialized.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::{AccessToken, Email, UserRecord};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::UserRecordRepository;

#[derive(Default)]
pub struct InMemoryUserRecordRepository {
    records: RwLock<HashMap<Email, UserRecord>>,
    fail_writes: AtomicBool,
}

impl InMemoryUserRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with existing records.
    pub async fn with_records(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.records.write().await;
            for record in records {
                map.insert(record.email.clone(), record);
            }
        }
        repo
    }

    /// Makes every subsequent write fail with a database error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn all(&self) -> Vec<UserRecord> {
        self.records.read().await.values().cloned().collect()
    }

    fn check_writable(&self) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::database("in-memory store is read-only"));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRecordRepository for InMemoryUserRecordRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, DomainError> {
        Ok(self.records.read().await.get(email).cloned())
    }

    async fn find_by_access_token(&self, token: &str) -> Result<Option<UserRecord>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.access_token.as_ref().map(|t| t.as_str()) == Some(token))
            .cloned())
    }

    async fn create(&self, record: &UserRecord) -> Result<(), DomainError> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        if records.contains_key(&record.email) {
            return Err(DomainError::new(
                ErrorCode::RecordExists,
                format!("User record already exists: {}", record.email),
            ));
        }
        records.insert(record.email.clone(), record.clone());
        Ok(())
    }

    async fn upsert(&self, record: &UserRecord) -> Result<UserRecord, DomainError> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        let stored = match records.get(&record.email) {
            Some(existing) => UserRecord {
                access_token: existing
                    .access_token
                    .clone()
                    .or_else(|| record.access_token.clone()),
                created_at: existing.created_at,
                modified_at: record.modified_at.or(Some(record.created_at)),
                ..record.clone()
            },
            None => record.clone(),
        };
        records.insert(stored.email.clone(), stored.clone());
        Ok(stored)
    }

    async fn update(&self, record: &UserRecord) -> Result<(), DomainError> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        let existing = records.get_mut(&record.email).ok_or_else(|| {
            DomainError::new(
                ErrorCode::NotFound,
                format!("User record not found: {}", record.email),
            )
        })?;
        let access_token = existing
            .access_token
            .clone()
            .or_else(|| record.access_token.clone());
        *existing = UserRecord {
            access_token,
            ..record.clone()
        };
        Ok(())
    }

    async fn assign_access_token(
        &self,
        email: &Email,
        token: &AccessToken,
    ) -> Result<UserRecord, DomainError> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        let existing = records.get_mut(email).ok_or_else(|| {
            DomainError::new(
                ErrorCode::NotFound,
                format!("User record not found: {}", email),
            )
        })?;
        if existing.access_token.is_none() {
            existing.access_token = Some(token.clone());
        }
        Ok(existing.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{CheckoutDetails, SubscriptionStatus};
    use crate::domain::foundation::Timestamp;

    fn record(email: &str) -> UserRecord {
        UserRecord::from_checkout(
            Email::parse(email).unwrap(),
            CheckoutDetails {
                customer_id: Some("cus_1".to_string()),
                customer_name: None,
                plan_name: "Plano Anual".to_string(),
            },
            Timestamp::now(),
        )
    }

    #[tokio::test]
    async fn create_then_find() {
        let repo = InMemoryUserRecordRepository::new();
        let rec = record("a@x.com");

        repo.create(&rec).await.unwrap();

        let found = repo.find_by_email(&rec.email).await.unwrap();
        assert_eq!(found, Some(rec.clone()));

        let token = rec.access_token.as_ref().unwrap().as_str();
        let by_token = repo.find_by_access_token(token).await.unwrap();
        assert_eq!(by_token.map(|r| r.email), Some(rec.email));
    }

    #[tokio::test]
    async fn create_twice_is_record_exists() {
        let repo = InMemoryUserRecordRepository::new();
        repo.create(&record("a@x.com")).await.unwrap();

        let err = repo.create(&record("a@x.com")).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::RecordExists);
    }

    #[tokio::test]
    async fn upsert_keeps_first_token_and_created_at() {
        let repo = InMemoryUserRecordRepository::new();
        let first = record("a@x.com");
        repo.create(&first).await.unwrap();

        let mut second = record("a@x.com");
        second.plan = Some("Plano Trimestral".to_string());
        second.created_at = first.created_at.add_days(1);
        let stored = repo.upsert(&second).await.unwrap();

        assert_eq!(stored.access_token, first.access_token);
        assert_eq!(stored.created_at, first.created_at);
        assert_eq!(stored.plan.as_deref(), Some("Plano Trimestral"));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn upsert_insert_leaves_modified_at_unset() {
        let repo = InMemoryUserRecordRepository::new();

        let stored = repo.upsert(&record("a@x.com")).await.unwrap();

        assert_eq!(stored.modified_at, None);
    }

    #[tokio::test]
    async fn fresh_record_landing_on_existing_one_stamps_modified_at() {
        let repo = InMemoryUserRecordRepository::new();
        let first = record("a@x.com");
        repo.create(&first).await.unwrap();

        let mut second = record("a@x.com");
        second.created_at = first.created_at.add_days(1);
        let stored = repo.upsert(&second).await.unwrap();

        assert_eq!(stored.created_at, first.created_at);
        assert_eq!(stored.modified_at, Some(second.created_at));
    }

    #[tokio::test]
    async fn assign_access_token_writes_only_the_token() {
        let mut rec = record("a@x.com");
        rec.access_token = None;
        let repo = InMemoryUserRecordRepository::with_records([rec.clone()]).await;

        // A reconciliation lands after the caller read the record
        let mut canceled = rec.clone();
        canceled.status = SubscriptionStatus::Inactive;
        repo.update(&canceled).await.unwrap();

        let token = AccessToken::issue();
        let stored = repo.assign_access_token(&rec.email, &token).await.unwrap();

        assert_eq!(stored.access_token, Some(token));
        assert_eq!(stored.status, SubscriptionStatus::Inactive);
    }

    #[tokio::test]
    async fn assign_access_token_keeps_existing_token() {
        let rec = record("a@x.com");
        let original = rec.access_token.clone();
        let repo = InMemoryUserRecordRepository::with_records([rec.clone()]).await;

        let stored = repo
            .assign_access_token(&rec.email, &AccessToken::issue())
            .await
            .unwrap();

        assert_eq!(stored.access_token, original);
    }

    #[tokio::test]
    async fn assign_access_token_for_missing_record_is_not_found() {
        let repo = InMemoryUserRecordRepository::new();
        let email = Email::parse("a@x.com").unwrap();

        let err = repo
            .assign_access_token(&email, &AccessToken::issue())
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn concurrent_upserts_assign_one_token() {
        let repo = std::sync::Arc::new(InMemoryUserRecordRepository::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.upsert(&record("a@x.com")).await.unwrap() })
            })
            .collect();

        let mut tokens = Vec::new();
        for handle in handles {
            tokens.push(handle.await.unwrap().access_token);
        }

        assert!(tokens.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let repo = InMemoryUserRecordRepository::new();

        let err = repo.update(&record("a@x.com")).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn update_never_replaces_token() {
        let rec = record("a@x.com");
        let repo = InMemoryUserRecordRepository::with_records([rec.clone()]).await;

        let mut changed = rec.clone();
        changed.access_token = Some(AccessToken::issue());
        repo.update(&changed).await.unwrap();

        let stored = repo.find_by_email(&rec.email).await.unwrap().unwrap();
        assert_eq!(stored.access_token, rec.access_token);
    }

    #[tokio::test]
    async fn failing_writes_surface_database_error() {
        let repo = InMemoryUserRecordRepository::new();
        repo.set_fail_writes(true);

        let err = repo.upsert(&record("a@x.com")).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(repo.is_empty().await);
    }
}
