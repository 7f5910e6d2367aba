//! PostgreSQL implementation of UserRecordRepository.
//!
//! Records live in the `users` table keyed by email. The unique constraint on
//! email serializes concurrent creates, and `COALESCE` on `access_token` keeps
//! the first token ever assigned.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::billing::{AccessToken, Email, SubscriptionStatus, UserRecord};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::UserRecordRepository;

const SELECT_COLUMNS: &str = r#"
    SELECT email, name, stripe_customer_id, status, plan, access_token,
           created_at, subscribed_at, renews_at, modified_at
    FROM users
"#;

/// PostgreSQL implementation of the UserRecordRepository port.
pub struct PostgresUserRecordRepository {
    pool: PgPool,
}

impl PostgresUserRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a user record.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    email: String,
    name: Option<String>,
    stripe_customer_id: Option<String>,
    status: String,
    plan: Option<String>,
    access_token: Option<String>,
    created_at: DateTime<Utc>,
    subscribed_at: Option<DateTime<Utc>>,
    renews_at: Option<DateTime<Utc>>,
    modified_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored email: {}", e))
        })?;
        let status = SubscriptionStatus::parse(&row.status)
            .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.message))?;

        Ok(UserRecord {
            email,
            name: row.name,
            external_customer_id: row.stripe_customer_id,
            status,
            plan: row.plan,
            access_token: row.access_token.map(AccessToken::from_stored),
            created_at: Timestamp::from_datetime(row.created_at),
            subscribed_at: row.subscribed_at.map(Timestamp::from_datetime),
            renews_at: row.renews_at.map(Timestamp::from_datetime),
            modified_at: row.modified_at.map(Timestamp::from_datetime),
        })
    }
}

fn optional_datetime(ts: Option<Timestamp>) -> Option<DateTime<Utc>> {
    ts.map(|t| *t.as_datetime())
}

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("Failed to {} user record: {}", action, e))
}

#[async_trait]
impl UserRecordRepository for PostgresUserRecordRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, DomainError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("{} WHERE email = $1", SELECT_COLUMNS))
                .bind(email.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("find", e))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_access_token(&self, token: &str) -> Result<Option<UserRecord>, DomainError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("{} WHERE access_token = $1", SELECT_COLUMNS))
                .bind(token)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("find", e))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn create(&self, record: &UserRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                email, name, stripe_customer_id, status, plan, access_token,
                created_at, subscribed_at, renews_at, modified_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.email.as_str())
        .bind(&record.name)
        .bind(&record.external_customer_id)
        .bind(record.status.as_str())
        .bind(&record.plan)
        .bind(record.access_token.as_ref().map(|t| t.as_str()))
        .bind(record.created_at.as_datetime())
        .bind(optional_datetime(record.subscribed_at))
        .bind(optional_datetime(record.renews_at))
        .bind(optional_datetime(record.modified_at))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("users_pkey") {
                    return DomainError::new(
                        ErrorCode::RecordExists,
                        format!("User record already exists: {}", record.email),
                    );
                }
            }
            db_error("create", e)
        })?;

        Ok(())
    }

    async fn upsert(&self, record: &UserRecord) -> Result<UserRecord, DomainError> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (
                email, name, stripe_customer_id, status, plan, access_token,
                created_at, subscribed_at, renews_at, modified_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (email) DO UPDATE SET
                name = EXCLUDED.name,
                stripe_customer_id = EXCLUDED.stripe_customer_id,
                status = EXCLUDED.status,
                plan = EXCLUDED.plan,
                access_token = COALESCE(users.access_token, EXCLUDED.access_token),
                subscribed_at = EXCLUDED.subscribed_at,
                renews_at = EXCLUDED.renews_at,
                modified_at = COALESCE(EXCLUDED.modified_at, EXCLUDED.created_at)
            RETURNING email, name, stripe_customer_id, status, plan, access_token,
                      created_at, subscribed_at, renews_at, modified_at
            "#,
        )
        .bind(record.email.as_str())
        .bind(&record.name)
        .bind(&record.external_customer_id)
        .bind(record.status.as_str())
        .bind(&record.plan)
        .bind(record.access_token.as_ref().map(|t| t.as_str()))
        .bind(record.created_at.as_datetime())
        .bind(optional_datetime(record.subscribed_at))
        .bind(optional_datetime(record.renews_at))
        .bind(optional_datetime(record.modified_at))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("upsert", e))?;

        UserRecord::try_from(row)
    }

    async fn update(&self, record: &UserRecord) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = $2,
                stripe_customer_id = $3,
                status = $4,
                plan = $5,
                access_token = COALESCE(access_token, $6),
                subscribed_at = $7,
                renews_at = $8,
                modified_at = $9
            WHERE email = $1
            "#,
        )
        .bind(record.email.as_str())
        .bind(&record.name)
        .bind(&record.external_customer_id)
        .bind(record.status.as_str())
        .bind(&record.plan)
        .bind(record.access_token.as_ref().map(|t| t.as_str()))
        .bind(optional_datetime(record.subscribed_at))
        .bind(optional_datetime(record.renews_at))
        .bind(optional_datetime(record.modified_at))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::NotFound,
                format!("User record not found: {}", record.email),
            ));
        }

        Ok(())
    }

    async fn assign_access_token(
        &self,
        email: &Email,
        token: &AccessToken,
    ) -> Result<UserRecord, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            UPDATE users SET access_token = COALESCE(access_token, $2)
            WHERE email = $1
            RETURNING email, name, stripe_customer_id, status, plan, access_token,
                      created_at, subscribed_at, renews_at, modified_at
            "#,
        )
        .bind(email.as_str())
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("assign_access_token", e))?;

        let row = row.ok_or_else(|| {
            DomainError::new(ErrorCode::NotFound, format!("User record not found: {}", email))
        })?;
        UserRecord::try_from(row)
    }
}
