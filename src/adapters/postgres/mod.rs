//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresUserRecordRepository` - one row per customer email

mod user_record_repository;

pub use user_record_repository::PostgresUserRecordRepository;
