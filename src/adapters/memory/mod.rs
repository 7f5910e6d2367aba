//! In-memory adapters.
//!
//! Used by tests and by local runs without a database.

mod user_record_repository;

pub use user_record_repository::InMemoryUserRecordRepository;
