//! SQLite storage backend for the warden account security ecosystem
//!
//! Provides [`SqliteRepositoryProvider`], which implements the repository
//! traits from `warden-core` on top of a `sqlx::SqlitePool`, plus the schema
//! migrations for the `accounts` and `account_security` tables.

pub mod migrations;
pub mod repositories;

pub use repositories::{
    SqliteAccountRepository, SqliteRepositoryProvider, SqliteSecurityRepository,
};
