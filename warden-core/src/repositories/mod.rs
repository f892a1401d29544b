//! Repository traits for the data access layer
//!
//! This module defines the repository interfaces that services use to interact
//! with storage. The system uses a composable trait hierarchy:
//!
//! - Individual `*Repository` traits define the operations for each data domain
//! - Individual `*RepositoryProvider` traits provide access to each repository type
//! - [`RepositoryProvider`] is a supertrait combining all provider traits plus
//!   lifecycle methods
//!
//! This design lets storage backends share repository implementations and
//! expose a single unified provider to the facade.

pub mod account;
pub mod adapter;
pub mod security;

pub use account::AccountRepository;
pub use adapter::{AccountRepositoryAdapter, SecurityRepositoryAdapter};
pub use security::SecurityRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for account repository access.
pub trait AccountRepositoryProvider: Send + Sync + 'static {
    /// The account repository implementation type
    type AccountRepo: AccountRepository;

    /// Get the account repository
    fn account(&self) -> &Self::AccountRepo;
}

/// Provider trait for security repository access.
pub trait SecurityRepositoryProvider: Send + Sync + 'static {
    /// The security repository implementation type
    type SecurityRepo: SecurityRepository;

    /// Get the security repository
    fn security(&self) -> &Self::SecurityRepo;
}

/// Provider trait that storage implementations must implement to provide all
/// repositories, plus lifecycle methods for migrations and health checks.
///
/// # Implementing a Custom Storage Backend
///
/// 1. Implement each individual `*Repository` trait for your backend
/// 2. Implement each individual `*RepositoryProvider` trait
/// 3. Implement `RepositoryProvider` with `migrate()` and `health_check()`
#[async_trait]
pub trait RepositoryProvider: AccountRepositoryProvider + SecurityRepositoryProvider {
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
