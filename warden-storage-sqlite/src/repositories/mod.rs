//! Repository implementations for SQLite storage

pub mod account;
pub mod security;

pub use account::SqliteAccountRepository;
pub use security::SqliteSecurityRepository;

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use warden_core::{
    Error,
    error::StorageError,
    repositories::{AccountRepositoryProvider, RepositoryProvider, SecurityRepositoryProvider},
};

/// Repository provider implementation for SQLite
///
/// This struct implements the individual repository provider traits as well
/// as the unified `RepositoryProvider` trait.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    account: Arc<SqliteAccountRepository>,
    security: Arc<SqliteSecurityRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let account = Arc::new(SqliteAccountRepository::new(pool.clone()));
        let security = Arc::new(SqliteSecurityRepository::new(pool.clone()));

        Self {
            pool,
            account,
            security,
        }
    }
}

// Implement individual provider traits

impl AccountRepositoryProvider for SqliteRepositoryProvider {
    type AccountRepo = SqliteAccountRepository;

    fn account(&self) -> &Self::AccountRepo {
        &self.account
    }
}

impl SecurityRepositoryProvider for SqliteRepositoryProvider {
    type SecurityRepo = SqliteSecurityRepository;

    fn security(&self) -> &Self::SecurityRepo {
        &self.security
    }
}

// Implement the unified RepositoryProvider trait

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        use crate::migrations::{
            CreateAccountSecurityTable, CreateAccountsTable, CreateIndexes, SqliteMigrationManager,
        };
        use warden_migration::{Migration, MigrationManager};

        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        let migrations: Vec<Box<dyn Migration<_>>> = vec![
            Box::new(CreateAccountsTable),
            Box::new(CreateAccountSecurityTable),
            Box::new(CreateIndexes),
        ];
        manager.up(&migrations).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        Ok(())
    }
}
