//! SQLite implementation of the account repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use warden_core::{
    Error,
    account::{Account, AccountId, NewAccount},
    error::StorageError,
    repositories::AccountRepository,
};

/// SQLite repository for account data.
pub struct SqliteAccountRepository {
    pool: SqlitePool,
}

impl SqliteAccountRepository {
    /// Create a new SQLite account repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteAccountRow {
    id: String,
    name: Option<String>,
    email: String,
    status: String,
    email_verified_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| Error::Storage(StorageError::Database("Invalid timestamp".to_string())))
}

impl SqliteAccountRow {
    fn into_account(self) -> Result<Account, Error> {
        Ok(Account {
            id: AccountId::new(&self.id),
            name: self.name,
            email: self.email,
            status: self.status.parse()?,
            email_verified_at: self.email_verified_at.map(timestamp).transpose()?,
            created_at: timestamp(self.created_at)?,
            updated_at: timestamp(self.updated_at)?,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, name, email, status, email_verified_at, created_at, updated_at";

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn create(&self, account: NewAccount) -> Result<Account, Error> {
        let now = Utc::now().timestamp();

        // The security profile is born with the account so every later
        // security operation is a plain UPDATE keyed by account id.
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to begin transaction");
            StorageError::Database("Failed to create account".to_string())
        })?;

        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, email, status, email_verified_at, created_at, updated_at)
            VALUES (?, ?, ?, 'active', ?, ?, ?)
            "#,
        )
        .bind(account.id.as_str())
        .bind(&account.name)
        .bind(&account.email)
        .bind(account.email_verified_at.map(|dt| dt.timestamp()))
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create account");
            StorageError::Database("Failed to create account".to_string())
        })?;

        sqlx::query(
            r#"
            INSERT INTO account_security
                (account_id, verification_reset_at, forgot_password_reset_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.as_str())
        .bind(now)
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create security profile");
            StorageError::Database("Failed to create account".to_string())
        })?;

        tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit account creation");
            StorageError::Database("Failed to create account".to_string())
        })?;

        self.find_by_id(&account.id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        let row = sqlx::query_as::<_, SqliteAccountRow>(
            format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?").as_str(),
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to get account");
            StorageError::Database("Failed to get account".to_string())
        })?;

        row.map(SqliteAccountRow::into_account).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        let row = sqlx::query_as::<_, SqliteAccountRow>(
            format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?").as_str(),
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to get account by email");
            StorageError::Database("Failed to get account by email".to_string())
        })?;

        row.map(SqliteAccountRow::into_account).transpose()
    }

    async fn update(&self, account: &Account) -> Result<Account, Error> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET name = ?, email = ?, status = ?, email_verified_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&account.name)
        .bind(&account.email)
        .bind(account.status.as_str())
        .bind(account.email_verified_at.map(|dt| dt.timestamp()))
        .bind(Utc::now().timestamp())
        .bind(account.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to update account");
            StorageError::Database("Failed to update account".to_string())
        })?;

        self.find_by_id(&account.id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))
    }

    async fn delete(&self, id: &AccountId) -> Result<(), Error> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to begin transaction");
            StorageError::Database("Failed to delete account".to_string())
        })?;

        sqlx::query("DELETE FROM account_security WHERE account_id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete security profile");
                StorageError::Database("Failed to delete account".to_string())
            })?;

        sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete account");
                StorageError::Database("Failed to delete account".to_string())
            })?;

        tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit account deletion");
            StorageError::Database("Failed to delete account".to_string())
        })?;

        Ok(())
    }

    async fn mark_email_verified(&self, id: &AccountId) -> Result<(), Error> {
        let now = Utc::now().timestamp();

        sqlx::query("UPDATE accounts SET email_verified_at = ?, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(now)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to mark email verified");
                StorageError::Database("Failed to mark email verified".to_string())
            })?;

        Ok(())
    }
}
