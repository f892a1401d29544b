//! # Warden
//!
//! Warden is an account security and abuse-prevention toolkit for Rust
//! applications. It rate-limits sensitive authentication operations
//! (email-verification resend, password-reset requests) with per-account
//! rolling windows, escalates repeated abuse into temporary suspensions, and
//! keeps requests against unknown emails indistinguishable from rate-limited
//! ones so callers cannot enumerate accounts.
//!
//! Warden does not send email, hash passwords, or issue sessions. It decides
//! whether those operations may proceed, and hands route handlers a
//! structured [`Decision`] to act on.
//!
//! ## Storage Support
//!
//! Warden currently ships a SQLite backend; any store that can express the
//! conditional single-statement updates in
//! `warden_core::repositories::SecurityRepository` can be plugged in.
//!
//! ## Example
//!
//! ```rust,no_run
//! use warden::Warden;
//! use warden_storage_sqlite::SqliteRepositoryProvider;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
//!     let repositories = Arc::new(SqliteRepositoryProvider::new(pool));
//!
//!     let warden = Warden::new(repositories);
//!     warden.migrate().await.unwrap();
//!
//!     let decision = warden
//!         .check_forgot_password("shopper@example.com")
//!         .await
//!         .unwrap();
//!     if decision.allowed {
//!         // send the reset email
//!     }
//! }
//! ```
use std::sync::Arc;

use warden_core::{
    RepositoryProvider,
    repositories::{AccountRepositoryAdapter, SecurityRepositoryAdapter},
    services::{AccountService, SecurityDecisionService},
};

/// Re-export core types from warden_core
///
/// These types are commonly used when working with the Warden API.
pub use warden_core::{
    Account, AccountId, AccountStatus, Decision, DenyReason, NewAccount, OperationClass,
    ResetScope, SecurityPolicy, SecurityProfile, SecurityStatus,
};

/// Re-export storage backends
///
/// These storage implementations are available when the corresponding feature
/// is enabled.
#[cfg(feature = "sqlite")]
pub use warden_storage_sqlite::SqliteRepositoryProvider;

/// Errors that can occur when using Warden.
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    /// Error when interacting with storage. A check that failed here was
    /// never evaluated; the caller must treat the operation as denied.
    #[error("Storage error: {0}")]
    StorageError(String),
    /// Invalid input (email format, reset scope, password shape).
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<warden_core::Error> for WardenError {
    fn from(err: warden_core::Error) -> Self {
        match err {
            warden_core::Error::Storage(e) => WardenError::StorageError(e.to_string()),
            warden_core::Error::Validation(e) => WardenError::ValidationError(e.to_string()),
        }
    }
}

/// The main coordinator that wires services onto a repository provider.
///
/// `Warden` is the single object applications hold. It owns the decision
/// façade (suspension gate → attempt window → escalation ladder) and the
/// account management service, both running against the same provider.
///
/// # Example
///
/// ```rust,no_run
/// use warden::{SecurityPolicy, Warden};
/// use warden_storage_sqlite::SqliteRepositoryProvider;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = sqlx::SqlitePool::connect("sqlite::memory:").await?;
/// let repositories = Arc::new(SqliteRepositoryProvider::new(pool));
///
/// let warden = Warden::new(repositories).with_policy(SecurityPolicy::default());
/// # Ok(())
/// # }
/// ```
pub struct Warden<R: RepositoryProvider> {
    repositories: Arc<R>,
    accounts: Arc<AccountService<AccountRepositoryAdapter<R>>>,
    decisions: Arc<SecurityDecisionService<AccountRepositoryAdapter<R>, SecurityRepositoryAdapter<R>>>,
}

impl<R: RepositoryProvider> Warden<R> {
    /// Create a new Warden instance with the default [`SecurityPolicy`].
    pub fn new(repositories: Arc<R>) -> Self {
        Self::with_repositories_and_policy(repositories, SecurityPolicy::default())
    }

    /// Replace the security policy (attempt ceilings, window length,
    /// escalation threshold, suspension period).
    pub fn with_policy(self, policy: SecurityPolicy) -> Self {
        Self::with_repositories_and_policy(self.repositories, policy)
    }

    fn with_repositories_and_policy(repositories: Arc<R>, policy: SecurityPolicy) -> Self {
        let account_repo = Arc::new(AccountRepositoryAdapter::new(repositories.clone()));
        let security_repo = Arc::new(SecurityRepositoryAdapter::new(repositories.clone()));

        let accounts = Arc::new(AccountService::new(account_repo.clone()));
        let decisions = Arc::new(SecurityDecisionService::new(
            account_repo,
            security_repo,
            policy,
        ));

        Self {
            repositories,
            accounts,
            decisions,
        }
    }

    /// The active security policy.
    pub fn policy(&self) -> &SecurityPolicy {
        self.decisions.policy()
    }

    /// Run migrations for all repositories
    pub async fn migrate(&self) -> Result<(), WardenError> {
        self.repositories
            .migrate()
            .await
            .map_err(|e| WardenError::StorageError(e.to_string()))
    }

    /// Health check for all repositories
    pub async fn health_check(&self) -> Result<(), WardenError> {
        self.repositories
            .health_check()
            .await
            .map_err(|e| WardenError::StorageError(e.to_string()))
    }

    // ------------------------------------------------------------------
    // Account management
    // ------------------------------------------------------------------

    /// Create an account (with its zeroed security profile).
    pub async fn create_account(
        &self,
        email: &str,
        name: Option<String>,
    ) -> Result<Account, WardenError> {
        Ok(self.accounts.create_account(email, name).await?)
    }

    /// Get an account by ID, if it exists.
    pub async fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>, WardenError> {
        Ok(self.accounts.get_account(account_id).await?)
    }

    /// Get an account by email, if it exists.
    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, WardenError> {
        Ok(self.accounts.get_account_by_email(email).await?)
    }

    /// Mark an account's email as verified.
    pub async fn mark_email_verified(&self, account_id: &AccountId) -> Result<(), WardenError> {
        Ok(self.accounts.verify_email(account_id).await?)
    }

    /// Delete an account and its security profile.
    pub async fn delete_account(&self, account_id: &AccountId) -> Result<(), WardenError> {
        Ok(self.accounts.delete_account(account_id).await?)
    }

    // ------------------------------------------------------------------
    // Security decisions
    // ------------------------------------------------------------------

    /// Decide whether a resend-verification email may go out for `email`.
    ///
    /// Consumes one verification attempt when allowed. A denial carries the
    /// reason and timing metadata; handlers must short-circuit before any
    /// side effect and must map an `AccountNotFound` denial to the same
    /// response as a successful dispatch.
    pub async fn check_verification_email(&self, email: &str) -> Result<Decision, WardenError> {
        Ok(self.decisions.check_verification_email(email).await?)
    }

    /// Decide whether a password-reset email may go out for `email`.
    ///
    /// Same contract as [`check_verification_email`](Self::check_verification_email),
    /// against the independent forgot-password window.
    pub async fn check_forgot_password(&self, email: &str) -> Result<Decision, WardenError> {
        Ok(self.decisions.check_forgot_password(email).await?)
    }

    /// Suspension-only gate for the login path; consumes no counted window.
    pub async fn check_temporary_suspension(&self, email: &str) -> Result<Decision, WardenError> {
        Ok(self.decisions.check_temporary_suspension(email).await?)
    }

    /// Clear all counters and any suspension after a successful login.
    pub async fn record_login_success(&self, account_id: &AccountId) -> Result<(), WardenError> {
        Ok(self.decisions.record_login_success(account_id).await?)
    }

    /// Administrative reset of the given scope. Idempotent.
    pub async fn reset_attempts(
        &self,
        account_id: &AccountId,
        scope: ResetScope,
    ) -> Result<(), WardenError> {
        Ok(self.decisions.reset_attempts(account_id, scope).await?)
    }

    /// Admin-only projection of an account's security state, or `None` when
    /// no account matches the email.
    pub async fn security_status(
        &self,
        email: &str,
    ) -> Result<Option<SecurityStatus>, WardenError> {
        Ok(self.decisions.security_status(email).await?)
    }
}
