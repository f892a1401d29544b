use crate::{
    Error,
    account::{Account, AccountId, NewAccount, SecurityProfile},
    policy::{OperationClass, ResetScope},
    repositories::{AccountRepository, RepositoryProvider, SecurityRepository},
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Adapter that wraps a RepositoryProvider and implements [`AccountRepository`]
pub struct AccountRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> AccountRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> AccountRepository for AccountRepositoryAdapter<R> {
    async fn create(&self, account: NewAccount) -> Result<Account, Error> {
        self.provider.account().create(account).await
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        self.provider.account().find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        self.provider.account().find_by_email(email).await
    }

    async fn update(&self, account: &Account) -> Result<Account, Error> {
        self.provider.account().update(account).await
    }

    async fn delete(&self, id: &AccountId) -> Result<(), Error> {
        self.provider.account().delete(id).await
    }

    async fn mark_email_verified(&self, id: &AccountId) -> Result<(), Error> {
        self.provider.account().mark_email_verified(id).await
    }
}

/// Adapter that wraps a RepositoryProvider and implements [`SecurityRepository`]
pub struct SecurityRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> SecurityRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> SecurityRepository for SecurityRepositoryAdapter<R> {
    async fn load(&self, account_id: &AccountId) -> Result<Option<SecurityProfile>, Error> {
        self.provider.security().load(account_id).await
    }

    async fn reset_stale_window(
        &self,
        account_id: &AccountId,
        op: OperationClass,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<bool, Error> {
        self.provider
            .security()
            .reset_stale_window(account_id, op, now, window)
            .await
    }

    async fn increment_attempt(
        &self,
        account_id: &AccountId,
        op: OperationClass,
        max: u32,
    ) -> Result<Option<u32>, Error> {
        self.provider
            .security()
            .increment_attempt(account_id, op, max)
            .await
    }

    async fn record_suspicious(&self, account_id: &AccountId) -> Result<u32, Error> {
        self.provider.security().record_suspicious(account_id).await
    }

    async fn apply_suspension(
        &self,
        account_id: &AccountId,
        until: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), Error> {
        self.provider
            .security()
            .apply_suspension(account_id, until, reason)
            .await
    }

    async fn clear_expired_suspension(
        &self,
        account_id: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<bool, Error> {
        self.provider
            .security()
            .clear_expired_suspension(account_id, now)
            .await
    }

    async fn reset(
        &self,
        account_id: &AccountId,
        scope: ResetScope,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.provider.security().reset(account_id, scope, now).await
    }
}
