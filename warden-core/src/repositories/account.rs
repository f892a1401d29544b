use crate::{
    Error,
    account::{Account, AccountId, NewAccount},
};
use async_trait::async_trait;

/// Repository for account data access
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Create a new account together with its (zeroed) security profile
    async fn create(&self, account: NewAccount) -> Result<Account, Error>;

    /// Find an account by ID
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error>;

    /// Find an account by email
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error>;

    /// Update an existing account
    async fn update(&self, account: &Account) -> Result<Account, Error>;

    /// Delete an account and its security profile
    async fn delete(&self, id: &AccountId) -> Result<(), Error>;

    /// Mark an account's email as verified
    async fn mark_email_verified(&self, id: &AccountId) -> Result<(), Error>;
}
