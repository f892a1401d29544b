use crate::{
    Error,
    account::{Account, AccountId, NewAccount},
    repositories::AccountRepository,
    validation::validate_email,
};
use std::sync::Arc;

/// Service for account management operations
pub struct AccountService<R: AccountRepository> {
    repository: Arc<R>,
}

impl<R: AccountRepository> AccountService<R> {
    /// Create a new AccountService with the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create a new account
    pub async fn create_account(
        &self,
        email: &str,
        name: Option<String>,
    ) -> Result<Account, Error> {
        // Validate email format
        validate_email(email)?;

        let mut builder = NewAccount::builder()
            .id(AccountId::new_random())
            .email(email.to_string());

        if let Some(name) = name {
            builder = builder.name(name);
        }

        let new_account = builder.build()?;

        self.repository.create(new_account).await
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>, Error> {
        self.repository.find_by_id(account_id).await
    }

    /// Get an account by email
    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        self.repository.find_by_email(email).await
    }

    /// Update an account
    pub async fn update_account(&self, account: &Account) -> Result<Account, Error> {
        self.repository.update(account).await
    }

    /// Delete an account
    pub async fn delete_account(&self, account_id: &AccountId) -> Result<(), Error> {
        self.repository.delete(account_id).await
    }

    /// Mark an account's email as verified
    pub async fn verify_email(&self, account_id: &AccountId) -> Result<(), Error> {
        self.repository.mark_email_verified(account_id).await
    }
}
