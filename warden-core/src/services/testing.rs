//! In-memory mock repositories shared by the service test suites.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::{
    Error,
    account::{Account, AccountId, AccountStatus, NewAccount, SecurityProfile},
    error::StorageError,
    policy::{OperationClass, ResetScope},
    repositories::{AccountRepository, SecurityRepository},
};

#[derive(Default)]
pub(crate) struct MockAccountRepository {
    accounts: Mutex<HashMap<AccountId, Account>>,
}

impl MockAccountRepository {
    pub(crate) fn insert(&self, account: Account) {
        self.accounts
            .lock()
            .unwrap()
            .insert(account.id.clone(), account);
    }

    pub(crate) fn set_status(&self, id: &AccountId, status: AccountStatus) {
        if let Some(account) = self.accounts.lock().unwrap().get_mut(id) {
            account.status = status;
        }
    }
}

pub(crate) fn test_account(email: &str) -> Account {
    Account::builder()
        .id(AccountId::new_random())
        .email(email.to_string())
        .build()
        .unwrap()
}

pub(crate) fn zeroed_profile(account_id: &AccountId, now: DateTime<Utc>) -> SecurityProfile {
    SecurityProfile {
        account_id: account_id.clone(),
        verification_attempts: 0,
        verification_reset_at: now,
        forgot_password_attempts: 0,
        forgot_password_reset_at: now,
        suspicious_count: 0,
        suspended_until: None,
        suspension_reason: None,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl AccountRepository for MockAccountRepository {
    async fn create(&self, new_account: NewAccount) -> Result<Account, Error> {
        let account = Account::builder()
            .id(new_account.id)
            .email(new_account.email)
            .name(new_account.name)
            .email_verified_at(new_account.email_verified_at)
            .build()?;
        self.insert(account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        Ok(self.accounts.lock().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn update(&self, account: &Account) -> Result<Account, Error> {
        self.insert(account.clone());
        Ok(account.clone())
    }

    async fn delete(&self, id: &AccountId) -> Result<(), Error> {
        self.accounts.lock().unwrap().remove(id);
        Ok(())
    }

    async fn mark_email_verified(&self, id: &AccountId) -> Result<(), Error> {
        if let Some(account) = self.accounts.lock().unwrap().get_mut(id) {
            account.email_verified_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MockSecurityRepository {
    profiles: Mutex<HashMap<AccountId, SecurityProfile>>,
}

impl MockSecurityRepository {
    pub(crate) fn insert(&self, profile: SecurityProfile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.account_id.clone(), profile);
    }

    pub(crate) fn get(&self, account_id: &AccountId) -> Option<SecurityProfile> {
        self.profiles.lock().unwrap().get(account_id).cloned()
    }
}

#[async_trait]
impl SecurityRepository for MockSecurityRepository {
    async fn load(&self, account_id: &AccountId) -> Result<Option<SecurityProfile>, Error> {
        Ok(self.get(account_id))
    }

    async fn reset_stale_window(
        &self,
        account_id: &AccountId,
        op: OperationClass,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<bool, Error> {
        let mut profiles = self.profiles.lock().unwrap();
        let Some(profile) = profiles.get_mut(account_id) else {
            return Ok(false);
        };
        let (_, reset_at) = profile.window(op);
        if now < reset_at + window {
            return Ok(false);
        }
        match op {
            OperationClass::Verification => {
                profile.verification_attempts = 0;
                profile.verification_reset_at = now;
            }
            OperationClass::ForgotPassword => {
                profile.forgot_password_attempts = 0;
                profile.forgot_password_reset_at = now;
            }
        }
        Ok(true)
    }

    async fn increment_attempt(
        &self,
        account_id: &AccountId,
        op: OperationClass,
        max: u32,
    ) -> Result<Option<u32>, Error> {
        let mut profiles = self.profiles.lock().unwrap();
        let Some(profile) = profiles.get_mut(account_id) else {
            return Err(Error::Storage(StorageError::NotFound));
        };
        let counter = match op {
            OperationClass::Verification => &mut profile.verification_attempts,
            OperationClass::ForgotPassword => &mut profile.forgot_password_attempts,
        };
        if *counter >= max {
            return Ok(None);
        }
        *counter += 1;
        Ok(Some(*counter))
    }

    async fn record_suspicious(&self, account_id: &AccountId) -> Result<u32, Error> {
        let mut profiles = self.profiles.lock().unwrap();
        let Some(profile) = profiles.get_mut(account_id) else {
            return Err(Error::Storage(StorageError::NotFound));
        };
        profile.suspicious_count += 1;
        Ok(profile.suspicious_count)
    }

    async fn apply_suspension(
        &self,
        account_id: &AccountId,
        until: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), Error> {
        let mut profiles = self.profiles.lock().unwrap();
        let Some(profile) = profiles.get_mut(account_id) else {
            return Err(Error::Storage(StorageError::NotFound));
        };
        profile.suspended_until = Some(until);
        profile.suspension_reason = Some(reason.to_string());
        Ok(())
    }

    async fn clear_expired_suspension(
        &self,
        account_id: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let mut profiles = self.profiles.lock().unwrap();
        let Some(profile) = profiles.get_mut(account_id) else {
            return Ok(false);
        };
        match profile.suspended_until {
            Some(until) if until <= now => {
                profile.suspended_until = None;
                profile.suspension_reason = None;
                profile.suspicious_count = 0;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reset(
        &self,
        account_id: &AccountId,
        scope: ResetScope,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let mut profiles = self.profiles.lock().unwrap();
        let Some(profile) = profiles.get_mut(account_id) else {
            return Ok(());
        };
        if matches!(scope, ResetScope::All | ResetScope::Verification) {
            profile.verification_attempts = 0;
            profile.verification_reset_at = now;
        }
        if matches!(scope, ResetScope::All | ResetScope::Password) {
            profile.forgot_password_attempts = 0;
            profile.forgot_password_reset_at = now;
        }
        if matches!(scope, ResetScope::All | ResetScope::Suspicious) {
            profile.suspicious_count = 0;
            profile.suspended_until = None;
            profile.suspension_reason = None;
        }
        Ok(())
    }
}
