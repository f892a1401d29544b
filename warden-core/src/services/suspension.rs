//! Temporary suspension state
//!
//! Single source of truth for whether sensitive operations are currently
//! blocked for an account. Runs before any attempt-window logic: a suspended
//! account is denied unconditionally regardless of remaining quota.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    Error,
    account::AccountId,
    error::StorageError,
    policy::{SecurityPolicy, SuspensionStatus},
    repositories::SecurityRepository,
};

pub struct SuspensionService<S: SecurityRepository> {
    repository: Arc<S>,
    policy: SecurityPolicy,
}

impl<S: SecurityRepository> SuspensionService<S> {
    pub fn new(repository: Arc<S>, policy: SecurityPolicy) -> Self {
        Self { repository, policy }
    }

    /// Report the suspension state for an account at `now`.
    ///
    /// An expired lock is cleared lazily on this read path: the lock fields
    /// are nulled, the suspicious counter zeroed, and the account status
    /// restored, all as one guarded transition in the repository.
    pub async fn check(
        &self,
        account_id: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<SuspensionStatus, Error> {
        let profile = self
            .repository
            .load(account_id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))?;

        match profile.suspended_until {
            Some(until) if until > now => Ok(SuspensionStatus::Active {
                until,
                reason: profile.suspension_reason,
            }),
            Some(_) => {
                self.repository
                    .clear_expired_suspension(account_id, now)
                    .await?;
                Ok(SuspensionStatus::Clear)
            }
            None => Ok(SuspensionStatus::Clear),
        }
    }

    /// Place a temporary lock lasting the policy's suspension period.
    ///
    /// # Returns
    ///
    /// When the lock expires.
    pub async fn suspend(
        &self,
        account_id: &AccountId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, Error> {
        let until = now + self.policy.suspension_period;
        self.repository
            .apply_suspension(account_id, until, reason)
            .await?;
        Ok(until)
    }
}
