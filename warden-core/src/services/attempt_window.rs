//! Rolling attempt windows
//!
//! One counter per (account, operation class) with a lazy 24-hour reset. The
//! primitive every higher-level check is built on.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    Error,
    account::AccountId,
    error::StorageError,
    policy::{OperationClass, SecurityPolicy, WindowDecision, window_resets_at},
    repositories::SecurityRepository,
};

/// Service maintaining one rolling attempt window per (account, operation
/// class).
///
/// # Thread Safety
///
/// The service itself is stateless; all shared state lives behind the
/// repository, whose reset-if-stale and conditional-increment primitives are
/// atomic per account. Two concurrent checks can therefore never both slip
/// past the ceiling or double-reset a stale window.
pub struct AttemptWindowService<S: SecurityRepository> {
    repository: Arc<S>,
    policy: SecurityPolicy,
}

impl<S: SecurityRepository> AttemptWindowService<S> {
    pub fn new(repository: Arc<S>, policy: SecurityPolicy) -> Self {
        Self { repository, policy }
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// Evaluate one request against the window for `op`, consuming an attempt
    /// when admitted.
    ///
    /// A window that started a full `attempt_window` or more ago is zeroed and
    /// restarted at `now` before evaluation; counts never carry across two
    /// windows. At the ceiling the counter stays untouched and the decision
    /// reports when the window resets naturally.
    pub async fn check_and_increment(
        &self,
        account_id: &AccountId,
        op: OperationClass,
        now: DateTime<Utc>,
    ) -> Result<WindowDecision, Error> {
        if !self.policy.enabled {
            return Ok(WindowDecision::Allowed {
                attempts_remaining: self.policy.max_daily_attempts,
            });
        }

        self.repository
            .reset_stale_window(account_id, op, now, self.policy.attempt_window)
            .await?;

        match self
            .repository
            .increment_attempt(account_id, op, self.policy.max_daily_attempts)
            .await?
        {
            Some(count) => Ok(WindowDecision::Allowed {
                attempts_remaining: self.policy.max_daily_attempts.saturating_sub(count),
            }),
            None => {
                let profile = self
                    .repository
                    .load(account_id)
                    .await?
                    .ok_or(Error::Storage(StorageError::NotFound))?;
                let (_, reset_at) = profile.window(op);
                Ok(WindowDecision::LimitExceeded {
                    resets_at: window_resets_at(reset_at, self.policy.attempt_window),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{MockSecurityRepository, zeroed_profile};
    use chrono::Duration;

    fn service_with_profile() -> (Arc<MockSecurityRepository>, AccountId) {
        let repo = Arc::new(MockSecurityRepository::default());
        let account_id = AccountId::new_random();
        repo.insert(zeroed_profile(&account_id, Utc::now()));
        (repo, account_id)
    }

    #[tokio::test]
    async fn test_attempts_decrease_to_zero_then_deny() {
        let (repo, account_id) = service_with_profile();
        let service = AttemptWindowService::new(repo, SecurityPolicy::default());
        let now = Utc::now();

        for expected_remaining in [4, 3, 2, 1, 0] {
            let decision = service
                .check_and_increment(&account_id, OperationClass::Verification, now)
                .await
                .unwrap();
            assert_eq!(
                decision,
                WindowDecision::Allowed {
                    attempts_remaining: expected_remaining
                }
            );
        }

        let decision = service
            .check_and_increment(&account_id, OperationClass::Verification, now)
            .await
            .unwrap();
        assert!(matches!(decision, WindowDecision::LimitExceeded { .. }));
    }

    #[tokio::test]
    async fn test_denial_reports_window_reset_time() {
        let (repo, account_id) = service_with_profile();
        let now = Utc::now();
        let window_started = now - Duration::hours(2);

        let mut profile = repo.get(&account_id).unwrap();
        profile.verification_attempts = 5;
        profile.verification_reset_at = window_started;
        repo.insert(profile);

        let service = AttemptWindowService::new(repo, SecurityPolicy::default());
        let decision = service
            .check_and_increment(&account_id, OperationClass::Verification, now)
            .await
            .unwrap();

        assert_eq!(
            decision,
            WindowDecision::LimitExceeded {
                resets_at: window_started + Duration::hours(24)
            }
        );
    }

    #[tokio::test]
    async fn test_stale_window_resets_before_evaluation() {
        let (repo, account_id) = service_with_profile();
        let now = Utc::now();

        let mut profile = repo.get(&account_id).unwrap();
        profile.verification_attempts = 5;
        profile.verification_reset_at = now - Duration::hours(25);
        repo.insert(profile);

        let service = AttemptWindowService::new(repo.clone(), SecurityPolicy::default());
        let decision = service
            .check_and_increment(&account_id, OperationClass::Verification, now)
            .await
            .unwrap();

        // Exhausted 25 hours ago: immediately allowed again with a fresh window.
        assert_eq!(
            decision,
            WindowDecision::Allowed {
                attempts_remaining: 4
            }
        );
        let profile = repo.get(&account_id).unwrap();
        assert_eq!(profile.verification_attempts, 1);
        assert_eq!(profile.verification_reset_at, now);
    }

    #[tokio::test]
    async fn test_operation_classes_are_independent() {
        let (repo, account_id) = service_with_profile();
        let service = AttemptWindowService::new(repo, SecurityPolicy::default());
        let now = Utc::now();

        for _ in 0..5 {
            service
                .check_and_increment(&account_id, OperationClass::Verification, now)
                .await
                .unwrap();
        }

        // The forgot-password window still has its full quota.
        let decision = service
            .check_and_increment(&account_id, OperationClass::ForgotPassword, now)
            .await
            .unwrap();
        assert_eq!(
            decision,
            WindowDecision::Allowed {
                attempts_remaining: 4
            }
        );
    }

    #[tokio::test]
    async fn test_disabled_policy_allows_without_recording() {
        let (repo, account_id) = service_with_profile();
        let service = AttemptWindowService::new(repo.clone(), SecurityPolicy::disabled());

        let decision = service
            .check_and_increment(&account_id, OperationClass::Verification, Utc::now())
            .await
            .unwrap();
        assert_eq!(
            decision,
            WindowDecision::Allowed {
                attempts_remaining: 5
            }
        );
        assert_eq!(repo.get(&account_id).unwrap().verification_attempts, 0);
    }
}
