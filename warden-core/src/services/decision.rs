//! Security decision façade
//!
//! The single entry point route handlers consult before doing anything
//! observable for a sensitive operation. All enumeration-safety logic is
//! centralized here: a request against an unknown email produces a denial
//! that callers must map to the same externally visible outcome as a
//! successful dispatch, and handlers never branch on account existence
//! themselves.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    Error,
    account::AccountId,
    policy::{
        Decision, Escalation, OperationClass, ResetScope, SecurityPolicy, SecurityStatus,
        SuspensionStatus, WindowDecision, escalation,
    },
    repositories::{AccountRepository, SecurityRepository},
    services::{AttemptWindowService, SuspensionService},
};

/// Reason string recorded when the escalation ladder creates a suspension.
pub const SUSPICIOUS_ACTIVITY_REASON: &str = "Suspicious activity detected";

/// Façade coordinating the suspension gate, the attempt windows, and the
/// escalation ladder into one decision per request.
///
/// # Ordering
///
/// Checks run in a fixed order: account lookup (enumeration guard) →
/// suspension gate → attempt window → escalation on denial. A suspended
/// account is denied before any window is consulted or consumed.
///
/// # Failure semantics
///
/// Store errors propagate as [`Error`]; a check that cannot be evaluated is
/// never an allow.
pub struct SecurityDecisionService<A: AccountRepository, S: SecurityRepository> {
    accounts: Arc<A>,
    security: Arc<S>,
    windows: AttemptWindowService<S>,
    suspensions: SuspensionService<S>,
    policy: SecurityPolicy,
}

impl<A: AccountRepository, S: SecurityRepository> SecurityDecisionService<A, S> {
    pub fn new(accounts: Arc<A>, security: Arc<S>, policy: SecurityPolicy) -> Self {
        let windows = AttemptWindowService::new(security.clone(), policy.clone());
        let suspensions = SuspensionService::new(security.clone(), policy.clone());
        Self {
            accounts,
            security,
            windows,
            suspensions,
            policy,
        }
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// Decide whether a resend-verification email may go out for `email`.
    pub async fn check_verification_email(&self, email: &str) -> Result<Decision, Error> {
        self.check_operation(email, OperationClass::Verification)
            .await
    }

    /// Decide whether a password-reset email may go out for `email`.
    pub async fn check_forgot_password(&self, email: &str) -> Result<Decision, Error> {
        self.check_operation(email, OperationClass::ForgotPassword)
            .await
    }

    /// Suspension-only gate for the login path.
    ///
    /// Login has its own credential-failure handling and does not consume a
    /// counted window. An unknown email reports "not suspended" so the
    /// handler's uniform credential failure is the only signal the caller
    /// sees.
    pub async fn check_temporary_suspension(&self, email: &str) -> Result<Decision, Error> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            return Ok(Decision::allowed_uncounted(None));
        };

        if !self.policy.enabled {
            return Ok(Decision::allowed_uncounted(Some(account)));
        }

        let suspension = self.suspensions.check(&account.id, Utc::now()).await?;
        match suspension {
            SuspensionStatus::Active { until, reason } => {
                Ok(Decision::suspended(account, until, reason))
            }
            SuspensionStatus::Clear => Ok(Decision::allowed_uncounted(Some(account))),
        }
    }

    /// Clear all counters and any suspension after a successful login.
    ///
    /// A correct credential proves the account owner is in control; prior
    /// denials were plausibly legitimate retries.
    pub async fn record_login_success(&self, account_id: &AccountId) -> Result<(), Error> {
        self.security
            .reset(account_id, ResetScope::All, Utc::now())
            .await
    }

    /// Administrative reset. Idempotent; scope is validated by the caller
    /// (parsing a scope string fails before any store access).
    pub async fn reset_attempts(
        &self,
        account_id: &AccountId,
        scope: ResetScope,
    ) -> Result<(), Error> {
        self.security.reset(account_id, scope, Utc::now()).await
    }

    /// Read-only projection of an account's security state for the admin
    /// surface. Returns `Ok(None)` when no account matches: this path is
    /// admin-only, so a distinct not-found does not open an enumeration
    /// channel.
    pub async fn security_status(&self, email: &str) -> Result<Option<SecurityStatus>, Error> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            return Ok(None);
        };
        let Some(profile) = self.security.load(&account.id).await? else {
            return Ok(None);
        };
        Ok(Some(SecurityStatus::project(
            &account,
            &profile,
            &self.policy,
        )))
    }

    async fn check_operation(&self, email: &str, op: OperationClass) -> Result<Decision, Error> {
        let now = Utc::now();

        // Enumeration guard: an unknown email is a denial here, but callers
        // map it to the same response as a successful dispatch. No account is
        // created and nothing is recorded.
        let Some(account) = self.accounts.find_by_email(email).await? else {
            tracing::debug!(operation = %op, "security check against unknown email");
            return Ok(Decision::account_not_found());
        };

        if !self.policy.enabled {
            return Ok(Decision::allowed_uncounted(Some(account)));
        }

        let suspension = self.suspensions.check(&account.id, now).await?;
        if let SuspensionStatus::Active { until, reason } = suspension {
            return Ok(Decision::suspended(account, until, reason));
        }

        let window = self.windows.check_and_increment(&account.id, op, now).await?;
        match window {
            WindowDecision::Allowed { attempts_remaining } => {
                Ok(Decision::allowed(account, attempts_remaining))
            }
            WindowDecision::LimitExceeded { resets_at } => {
                // Hammering an already-exhausted window is the probing signal
                // the escalation ladder watches for.
                let count = self.security.record_suspicious(&account.id).await?;
                match escalation(count, self.policy.suspicious_threshold) {
                    Escalation::Suspend(count) => {
                        let until = self
                            .suspensions
                            .suspend(&account.id, SUSPICIOUS_ACTIVITY_REASON, now)
                            .await?;
                        tracing::warn!(
                            account_id = %account.id,
                            suspicious_count = count,
                            until = %until,
                            "account temporarily suspended after repeated denials"
                        );
                        Ok(Decision::suspended(
                            account,
                            until,
                            Some(SUSPICIOUS_ACTIVITY_REASON.to_string()),
                        ))
                    }
                    Escalation::Noted(count) => {
                        tracing::debug!(
                            account_id = %account.id,
                            operation = %op,
                            suspicious_count = count,
                            "attempt denied, daily limit exceeded"
                        );
                        Ok(Decision::daily_limit_exceeded(account, resets_at))
                    }
                }
            }
        }
    }
}
