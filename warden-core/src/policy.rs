//! Security policy, decisions, and the escalation transition table
//!
//! Everything time- and threshold-related lives here so that every transition
//! the subsystem can make (window reset, ceiling denial, escalation,
//! suspension, administrative reset) is defined in one place and testable in
//! isolation. Services apply these transitions through atomic repository
//! operations; they never re-derive the arithmetic.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{
    account::{Account, AccountId, AccountStatus, SecurityProfile},
    error::ValidationError,
};

/// The operation classes subject to rolling attempt windows.
///
/// Login is deliberately absent: it is gated by suspension only and does not
/// consume a counted window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationClass {
    Verification,
    ForgotPassword,
}

impl OperationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationClass::Verification => "verification",
            OperationClass::ForgotPassword => "forgot_password",
        }
    }
}

impl std::fmt::Display for OperationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for attempt-window and escalation behavior.
///
/// # Example
///
/// ```rust
/// use warden_core::policy::SecurityPolicy;
///
/// let policy = SecurityPolicy::default();
/// assert_eq!(policy.max_daily_attempts, 5);
/// ```
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    /// Whether checks are enforced at all. When disabled, every check is
    /// allowed with a full quota and nothing is recorded.
    pub enabled: bool,
    /// Per-operation-class attempt ceiling within one window.
    pub max_daily_attempts: u32,
    /// Length of the rolling attempt window.
    pub attempt_window: Duration,
    /// Suspicious-denial count at which a temporary suspension is created.
    pub suspicious_threshold: u32,
    /// How long a temporary suspension lasts.
    pub suspension_period: Duration,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_daily_attempts: 5,
            attempt_window: Duration::hours(24),
            suspicious_threshold: 3,
            suspension_period: Duration::hours(1),
        }
    }
}

impl SecurityPolicy {
    /// A policy that allows everything and records nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Why a check was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    DailyLimitExceeded,
    Suspended,
    AccountNotFound,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::DailyLimitExceeded => "daily_limit_exceeded",
            DenyReason::Suspended => "suspended",
            DenyReason::AccountNotFound => "account_not_found",
        }
    }
}

/// The structured outcome of a security check, handed to route handlers.
///
/// Handlers translate decisions to HTTP responses but must not re-derive
/// account-existence logic from them: an `AccountNotFound` denial maps to the
/// same externally observable outcome as a successful dispatch.
#[derive(Debug, Clone)]
pub struct Decision {
    pub allowed: bool,
    pub reason: Option<DenyReason>,
    pub attempts_remaining: Option<u32>,
    pub resets_at: Option<DateTime<Utc>>,
    pub suspended_until: Option<DateTime<Utc>>,
    pub suspension_reason: Option<String>,
    /// The matched account, when one exists. Never serialized; present so an
    /// allowed handler can proceed without a second lookup.
    pub account: Option<Account>,
}

impl Decision {
    pub fn allowed(account: Account, attempts_remaining: u32) -> Self {
        Self {
            allowed: true,
            reason: None,
            attempts_remaining: Some(attempts_remaining),
            resets_at: None,
            suspended_until: None,
            suspension_reason: None,
            account: Some(account),
        }
    }

    /// An allow that does not consume a counted window (login gate, disabled
    /// policy).
    pub fn allowed_uncounted(account: Option<Account>) -> Self {
        Self {
            allowed: true,
            reason: None,
            attempts_remaining: None,
            resets_at: None,
            suspended_until: None,
            suspension_reason: None,
            account,
        }
    }

    pub fn daily_limit_exceeded(account: Account, resets_at: DateTime<Utc>) -> Self {
        Self {
            allowed: false,
            reason: Some(DenyReason::DailyLimitExceeded),
            attempts_remaining: Some(0),
            resets_at: Some(resets_at),
            suspended_until: None,
            suspension_reason: None,
            account: Some(account),
        }
    }

    pub fn suspended(
        account: Account,
        until: DateTime<Utc>,
        reason: Option<String>,
    ) -> Self {
        Self {
            allowed: false,
            reason: Some(DenyReason::Suspended),
            attempts_remaining: None,
            resets_at: None,
            suspended_until: Some(until),
            suspension_reason: reason,
            account: Some(account),
        }
    }

    pub fn account_not_found() -> Self {
        Self {
            allowed: false,
            reason: Some(DenyReason::AccountNotFound),
            attempts_remaining: None,
            resets_at: None,
            suspended_until: None,
            suspension_reason: None,
            account: None,
        }
    }

    /// Seconds until the denial lifts, for a `Retry-After` header.
    pub fn retry_after_seconds(&self) -> Option<i64> {
        let lifts_at = self.suspended_until.or(self.resets_at)?;
        let seconds = (lifts_at - Utc::now()).num_seconds();
        Some(seconds.max(0))
    }
}

/// Outcome of one attempt-window evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowDecision {
    Allowed { attempts_remaining: u32 },
    LimitExceeded { resets_at: DateTime<Utc> },
}

/// Whether an account is currently under a temporary lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuspensionStatus {
    Clear,
    Active {
        until: DateTime<Utc>,
        reason: Option<String>,
    },
}

impl SuspensionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SuspensionStatus::Active { .. })
    }
}

/// Scope of an administrative reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetScope {
    /// Both windows, the suspicious counter, and any suspension.
    All,
    /// The verification attempt window only.
    Verification,
    /// The forgot-password attempt window only.
    Password,
    /// The suspicious counter and any suspension.
    Suspicious,
}

impl ResetScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetScope::All => "all",
            ResetScope::Verification => "verification",
            ResetScope::Password => "password",
            ResetScope::Suspicious => "suspicious",
        }
    }
}

impl FromStr for ResetScope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ResetScope::All),
            "verification" => Ok(ResetScope::Verification),
            "password" => Ok(ResetScope::Password),
            "suspicious" => Ok(ResetScope::Suspicious),
            other => Err(ValidationError::InvalidScope(other.to_string())),
        }
    }
}

/// Read-only projection of an account's security state for the admin surface.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityStatus {
    pub account_id: AccountId,
    pub email: String,
    pub status: AccountStatus,
    pub verification: WindowStatus,
    pub forgot_password: WindowStatus,
    pub suspicious_count: u32,
    pub suspended_until: Option<DateTime<Utc>>,
    pub suspension_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WindowStatus {
    pub attempts: u32,
    pub window_started_at: DateTime<Utc>,
    pub resets_at: DateTime<Utc>,
    pub attempts_remaining: u32,
}

impl SecurityStatus {
    pub fn project(account: &Account, profile: &SecurityProfile, policy: &SecurityPolicy) -> Self {
        let window = |op: OperationClass| {
            let (attempts, started_at) = profile.window(op);
            WindowStatus {
                attempts,
                window_started_at: started_at,
                resets_at: window_resets_at(started_at, policy.attempt_window),
                attempts_remaining: policy.max_daily_attempts.saturating_sub(attempts),
            }
        };

        Self {
            account_id: account.id.clone(),
            email: account.email.clone(),
            status: account.status,
            verification: window(OperationClass::Verification),
            forgot_password: window(OperationClass::ForgotPassword),
            suspicious_count: profile.suspicious_count,
            suspended_until: profile.suspended_until,
            suspension_reason: profile.suspension_reason.clone(),
        }
    }
}

/// Result of feeding one suspicious denial into the escalation ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Below the threshold; the denial stands on its own.
    Noted(u32),
    /// The threshold was reached; a temporary suspension must be created.
    Suspend(u32),
}

/// Evaluate the escalation ladder after the suspicious counter reached
/// `suspicious_count`.
pub fn escalation(suspicious_count: u32, threshold: u32) -> Escalation {
    if suspicious_count >= threshold {
        Escalation::Suspend(suspicious_count)
    } else {
        Escalation::Noted(suspicious_count)
    }
}

/// A window is stale once a full `window` has elapsed since it started;
/// the read path zeroes it before evaluating the next request.
pub fn window_is_stale(reset_at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now >= reset_at + window
}

/// When the window that started at `reset_at` expires naturally.
pub fn window_resets_at(reset_at: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    reset_at + window
}
