//! Account types and per-account security state
//!
//! Accounts are the entities the security subsystem protects. Every account
//! carries a [`SecurityProfile`]: the rolling attempt windows, the shared
//! suspicious-activity counter, and any temporary suspension. The profile is
//! created in the same transaction as the account and deleted with it.

use crate::{
    Error,
    error::ValidationError,
    id::{generate_prefixed_id, validate_prefixed_id},
    policy::OperationClass,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A unique, stable identifier for a specific account.
///
/// This value should be treated as opaque even though it may look decodable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: &str) -> Self {
        AccountId(id.to_string())
    }

    pub fn new_random() -> Self {
        AccountId(generate_prefixed_id("acct"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this ID has the correct format for an account ID
    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "acct")
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse account usability flag.
///
/// `Suspended` is set together with a temporary lock on the security profile
/// and restored to `Active` when the lock clears; the two always move as one
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Suspended => "suspended",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            "suspended" => Ok(AccountStatus::Suspended),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Representation of an account in warden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    // The unique identifier for the account.
    pub id: AccountId,

    // The display name, if one was provided.
    pub name: Option<String>,

    // The email of the account holder.
    pub email: String,

    // Coarse usability flag, see AccountStatus.
    pub status: AccountStatus,

    // When the email was verified. None until verification completes.
    pub email_verified_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn builder() -> AccountBuilder {
        AccountBuilder::default()
    }

    /// Check if the account's email has been verified.
    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

#[derive(Default)]
pub struct AccountBuilder {
    id: Option<AccountId>,
    name: Option<String>,
    email: Option<String>,
    status: Option<AccountStatus>,
    email_verified_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl AccountBuilder {
    pub fn id(mut self, id: AccountId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    pub fn status(mut self, status: AccountStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn email_verified_at(mut self, email_verified_at: Option<DateTime<Utc>>) -> Self {
        self.email_verified_at = email_verified_at;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    pub fn build(self) -> Result<Account, Error> {
        let now = Utc::now();
        Ok(Account {
            id: self.id.unwrap_or_default(),
            name: self.name,
            email: self.email.ok_or(ValidationError::MissingField(
                "Email is required".to_string(),
            ))?,
            status: self.status.unwrap_or(AccountStatus::Active),
            email_verified_at: self.email_verified_at,
            created_at: self.created_at.unwrap_or(now),
            updated_at: self.updated_at.unwrap_or(now),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub id: AccountId,
    pub email: String,
    pub name: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
}

impl NewAccount {
    pub fn builder() -> NewAccountBuilder {
        NewAccountBuilder::default()
    }

    pub fn new(email: String) -> Self {
        NewAccountBuilder::default()
            .email(email)
            .build()
            .expect("Default builder should never fail")
    }

    pub fn with_id(id: AccountId, email: String) -> Self {
        NewAccountBuilder::default()
            .id(id)
            .email(email)
            .build()
            .expect("Default builder should never fail")
    }
}

#[derive(Default)]
pub struct NewAccountBuilder {
    id: Option<AccountId>,
    email: Option<String>,
    name: Option<String>,
    email_verified_at: Option<DateTime<Utc>>,
}

impl NewAccountBuilder {
    pub fn id(mut self, id: AccountId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    pub fn name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn email_verified_at(mut self, email_verified_at: Option<DateTime<Utc>>) -> Self {
        self.email_verified_at = email_verified_at;
        self
    }

    pub fn build(self) -> Result<NewAccount, Error> {
        Ok(NewAccount {
            id: self.id.unwrap_or_default(),
            email: self.email.ok_or(ValidationError::MissingField(
                "Email is required".to_string(),
            ))?,
            name: self.name,
            email_verified_at: self.email_verified_at,
        })
    }
}

/// Per-account security state: one row per account.
///
/// | Field | Meaning |
/// | ----- | ------- |
/// | `verification_attempts` | resend-verification requests in the current window |
/// | `verification_reset_at` | when that window started |
/// | `forgot_password_attempts` | password-reset requests in the current window |
/// | `forgot_password_reset_at` | when that window started |
/// | `suspicious_count` | shared escalation counter across operation classes |
/// | `suspended_until` | temporary lock expiry, if a lock is in place |
/// | `suspension_reason` | human-readable cause, set with `suspended_until` |
///
/// A window's counter is meaningful only until `reset_at + window`; the read
/// path lazily zeroes a stale window before evaluating a request, so counts
/// never accumulate across two windows.
#[derive(Debug, Clone)]
pub struct SecurityProfile {
    pub account_id: AccountId,
    pub verification_attempts: u32,
    pub verification_reset_at: DateTime<Utc>,
    pub forgot_password_attempts: u32,
    pub forgot_password_reset_at: DateTime<Utc>,
    pub suspicious_count: u32,
    pub suspended_until: Option<DateTime<Utc>>,
    pub suspension_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SecurityProfile {
    /// The (attempt count, window start) pair for one operation class.
    pub fn window(&self, op: OperationClass) -> (u32, DateTime<Utc>) {
        match op {
            OperationClass::Verification => {
                (self.verification_attempts, self.verification_reset_at)
            }
            OperationClass::ForgotPassword => {
                (self.forgot_password_attempts, self.forgot_password_reset_at)
            }
        }
    }

    /// Whether a temporary lock is in force at `now`.
    pub fn is_suspended_at(&self, now: DateTime<Utc>) -> bool {
        self.suspended_until.is_some_and(|until| until > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_account_id() {
        let account_id = AccountId::new("test");
        assert_eq!(account_id.as_str(), "test");

        let from_str = AccountId::from(account_id.as_str());
        assert_eq!(from_str, account_id);

        let random = AccountId::new_random();
        assert_ne!(random, account_id);
    }

    #[test]
    fn test_account_id_prefixed() {
        let account_id = AccountId::new_random();
        assert!(account_id.as_str().starts_with("acct_"));
        assert!(account_id.is_valid());

        let invalid = AccountId::new("invalid");
        assert!(!invalid.is_valid());
    }

    #[test]
    fn test_account_status_round_trip() {
        for status in [
            AccountStatus::Active,
            AccountStatus::Inactive,
            AccountStatus::Suspended,
        ] {
            assert_eq!(status.as_str().parse::<AccountStatus>().unwrap(), status);
        }
        assert!("locked".parse::<AccountStatus>().is_err());
    }

    #[test]
    fn test_account_builder_requires_email() {
        assert!(Account::builder().build().is_err());

        let account = Account::builder()
            .email("test@example.com".to_string())
            .build()
            .unwrap();
        assert_eq!(account.status, AccountStatus::Active);
        assert!(!account.is_email_verified());
    }

    #[test]
    fn test_profile_window_accessor() {
        let now = Utc::now();
        let profile = SecurityProfile {
            account_id: AccountId::new_random(),
            verification_attempts: 3,
            verification_reset_at: now - Duration::hours(1),
            forgot_password_attempts: 1,
            forgot_password_reset_at: now - Duration::hours(2),
            suspicious_count: 0,
            suspended_until: None,
            suspension_reason: None,
            created_at: now,
            updated_at: now,
        };

        let (count, reset_at) = profile.window(OperationClass::Verification);
        assert_eq!(count, 3);
        assert_eq!(reset_at, now - Duration::hours(1));

        let (count, _) = profile.window(OperationClass::ForgotPassword);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_profile_suspension_check() {
        let now = Utc::now();
        let mut profile = SecurityProfile {
            account_id: AccountId::new_random(),
            verification_attempts: 0,
            verification_reset_at: now,
            forgot_password_attempts: 0,
            forgot_password_reset_at: now,
            suspicious_count: 3,
            suspended_until: Some(now + Duration::hours(1)),
            suspension_reason: Some("Suspicious activity detected".to_string()),
            created_at: now,
            updated_at: now,
        };
        assert!(profile.is_suspended_at(now));

        profile.suspended_until = Some(now - Duration::seconds(1));
        assert!(!profile.is_suspended_at(now));

        profile.suspended_until = None;
        assert!(!profile.is_suspended_at(now));
    }
}
