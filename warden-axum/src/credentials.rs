//! Credential machinery boundary
//!
//! Password hashing, credential verification, and reset-token bookkeeping are
//! the host application's concern. The route handlers consult warden first
//! and only then call into this trait, so a denial short-circuits before any
//! credential work or token mutation happens.

use async_trait::async_trait;
use warden_core::{
    Error,
    account::{Account, AccountId},
};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Verify an email/password pair.
    ///
    /// Returns the matched account on success, `Ok(None)` on any credential
    /// failure. Implementations must not distinguish "unknown email" from
    /// "wrong password" in their return value or timing.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>, Error>;

    /// Resolve a password-reset token to its account without consuming it.
    ///
    /// Returns `Ok(None)` for unknown, expired, or already-used tokens.
    async fn resolve_reset_token(&self, token: &str) -> Result<Option<Account>, Error>;

    /// Consume the outstanding reset token(s) and set the new password.
    async fn apply_password_reset(
        &self,
        account_id: &AccountId,
        new_password: &str,
    ) -> Result<(), Error>;
}
