//! Outbound notification channel
//!
//! The subsystem never sends email itself: route handlers invoke this trait
//! only after an allowed decision. A send failure is reported to the caller
//! but does not roll back the attempt that was already spent.

use crate::{Error, account::Account};
use async_trait::async_trait;

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a new email-verification message to the account holder.
    async fn send_verification_email(&self, account: &Account) -> Result<(), Error>;

    /// Send a password-reset message to the account holder.
    async fn send_password_reset_email(&self, account: &Account) -> Result<(), Error>;
}

/// Mailer that logs instead of sending. For tests and local development.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_email(&self, account: &Account) -> Result<(), Error> {
        tracing::info!(account_id = %account.id, "verification email dispatched");
        Ok(())
    }

    async fn send_password_reset_email(&self, account: &Account) -> Result<(), Error> {
        tracing::info!(account_id = %account.id, "password reset email dispatched");
        Ok(())
    }
}
