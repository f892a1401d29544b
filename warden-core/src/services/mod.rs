//! Service layer for business logic
//!
//! This module contains concrete service implementations that encapsulate
//! the account security decision logic.

pub mod account;
pub mod attempt_window;
pub mod decision;
pub mod mailer;
pub mod suspension;

#[cfg(test)]
pub(crate) mod testing;

pub use account::AccountService;
pub use attempt_window::AttemptWindowService;
pub use decision::{SUSPICIOUS_ACTIVITY_REASON, SecurityDecisionService};
pub use mailer::{LogMailer, Mailer};
pub use suspension::SuspensionService;
