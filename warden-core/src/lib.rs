//! Core functionality for the warden account security ecosystem
//!
//! This crate contains the domain types, repository traits, and services
//! implementing per-account abuse prevention: rolling attempt windows for
//! sensitive operations, suspicious-activity escalation into temporary
//! suspension, and enumeration-resistant decision objects.
//!
//! It is designed to be used through the `warden` facade crate and is not
//! intended to be consumed directly by application code.
//!
//! See [`Account`] for the account struct, [`policy`] for the decision and
//! transition types, and [`repositories`] for the storage interfaces.

pub mod account;
pub mod error;
pub mod id;
pub mod policy;
pub mod repositories;
pub mod services;
pub mod validation;

pub use account::{Account, AccountId, AccountStatus, NewAccount, SecurityProfile};
pub use error::Error;
pub use policy::{
    Decision, DenyReason, OperationClass, ResetScope, SecurityPolicy, SecurityStatus,
    SuspensionStatus,
};
pub use repositories::RepositoryProvider;
