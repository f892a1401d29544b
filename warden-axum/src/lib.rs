//! Ready-to-use Axum routes for the warden account security ecosystem
//!
//! This crate wires the warden decision façade into HTTP handlers for the
//! four sensitive authentication operations (login, verification resend,
//! forgot password, reset password) plus the admin status/reset surface.
//!
//! The host application supplies two collaborators:
//!
//! - a [`CredentialStore`] implementing the password/token machinery, and
//! - a `Mailer` (from `warden_core::services`) implementing outbound email.
//!
//! Handlers consult warden before either collaborator is touched, so a
//! denial never produces a side effect, and requests against unknown emails
//! are answered with the same body as successful ones.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden::Warden;
//! use warden_axum::{AppState, admin_router, create_router};
//! use warden_core::services::LogMailer;
//!
//! let state = AppState {
//!     warden: Arc::new(warden),
//!     credentials: Arc::new(my_credential_store),
//!     mailer: Arc::new(LogMailer),
//! };
//!
//! let app = create_router(state.clone())
//!     .nest("/admin", admin_router(state)); // behind admin auth!
//! ```

pub mod credentials;
pub mod error;
pub mod routes;
pub mod types;

pub use credentials::CredentialStore;
pub use error::{ApiError, Result};
pub use routes::{AppState, admin_router, create_router};
pub use types::GENERIC_EMAIL_RESPONSE;
