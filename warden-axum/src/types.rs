use serde::{Deserialize, Serialize};
use warden::Account;

/// The one response body for enumeration-sensitive outcomes: used verbatim
/// whether the email matched an account or not.
pub const GENERIC_EMAIL_RESPONSE: &str =
    "If an account with that email exists, an email has been sent.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminResetRequest {
    pub scope: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub account: Account,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailDispatchResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,
}
