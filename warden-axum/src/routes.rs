use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use warden::{AccountId, Decision, DenyReason, OperationClass, ResetScope, Warden};
use warden_core::{
    RepositoryProvider, error::ValidationError, services::Mailer, validation::validate_password,
};

use crate::{
    credentials::CredentialStore,
    error::{ApiError, Result},
    types::*,
};

/// Shared state for the warden routes.
///
/// The credential store and mailer are the host application's
/// implementations; warden only decides whether they may be invoked.
pub struct AppState<R: RepositoryProvider> {
    pub warden: Arc<Warden<R>>,
    pub credentials: Arc<dyn CredentialStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl<R: RepositoryProvider> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            warden: self.warden.clone(),
            credentials: self.credentials.clone(),
            mailer: self.mailer.clone(),
        }
    }
}

/// Public authentication routes.
///
/// Every handler consults the warden façade before doing any work that could
/// reveal information, and never branches on account existence itself.
pub fn create_router<R>(state: AppState<R>) -> Router
where
    R: RepositoryProvider + 'static,
{
    Router::new()
        .route("/auth/login", post(login_handler::<R>))
        .route(
            "/auth/verification/resend",
            post(resend_verification_handler::<R>),
        )
        .route("/auth/password/forgot", post(forgot_password_handler::<R>))
        .route("/auth/password/reset", post(reset_password_handler::<R>))
        .with_state(state)
}

/// Administrative routes. Mount these behind the host's admin authorization
/// layer; they intentionally surface account existence and raw counters.
pub fn admin_router<R>(state: AppState<R>) -> Router
where
    R: RepositoryProvider + 'static,
{
    Router::new()
        .route("/security/{email}", get(security_status_handler::<R>))
        .route(
            "/accounts/{account_id}/reset",
            post(reset_attempts_handler::<R>),
        )
        .with_state(state)
}

async fn login_handler<R>(
    State(state): State<AppState<R>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    // Suspension gate first. Login existence is already implied by the
    // attempt itself, so a suspended account gets an explicit 429.
    let decision = state
        .warden
        .check_temporary_suspension(&payload.email)
        .await?;
    if let Some(DenyReason::Suspended) = decision.reason {
        return Err(ApiError::Suspended {
            until: decision.suspended_until,
            reason: decision.suspension_reason,
        });
    }

    let account = state
        .credentials
        .verify_credentials(&payload.email, &payload.password)
        .await?;
    let Some(account) = account else {
        // Uniform failure for unknown email and wrong password alike.
        return Err(ApiError::InvalidCredentials);
    };

    // A correct credential proves owner control; clear the ladder.
    state.warden.record_login_success(&account.id).await?;

    Ok(Json(LoginResponse { account }))
}

async fn resend_verification_handler<R>(
    State(state): State<AppState<R>>,
    Json(payload): Json<ResendVerificationRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let decision = state.warden.check_verification_email(&payload.email).await?;
    dispatch_guarded_email(&state, decision, OperationClass::Verification).await
}

async fn forgot_password_handler<R>(
    State(state): State<AppState<R>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let decision = state.warden.check_forgot_password(&payload.email).await?;
    dispatch_guarded_email(&state, decision, OperationClass::ForgotPassword).await
}

/// Translate a façade decision into the enumeration-safe response, sending
/// the email only on an allow.
///
/// The unknown-account denial produces the same body and status as a
/// successful dispatch. A mailer failure after an allow is reported, but the
/// spent attempt is not rolled back.
async fn dispatch_guarded_email<R>(
    state: &AppState<R>,
    decision: Decision,
    op: OperationClass,
) -> Result<Json<EmailDispatchResponse>>
where
    R: RepositoryProvider,
{
    match decision.reason {
        None => {
            if let Some(account) = decision.account.as_ref() {
                let sent = match op {
                    OperationClass::Verification => {
                        state.mailer.send_verification_email(account).await
                    }
                    OperationClass::ForgotPassword => {
                        state.mailer.send_password_reset_email(account).await
                    }
                };
                if let Err(e) = sent {
                    tracing::error!(error = %e, operation = %op, "failed to dispatch email");
                    return Err(ApiError::InternalError("Failed to send email".to_string()));
                }
            }
            Ok(Json(EmailDispatchResponse {
                message: GENERIC_EMAIL_RESPONSE.to_string(),
                attempts_remaining: decision.attempts_remaining,
            }))
        }
        Some(DenyReason::AccountNotFound) => Ok(Json(EmailDispatchResponse {
            message: GENERIC_EMAIL_RESPONSE.to_string(),
            attempts_remaining: None,
        })),
        Some(DenyReason::DailyLimitExceeded) => Err(ApiError::RateLimited {
            resets_at: decision.resets_at,
        }),
        Some(DenyReason::Suspended) => Err(ApiError::Suspended {
            until: decision.suspended_until,
            reason: decision.suspension_reason,
        }),
    }
}

async fn reset_password_handler<R>(
    State(state): State<AppState<R>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    validate_password(&payload.new_password)
        .map_err(|e: ValidationError| ApiError::BadRequest(e.to_string()))?;

    let account = state
        .credentials
        .resolve_reset_token(&payload.token)
        .await?;
    let Some(account) = account else {
        return Err(ApiError::BadRequest(
            "Invalid or expired reset token".to_string(),
        ));
    };

    // Holding a valid token proves mailbox access, but a suspended account
    // stays locked for the duration.
    let decision = state
        .warden
        .check_temporary_suspension(&account.email)
        .await?;
    if let Some(DenyReason::Suspended) = decision.reason {
        return Err(ApiError::Suspended {
            until: decision.suspended_until,
            reason: decision.suspension_reason,
        });
    }

    state
        .credentials
        .apply_password_reset(&account.id, &payload.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Your password has been reset.".to_string(),
    }))
}

async fn security_status_handler<R>(
    State(state): State<AppState<R>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    match state.warden.security_status(&email).await? {
        Some(status) => Ok(Json(status)),
        None => Err(ApiError::NotFound),
    }
}

async fn reset_attempts_handler<R>(
    State(state): State<AppState<R>>,
    Path(account_id): Path<String>,
    Json(payload): Json<AdminResetRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    // Scope is validated before any store access.
    let scope: ResetScope = payload
        .scope
        .parse()
        .map_err(|e: ValidationError| ApiError::BadRequest(e.to_string()))?;

    state
        .warden
        .reset_attempts(&AccountId::new(&account_id), scope)
        .await?;

    Ok(Json(MessageResponse {
        message: "Security counters reset.".to_string(),
    }))
}
