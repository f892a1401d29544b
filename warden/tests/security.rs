use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use warden::{
    AccountStatus, DenyReason, ResetScope, SecurityPolicy, SqliteRepositoryProvider, Warden,
};

async fn setup() -> (Warden<SqliteRepositoryProvider>, SqlitePool) {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    let warden = Warden::new(Arc::new(SqliteRepositoryProvider::new(pool.clone())));
    warden.migrate().await.unwrap();
    (warden, pool)
}

/// Rewind one verification window directly in the store, simulating the
/// passage of time.
async fn set_verification_window(pool: &SqlitePool, account_id: &str, attempts: i64, reset_at: i64) {
    sqlx::query(
        "UPDATE account_security SET verification_attempts = ?, verification_reset_at = ? \
         WHERE account_id = ?",
    )
    .bind(attempts)
    .bind(reset_at)
    .bind(account_id)
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_ceiling_sequence_then_denial() {
    let (warden, _pool) = setup().await;
    warden
        .create_account("shopper@example.com", None)
        .await
        .unwrap();

    for expected_remaining in [4, 3, 2, 1, 0] {
        let decision = warden
            .check_verification_email("shopper@example.com")
            .await
            .unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.attempts_remaining, Some(expected_remaining));
    }

    let decision = warden
        .check_verification_email("shopper@example.com")
        .await
        .unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.reason, Some(DenyReason::DailyLimitExceeded));
    assert!(decision.resets_at.is_some());
}

#[tokio::test]
async fn test_exhausted_window_from_25_hours_ago_is_allowed_again() {
    let (warden, pool) = setup().await;
    let account = warden
        .create_account("shopper@example.com", None)
        .await
        .unwrap();

    let stale_start = (Utc::now() - Duration::hours(25)).timestamp();
    set_verification_window(&pool, account.id.as_str(), 5, stale_start).await;

    let decision = warden
        .check_verification_email("shopper@example.com")
        .await
        .unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.attempts_remaining, Some(4));

    // The window restarted: counter is 1 with a fresh start time.
    let status = warden
        .security_status("shopper@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.verification.attempts, 1);
    assert!(status.verification.window_started_at.timestamp() > stale_start);
}

#[tokio::test]
async fn test_exhausted_window_from_2_hours_ago_denies_with_reset_time() {
    let (warden, pool) = setup().await;
    let account = warden
        .create_account("shopper@example.com", None)
        .await
        .unwrap();

    let window_start = (Utc::now() - Duration::hours(2)).timestamp();
    set_verification_window(&pool, account.id.as_str(), 5, window_start).await;

    let decision = warden
        .check_verification_email("shopper@example.com")
        .await
        .unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.reason, Some(DenyReason::DailyLimitExceeded));
    // Resets 24h after the window started, i.e. 22h from now.
    assert_eq!(
        decision.resets_at.unwrap().timestamp(),
        window_start + 24 * 3600
    );
}

#[tokio::test]
async fn test_unknown_email_yields_generic_denial() {
    let (warden, _pool) = setup().await;

    let decision = warden
        .check_forgot_password("ghost@example.com")
        .await
        .unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.reason, Some(DenyReason::AccountNotFound));
    assert!(decision.account.is_none());

    assert!(
        warden
            .security_status("ghost@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_operation_classes_have_independent_ceilings() {
    let (warden, _pool) = setup().await;
    warden
        .create_account("shopper@example.com", None)
        .await
        .unwrap();

    for _ in 0..5 {
        warden
            .check_verification_email("shopper@example.com")
            .await
            .unwrap();
    }
    let denied = warden
        .check_verification_email("shopper@example.com")
        .await
        .unwrap();
    assert!(!denied.allowed);

    let decision = warden
        .check_forgot_password("shopper@example.com")
        .await
        .unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.attempts_remaining, Some(4));
}

#[tokio::test]
async fn test_third_suspicious_denial_creates_one_hour_suspension() {
    let (warden, _pool) = setup().await;
    warden
        .create_account("shopper@example.com", None)
        .await
        .unwrap();

    for _ in 0..5 {
        warden
            .check_forgot_password("shopper@example.com")
            .await
            .unwrap();
    }

    // Two over-ceiling denials: suspicious but not yet suspended.
    for _ in 0..2 {
        let decision = warden
            .check_forgot_password("shopper@example.com")
            .await
            .unwrap();
        assert_eq!(decision.reason, Some(DenyReason::DailyLimitExceeded));
    }
    let status = warden
        .security_status("shopper@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.suspicious_count, 2);
    assert!(status.suspended_until.is_none());

    // The third crosses the threshold.
    let before = Utc::now();
    let decision = warden
        .check_forgot_password("shopper@example.com")
        .await
        .unwrap();
    assert_eq!(decision.reason, Some(DenyReason::Suspended));
    let until = decision.suspended_until.unwrap();
    assert!(until >= before + Duration::minutes(59));
    assert!(until <= Utc::now() + Duration::hours(1));

    let status = warden
        .security_status("shopper@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.status, AccountStatus::Suspended);
    assert_eq!(status.suspicious_count, 3);
    assert!(status.suspension_reason.is_some());
}

#[tokio::test]
async fn test_suspension_takes_precedence_over_window_state() {
    let (warden, pool) = setup().await;
    let account = warden
        .create_account("shopper@example.com", None)
        .await
        .unwrap();

    sqlx::query(
        "UPDATE account_security SET suspended_until = ?, suspension_reason = ? \
         WHERE account_id = ?",
    )
    .bind((Utc::now() + Duration::minutes(30)).timestamp())
    .bind("Suspicious activity detected")
    .bind(account.id.as_str())
    .execute(&pool)
    .await
    .unwrap();

    // Full quota available, yet every check denies on the suspension gate
    // without consuming an attempt.
    for _ in 0..2 {
        let decision = warden
            .check_verification_email("shopper@example.com")
            .await
            .unwrap();
        assert_eq!(decision.reason, Some(DenyReason::Suspended));
    }
    let status = warden
        .security_status("shopper@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.verification.attempts, 0);

    // Login is gated by the same suspension.
    let decision = warden
        .check_temporary_suspension("shopper@example.com")
        .await
        .unwrap();
    assert_eq!(decision.reason, Some(DenyReason::Suspended));
}

#[tokio::test]
async fn test_expired_suspension_clears_lazily_on_next_check() {
    let (warden, pool) = setup().await;
    let account = warden
        .create_account("shopper@example.com", None)
        .await
        .unwrap();

    sqlx::query(
        "UPDATE account_security SET suspended_until = ?, suspension_reason = ?, \
         suspicious_count = 3 WHERE account_id = ?",
    )
    .bind((Utc::now() - Duration::seconds(10)).timestamp())
    .bind("Suspicious activity detected")
    .bind(account.id.as_str())
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("UPDATE accounts SET status = 'suspended' WHERE id = ?")
        .bind(account.id.as_str())
        .execute(&pool)
        .await
        .unwrap();

    let decision = warden
        .check_verification_email("shopper@example.com")
        .await
        .unwrap();
    assert!(decision.allowed);

    let status = warden
        .security_status("shopper@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.status, AccountStatus::Active);
    assert!(status.suspended_until.is_none());
    assert_eq!(status.suspicious_count, 0);
}

#[tokio::test]
async fn test_successful_login_clears_all_counters() {
    let (warden, _pool) = setup().await;
    let account = warden
        .create_account("shopper@example.com", None)
        .await
        .unwrap();

    for _ in 0..4 {
        warden
            .check_forgot_password("shopper@example.com")
            .await
            .unwrap();
    }
    let before_reset = warden
        .security_status("shopper@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(before_reset.forgot_password.attempts, 4);

    warden.record_login_success(&account.id).await.unwrap();

    let status = warden
        .security_status("shopper@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.forgot_password.attempts, 0);
    assert!(
        status.forgot_password.window_started_at
            >= before_reset.forgot_password.window_started_at
    );
}

#[tokio::test]
async fn test_admin_reset_is_idempotent() {
    let (warden, _pool) = setup().await;
    let account = warden
        .create_account("shopper@example.com", None)
        .await
        .unwrap();

    for _ in 0..3 {
        warden
            .check_verification_email("shopper@example.com")
            .await
            .unwrap();
    }

    warden
        .reset_attempts(&account.id, ResetScope::All)
        .await
        .unwrap();
    warden
        .reset_attempts(&account.id, ResetScope::All)
        .await
        .unwrap();

    let status = warden
        .security_status("shopper@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.verification.attempts, 0);
    assert_eq!(status.forgot_password.attempts, 0);
    assert_eq!(status.suspicious_count, 0);
    assert!(status.suspended_until.is_none());
    assert_eq!(status.status, AccountStatus::Active);
}

#[tokio::test]
async fn test_scoped_reset_leaves_other_window_untouched() {
    let (warden, _pool) = setup().await;
    let account = warden
        .create_account("shopper@example.com", None)
        .await
        .unwrap();

    for _ in 0..2 {
        warden
            .check_verification_email("shopper@example.com")
            .await
            .unwrap();
        warden
            .check_forgot_password("shopper@example.com")
            .await
            .unwrap();
    }

    warden
        .reset_attempts(&account.id, ResetScope::Verification)
        .await
        .unwrap();

    let status = warden
        .security_status("shopper@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.verification.attempts, 0);
    assert_eq!(status.forgot_password.attempts, 2);
}

#[tokio::test]
async fn test_custom_policy_ceiling() {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    let warden = Warden::new(Arc::new(SqliteRepositoryProvider::new(pool))).with_policy(
        SecurityPolicy {
            max_daily_attempts: 2,
            ..SecurityPolicy::default()
        },
    );
    warden.migrate().await.unwrap();
    warden
        .create_account("shopper@example.com", None)
        .await
        .unwrap();

    for expected_remaining in [1, 0] {
        let decision = warden
            .check_verification_email("shopper@example.com")
            .await
            .unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.attempts_remaining, Some(expected_remaining));
    }

    let decision = warden
        .check_verification_email("shopper@example.com")
        .await
        .unwrap();
    assert_eq!(decision.reason, Some(DenyReason::DailyLimitExceeded));
}

#[tokio::test]
async fn test_disabled_policy_allows_everything() {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    let warden = Warden::new(Arc::new(SqliteRepositoryProvider::new(pool)))
        .with_policy(SecurityPolicy::disabled());
    warden.migrate().await.unwrap();
    warden
        .create_account("shopper@example.com", None)
        .await
        .unwrap();

    for _ in 0..20 {
        let decision = warden
            .check_verification_email("shopper@example.com")
            .await
            .unwrap();
        assert!(decision.allowed);
    }

    let status = warden
        .security_status("shopper@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.verification.attempts, 0);
}
