//! SQLite implementation of the security repository.
//!
//! Every counter mutation is a single conditional `UPDATE` so that the
//! compare and the write cannot be split by a concurrent request: the ceiling
//! check rides on the increment, the staleness check rides on the window
//! reset, and the expiry check rides on the suspension clear. The two-table
//! suspension transitions (security profile + account status) run inside one
//! transaction.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use warden_core::{
    Error,
    account::{AccountId, SecurityProfile},
    error::StorageError,
    policy::{OperationClass, ResetScope},
    repositories::SecurityRepository,
};

/// SQLite repository for per-account security state.
pub struct SqliteSecurityRepository {
    pool: SqlitePool,
}

impl SqliteSecurityRepository {
    /// Create a new SQLite security repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Column names for one operation class. Static strings only; they are
/// interpolated into SQL, never bound.
fn window_columns(op: OperationClass) -> (&'static str, &'static str) {
    match op {
        OperationClass::Verification => ("verification_attempts", "verification_reset_at"),
        OperationClass::ForgotPassword => ("forgot_password_attempts", "forgot_password_reset_at"),
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteSecurityRow {
    account_id: String,
    verification_attempts: i64,
    verification_reset_at: i64,
    forgot_password_attempts: i64,
    forgot_password_reset_at: i64,
    suspicious_count: i64,
    suspended_until: Option<i64>,
    suspension_reason: Option<String>,
    created_at: i64,
    updated_at: i64,
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| Error::Storage(StorageError::Database("Invalid timestamp".to_string())))
}

impl SqliteSecurityRow {
    fn into_profile(self) -> Result<SecurityProfile, Error> {
        Ok(SecurityProfile {
            account_id: AccountId::new(&self.account_id),
            verification_attempts: self.verification_attempts as u32,
            verification_reset_at: timestamp(self.verification_reset_at)?,
            forgot_password_attempts: self.forgot_password_attempts as u32,
            forgot_password_reset_at: timestamp(self.forgot_password_reset_at)?,
            suspicious_count: self.suspicious_count as u32,
            suspended_until: self.suspended_until.map(timestamp).transpose()?,
            suspension_reason: self.suspension_reason,
            created_at: timestamp(self.created_at)?,
            updated_at: timestamp(self.updated_at)?,
        })
    }
}

#[async_trait]
impl SecurityRepository for SqliteSecurityRepository {
    async fn load(&self, account_id: &AccountId) -> Result<Option<SecurityProfile>, Error> {
        let row = sqlx::query_as::<_, SqliteSecurityRow>(
            r#"
            SELECT account_id, verification_attempts, verification_reset_at,
                   forgot_password_attempts, forgot_password_reset_at,
                   suspicious_count, suspended_until, suspension_reason,
                   created_at, updated_at
            FROM account_security
            WHERE account_id = ?
            "#,
        )
        .bind(account_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load security profile");
            StorageError::Database("Failed to load security profile".to_string())
        })?;

        row.map(SqliteSecurityRow::into_profile).transpose()
    }

    async fn reset_stale_window(
        &self,
        account_id: &AccountId,
        op: OperationClass,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<bool, Error> {
        let (attempts, reset_at) = window_columns(op);
        let cutoff = (now - window).timestamp();

        // The staleness guard is inside the statement: two racing callers
        // cannot both observe a stale window and double-reset it.
        let result = sqlx::query(
            format!(
                "UPDATE account_security \
                 SET {attempts} = 0, {reset_at} = ?, updated_at = ? \
                 WHERE account_id = ? AND {reset_at} <= ?"
            )
            .as_str(),
        )
        .bind(now.timestamp())
        .bind(now.timestamp())
        .bind(account_id.as_str())
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to reset stale window");
            StorageError::Database("Failed to reset stale window".to_string())
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_attempt(
        &self,
        account_id: &AccountId,
        op: OperationClass,
        max: u32,
    ) -> Result<Option<u32>, Error> {
        let (attempts, _) = window_columns(op);

        // Ceiling comparison and increment in one statement: at most `max`
        // increments can ever succeed per window, no matter how many requests
        // race.
        let row: Option<(i64,)> = sqlx::query_as(
            format!(
                "UPDATE account_security \
                 SET {attempts} = {attempts} + 1, updated_at = ? \
                 WHERE account_id = ? AND {attempts} < ? \
                 RETURNING {attempts}"
            )
            .as_str(),
        )
        .bind(Utc::now().timestamp())
        .bind(account_id.as_str())
        .bind(max as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to increment attempt counter");
            StorageError::Database("Failed to increment attempt counter".to_string())
        })?;

        Ok(row.map(|(count,)| count as u32))
    }

    async fn record_suspicious(&self, account_id: &AccountId) -> Result<u32, Error> {
        let row: Option<(i64,)> = sqlx::query_as(
            "UPDATE account_security \
             SET suspicious_count = suspicious_count + 1, updated_at = ? \
             WHERE account_id = ? \
             RETURNING suspicious_count",
        )
        .bind(Utc::now().timestamp())
        .bind(account_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to record suspicious activity");
            StorageError::Database("Failed to record suspicious activity".to_string())
        })?;

        let (count,) = row.ok_or(Error::Storage(StorageError::NotFound))?;
        Ok(count as u32)
    }

    async fn apply_suspension(
        &self,
        account_id: &AccountId,
        until: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), Error> {
        let now = Utc::now().timestamp();

        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to begin transaction");
            StorageError::Database("Failed to apply suspension".to_string())
        })?;

        sqlx::query(
            "UPDATE account_security \
             SET suspended_until = ?, suspension_reason = ?, updated_at = ? \
             WHERE account_id = ?",
        )
        .bind(until.timestamp())
        .bind(reason)
        .bind(now)
        .bind(account_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to apply suspension");
            StorageError::Database("Failed to apply suspension".to_string())
        })?;

        sqlx::query("UPDATE accounts SET status = 'suspended', updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(account_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to set suspended status");
                StorageError::Database("Failed to apply suspension".to_string())
            })?;

        tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit suspension");
            StorageError::Database("Failed to apply suspension".to_string())
        })?;

        Ok(())
    }

    async fn clear_expired_suspension(
        &self,
        account_id: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let now_ts = now.timestamp();

        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to begin transaction");
            StorageError::Database("Failed to clear suspension".to_string())
        })?;

        // The expiry guard decides the race: a lock that is still in force is
        // left alone, and the status restore below only runs when this
        // statement won.
        let result = sqlx::query(
            "UPDATE account_security \
             SET suspended_until = NULL, suspension_reason = NULL, \
                 suspicious_count = 0, updated_at = ? \
             WHERE account_id = ? AND suspended_until IS NOT NULL AND suspended_until <= ?",
        )
        .bind(now_ts)
        .bind(account_id.as_str())
        .bind(now_ts)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to clear suspension");
            StorageError::Database("Failed to clear suspension".to_string())
        })?;

        let cleared = result.rows_affected() > 0;

        if cleared {
            sqlx::query(
                "UPDATE accounts SET status = 'active', updated_at = ? \
                 WHERE id = ? AND status = 'suspended'",
            )
            .bind(now_ts)
            .bind(account_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to restore account status");
                StorageError::Database("Failed to clear suspension".to_string())
            })?;
        }

        tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit suspension clear");
            StorageError::Database("Failed to clear suspension".to_string())
        })?;

        Ok(cleared)
    }

    async fn reset(
        &self,
        account_id: &AccountId,
        scope: ResetScope,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let now_ts = now.timestamp();

        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to begin transaction");
            StorageError::Database("Failed to reset security state".to_string())
        })?;

        if matches!(scope, ResetScope::All | ResetScope::Verification) {
            sqlx::query(
                "UPDATE account_security \
                 SET verification_attempts = 0, verification_reset_at = ?, updated_at = ? \
                 WHERE account_id = ?",
            )
            .bind(now_ts)
            .bind(now_ts)
            .bind(account_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to reset verification window");
                StorageError::Database("Failed to reset security state".to_string())
            })?;
        }

        if matches!(scope, ResetScope::All | ResetScope::Password) {
            sqlx::query(
                "UPDATE account_security \
                 SET forgot_password_attempts = 0, forgot_password_reset_at = ?, updated_at = ? \
                 WHERE account_id = ?",
            )
            .bind(now_ts)
            .bind(now_ts)
            .bind(account_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to reset forgot-password window");
                StorageError::Database("Failed to reset security state".to_string())
            })?;
        }

        if matches!(scope, ResetScope::All | ResetScope::Suspicious) {
            sqlx::query(
                "UPDATE account_security \
                 SET suspicious_count = 0, suspended_until = NULL, suspension_reason = NULL, \
                     updated_at = ? \
                 WHERE account_id = ?",
            )
            .bind(now_ts)
            .bind(account_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to reset suspicious counter");
                StorageError::Database("Failed to reset security state".to_string())
            })?;

            sqlx::query(
                "UPDATE accounts SET status = 'active', updated_at = ? \
                 WHERE id = ? AND status = 'suspended'",
            )
            .bind(now_ts)
            .bind(account_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to restore account status");
                StorageError::Database("Failed to reset security state".to_string())
            })?;
        }

        tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit security reset");
            StorageError::Database("Failed to reset security state".to_string())
        })?;

        Ok(())
    }
}
