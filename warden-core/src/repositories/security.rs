//! Repository trait for per-account security state.
//!
//! Every mutation here is an atomic primitive: a single conditional statement
//! (or a single transaction where the account row is involved), scoped to one
//! account. Services compose these primitives; they never read a counter and
//! write it back in separate calls.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::{
    Error,
    account::{AccountId, SecurityProfile},
    policy::{OperationClass, ResetScope},
};

/// Repository for per-account security state.
///
/// # Concurrency
///
/// The attempt windows and suspension fields are shared mutable state across
/// concurrent requests for the same account. Implementations must guarantee
/// that two concurrent calls can never both pass a ceiling, both restart a
/// stale window (double-counting the second request), or interleave a reset
/// with a suspension into a mixed state: either the reset wins or the
/// suspension wins.
///
/// # Enumeration resistance
///
/// Methods keyed by account id are only reachable once an account has been
/// matched; requests against unknown emails never reach this layer, so there
/// is nothing here to leak.
#[async_trait]
pub trait SecurityRepository: Send + Sync + 'static {
    /// Load the security profile for an account.
    ///
    /// Returns `None` if the account (and therefore its profile) does not
    /// exist.
    async fn load(&self, account_id: &AccountId) -> Result<Option<SecurityProfile>, Error>;

    /// Zero one attempt window and restart it at `now`, if and only if it
    /// started a full `window` or more ago.
    ///
    /// The staleness guard is part of the statement itself, so two racing
    /// callers cannot both observe a stale window and reset it twice.
    ///
    /// # Returns
    ///
    /// `true` when a reset was applied, `false` when the window was current.
    async fn reset_stale_window(
        &self,
        account_id: &AccountId,
        op: OperationClass,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<bool, Error>;

    /// Increment one attempt counter, but only while it is below `max`.
    ///
    /// The ceiling comparison and the increment are one statement; under
    /// concurrency at most `max` increments can ever succeed per window.
    ///
    /// # Returns
    ///
    /// The new count after incrementing, or `None` when the ceiling held.
    async fn increment_attempt(
        &self,
        account_id: &AccountId,
        op: OperationClass,
        max: u32,
    ) -> Result<Option<u32>, Error>;

    /// Increment the shared suspicious-activity counter.
    ///
    /// # Returns
    ///
    /// The new counter value.
    async fn record_suspicious(&self, account_id: &AccountId) -> Result<u32, Error>;

    /// Place a temporary lock: set `suspended_until` and `suspension_reason`
    /// and flip the account status to suspended, as one transition.
    async fn apply_suspension(
        &self,
        account_id: &AccountId,
        until: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), Error>;

    /// Clear a lock that has expired by `now`: null the lock fields, zero the
    /// suspicious counter, and restore the account status, as one transition
    /// guarded by the expiry check.
    ///
    /// # Returns
    ///
    /// `true` when an expired lock was cleared, `false` otherwise.
    async fn clear_expired_suspension(
        &self,
        account_id: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<bool, Error>;

    /// Administrative reset of the given scope. Idempotent: resetting an
    /// already-clean profile is a no-op, as is resetting an unknown account.
    ///
    /// Window scopes zero the counter and start a fresh window at `now`;
    /// `Suspicious` and `All` also drop any suspension and restore the
    /// account status.
    async fn reset(
        &self,
        account_id: &AccountId,
        scope: ResetScope,
        now: DateTime<Utc>,
    ) -> Result<(), Error>;
}
