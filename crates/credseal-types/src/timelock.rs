//! Time-based locks for notarizations
//!
//! A `TimeLock` restricts one of the three mutating concerns of a record:
//! updating, deleting, or transferring. Locks are evaluated against a clock
//! reading supplied by the caller, never against the system clock directly.
//!
//! Two distinct predicates exist on purpose and must not be collapsed:
//!
//! - [`TimeLock::is_timelocked`] treats `UntilDestroyed` as always locked.
//!   It gates updates, deletes, and transfers.
//! - [`TimeLock::is_timelocked_unlock_at`] only ever reports an unexpired
//!   `UnlockAt` as locked. It gates destruction: destroying the record is
//!   precisely the event that satisfies an `UntilDestroyed` condition, so
//!   such a lock never blocks destroy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NotarizationError, Result};

/// A time-based lock guarding a single record operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeLock {
    /// The guarded operation is blocked until a specific instant.
    UnlockAt(DateTime<Utc>),
    /// The guarded operation is blocked until the record is destroyed.
    UntilDestroyed,
    /// No restriction.
    None,
}

impl TimeLock {
    /// Creates a lock that expires at `unlock_time`.
    ///
    /// The instant must be strictly in the future relative to `now`.
    pub fn unlock_at(unlock_time: DateTime<Utc>, now: DateTime<Utc>) -> Result<Self> {
        if unlock_time <= now {
            return Err(NotarizationError::InvalidLock {
                reason: format!("unlock time {unlock_time} must be in the future (now: {now})"),
            });
        }
        Ok(TimeLock::UnlockAt(unlock_time))
    }

    /// Creates a lock that only the record's destruction satisfies.
    pub fn until_destroyed() -> Self {
        TimeLock::UntilDestroyed
    }

    /// Creates the absent lock.
    pub fn none() -> Self {
        TimeLock::None
    }

    /// Whether the guarded operation is currently blocked.
    ///
    /// `UntilDestroyed` is always locked under this predicate.
    pub fn is_timelocked(&self, now: DateTime<Utc>) -> bool {
        match self {
            TimeLock::UnlockAt(at) => *at > now,
            TimeLock::UntilDestroyed => true,
            TimeLock::None => false,
        }
    }

    /// Whether an unexpired `UnlockAt` blocks the operation.
    ///
    /// Used for destroy eligibility: `UntilDestroyed` never blocks here.
    pub fn is_timelocked_unlock_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            TimeLock::UnlockAt(at) => *at > now,
            TimeLock::UntilDestroyed | TimeLock::None => false,
        }
    }

    /// Finalizes this lock as part of destroying its record.
    ///
    /// `None` and `UntilDestroyed` always pass; an `UnlockAt` lock must have
    /// expired.
    pub fn finalize(&self, now: DateTime<Utc>) -> Result<()> {
        match self {
            TimeLock::UnlockAt(at) if *at > now => {
                Err(NotarizationError::LockNotExpired { unlocks_at: *at })
            }
            _ => Ok(()),
        }
    }

    /// The concrete instant at which this lock expires, if it has one.
    pub fn unlocks_at(&self) -> Option<DateTime<Utc>> {
        match self {
            TimeLock::UnlockAt(at) => Some(*at),
            TimeLock::UntilDestroyed | TimeLock::None => None,
        }
    }

    /// Whether this lock is the absent lock.
    pub fn is_none(&self) -> bool {
        matches!(self, TimeLock::None)
    }
}

/// The time-based access restrictions of a notarization.
///
/// Fixed at creation as part of the immutable metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockMetadata {
    pub update_lock: TimeLock,
    pub delete_lock: TimeLock,
    pub transfer_lock: TimeLock,
}

impl LockMetadata {
    /// Builds a lock bundle, validating the cross-lock constraints.
    ///
    /// A record must always have an eventually-satisfiable deletion
    /// condition, so `delete_lock` can never be `UntilDestroyed`. Deletion
    /// is the most destructive operation and must be the last to unlock:
    /// a timed delete lock may not expire before a timed update or
    /// transfer lock from the same bundle.
    pub fn new(update_lock: TimeLock, delete_lock: TimeLock, transfer_lock: TimeLock) -> Result<Self> {
        if delete_lock == TimeLock::UntilDestroyed {
            return Err(NotarizationError::InvalidLock {
                reason: "delete lock cannot be UntilDestroyed".to_string(),
            });
        }

        if let TimeLock::UnlockAt(delete_at) = delete_lock {
            if let TimeLock::UnlockAt(update_at) = update_lock {
                if delete_at < update_at {
                    return Err(NotarizationError::InvalidLock {
                        reason: format!(
                            "delete lock ({delete_at}) must not expire before update lock ({update_at})"
                        ),
                    });
                }
            }
            if let TimeLock::UnlockAt(transfer_at) = transfer_lock {
                if delete_at < transfer_at {
                    return Err(NotarizationError::InvalidLock {
                        reason: format!(
                            "delete lock ({delete_at}) must not expire before transfer lock ({transfer_at})"
                        ),
                    });
                }
            }
        }

        Ok(Self {
            update_lock,
            delete_lock,
            transfer_lock,
        })
    }
}
