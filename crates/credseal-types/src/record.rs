//! The notarization record aggregate
//!
//! A `Notarization` is the versioned, owned unit of storage the engine
//! manages. Both methods share this one aggregate type; mutators branch only
//! on the method tag via the lock shape fixed at creation, which keeps the
//! invariant checks centralized and auditable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NotarizationError, Result};
use crate::identity::{NotarizationId, PrincipalId};
use crate::metadata::ImmutableMetadata;
use crate::state::{Data, State};
use crate::timelock::{LockMetadata, TimeLock};

/// Indicates the used notarization method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotarizationMethod {
    /// Updatable record, optionally transfer-locked
    Dynamic,
    /// Immutable record, always update- and transfer-locked
    Locked,
}

/// A notarization record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notarization<T = Data> {
    /// The unique identifier of the notarization
    pub id: NotarizationId,
    /// The current state of the notarization
    pub state: State<T>,
    /// The immutable metadata, fixed at creation
    pub immutable_metadata: ImmutableMetadata,
    /// Free-text annotation, mutable independently of the state
    pub updatable_metadata: Option<String>,
    /// Timestamp of the last state change
    pub last_state_change_at: DateTime<Utc>,
    /// Number of successful state updates applied so far
    pub state_version_count: u64,
    /// The method of the notarization
    pub method: NotarizationMethod,
    /// The principal currently authorized to mutate or destroy the record
    pub owner: PrincipalId,
}

impl<T> Notarization<T> {
    /// Assembles a fresh record. Used by the constructors only; version
    /// count starts at 0 and the last state change is the creation instant.
    pub fn new(
        id: NotarizationId,
        state: State<T>,
        immutable_metadata: ImmutableMetadata,
        updatable_metadata: Option<String>,
        method: NotarizationMethod,
        owner: PrincipalId,
    ) -> Self {
        let created_at = immutable_metadata.created_at;
        Self {
            id,
            state,
            immutable_metadata,
            updatable_metadata,
            last_state_change_at: created_at,
            state_version_count: 0,
            method,
            owner,
        }
    }

    // ========================================================================
    // Read-only inspection
    // ========================================================================

    /// The current state.
    pub fn state(&self) -> &State<T> {
        &self.state
    }

    /// The immutable description set at creation.
    pub fn description(&self) -> Option<&str> {
        self.immutable_metadata.description.as_deref()
    }

    /// The updatable free-text metadata.
    pub fn updatable_metadata(&self) -> Option<&str> {
        self.updatable_metadata.as_deref()
    }

    /// When the record was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.immutable_metadata.created_at
    }

    /// When the state last changed (creation counts).
    pub fn last_state_change_at(&self) -> DateTime<Utc> {
        self.last_state_change_at
    }

    /// Number of successful state updates.
    pub fn state_version_count(&self) -> u64 {
        self.state_version_count
    }

    /// The notarization method.
    pub fn method(&self) -> NotarizationMethod {
        self.method
    }

    /// The lock configuration, absent for an unrestricted dynamic record.
    pub fn lock_metadata(&self) -> Option<&LockMetadata> {
        self.immutable_metadata.locking.as_ref()
    }

    // ========================================================================
    // Lock-status predicates
    // ========================================================================

    /// Whether state and metadata updates are currently blocked.
    ///
    /// Always `true` for locked records (their update lock is
    /// `UntilDestroyed`), always `false` for dynamic records.
    pub fn is_update_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_metadata()
            .map(|l| l.update_lock.is_timelocked(now))
            .unwrap_or(false)
    }

    /// Whether deletion is blocked by the delete lock.
    pub fn is_delete_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_metadata()
            .map(|l| l.delete_lock.is_timelocked(now))
            .unwrap_or(false)
    }

    /// Whether ownership transfer is currently blocked.
    ///
    /// Always `true` for locked records (their transfer lock is
    /// `UntilDestroyed`).
    pub fn is_transfer_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_metadata()
            .map(|l| l.transfer_lock.is_timelocked(now))
            .unwrap_or(false)
    }

    /// Whether the record may be destroyed right now.
    ///
    /// Only unexpired `UnlockAt` locks block destruction; `UntilDestroyed`
    /// locks are satisfied by the destruction itself.
    pub fn is_destroy_allowed(&self, now: DateTime<Utc>) -> bool {
        match self.lock_metadata() {
            Some(locking) => {
                !locking.update_lock.is_timelocked_unlock_at(now)
                    && !locking.delete_lock.is_timelocked_unlock_at(now)
                    && !locking.transfer_lock.is_timelocked_unlock_at(now)
            }
            None => true,
        }
    }

    // ========================================================================
    // Mutators (lock-gated; ownership is checked by the engine)
    // ========================================================================

    /// Replaces the state wholesale, bumping the version counter and the
    /// last-change timestamp.
    pub fn update_state(&mut self, new_state: State<T>, now: DateTime<Utc>) -> Result<()> {
        if self.is_update_locked(now) {
            return Err(NotarizationError::UpdateLocked {
                notarization_id: self.id.clone(),
                unlocks_at: self.update_unlocks_at(),
            });
        }
        self.state = new_state;
        self.last_state_change_at = now;
        self.state_version_count += 1;
        Ok(())
    }

    /// Replaces the updatable metadata. `None` clears it. Does not touch
    /// the version counter or the last-change timestamp.
    pub fn update_metadata(&mut self, metadata: Option<String>, now: DateTime<Utc>) -> Result<()> {
        if self.is_update_locked(now) {
            return Err(NotarizationError::UpdateLocked {
                notarization_id: self.id.clone(),
                unlocks_at: self.update_unlocks_at(),
            });
        }
        self.updatable_metadata = metadata;
        Ok(())
    }

    /// Changes ownership to `new_owner`.
    pub fn transfer_to(&mut self, new_owner: PrincipalId, now: DateTime<Utc>) -> Result<()> {
        if self.is_transfer_locked(now) {
            return Err(NotarizationError::TransferLocked {
                notarization_id: self.id.clone(),
                unlocks_at: self.transfer_unlocks_at(),
            });
        }
        self.owner = new_owner;
        Ok(())
    }

    /// Verifies the record may be destroyed, then finalizes every lock in
    /// its bundle individually. The caller removes the record afterwards.
    pub fn check_destroy(&self, now: DateTime<Utc>) -> Result<()> {
        if !self.is_destroy_allowed(now) {
            return Err(NotarizationError::DestroyLocked {
                notarization_id: self.id.clone(),
                unlocks_at: self.destroy_unlocks_at(),
            });
        }
        if let Some(locking) = self.lock_metadata() {
            locking.update_lock.finalize(now)?;
            locking.delete_lock.finalize(now)?;
            locking.transfer_lock.finalize(now)?;
        }
        Ok(())
    }

    // ========================================================================
    // Method invariant
    // ========================================================================

    /// Checks that the record satisfies its method's fixed lock shape.
    ///
    /// Violations outside the constructors signal a programming error, not
    /// a user error.
    pub fn assert_method_invariant(&self) -> Result<()> {
        match self.method {
            NotarizationMethod::Locked => {
                let Some(locking) = self.lock_metadata() else {
                    return self.invariant_violation("locked record has no lock metadata");
                };
                if locking.update_lock != TimeLock::UntilDestroyed {
                    return self.invariant_violation("locked record's update lock must be UntilDestroyed");
                }
                if locking.transfer_lock != TimeLock::UntilDestroyed {
                    return self.invariant_violation("locked record's transfer lock must be UntilDestroyed");
                }
                if locking.delete_lock == TimeLock::UntilDestroyed {
                    return self.invariant_violation("locked record's delete lock cannot be UntilDestroyed");
                }
            }
            NotarizationMethod::Dynamic => {
                if let Some(locking) = self.lock_metadata() {
                    if locking.update_lock != TimeLock::None {
                        return self.invariant_violation("dynamic record's update lock must be None");
                    }
                    if locking.delete_lock != TimeLock::None {
                        return self.invariant_violation("dynamic record's delete lock must be None");
                    }
                    if locking.transfer_lock == TimeLock::None {
                        return self.invariant_violation(
                            "dynamic record with lock metadata must carry a transfer lock",
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn invariant_violation(&self, detail: &str) -> Result<()> {
        Err(NotarizationError::MethodInvariantViolation {
            notarization_id: self.id.clone(),
            detail: detail.to_string(),
        })
    }

    fn update_unlocks_at(&self) -> Option<DateTime<Utc>> {
        self.lock_metadata().and_then(|l| l.update_lock.unlocks_at())
    }

    fn transfer_unlocks_at(&self) -> Option<DateTime<Utc>> {
        self.lock_metadata().and_then(|l| l.transfer_lock.unlocks_at())
    }

    /// The instant at which destruction becomes possible: the latest
    /// unexpired `UnlockAt` across the bundle.
    fn destroy_unlocks_at(&self) -> Option<DateTime<Utc>> {
        self.lock_metadata().and_then(|l| {
            [&l.update_lock, &l.delete_lock, &l.transfer_lock]
                .iter()
                .filter_map(|lock| lock.unlocks_at())
                .max()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn dynamic_record(transfer_lock: TimeLock, now: DateTime<Utc>) -> Notarization {
        let locking = if transfer_lock.is_none() {
            None
        } else {
            Some(LockMetadata::new(TimeLock::None, TimeLock::None, transfer_lock).unwrap())
        };
        Notarization::new(
            NotarizationId::new(),
            State::from_string("v1", Some("m1".to_string())),
            ImmutableMetadata::new(now, Some("status feed".to_string()), locking),
            None,
            NotarizationMethod::Dynamic,
            PrincipalId::new(),
        )
    }

    fn locked_record(delete_lock: TimeLock, now: DateTime<Utc>) -> Notarization {
        let locking =
            LockMetadata::new(TimeLock::UntilDestroyed, delete_lock, TimeLock::UntilDestroyed)
                .unwrap();
        Notarization::new(
            NotarizationId::new(),
            State::from_string("diploma", None),
            ImmutableMetadata::new(now, None, Some(locking)),
            None,
            NotarizationMethod::Locked,
            PrincipalId::new(),
        )
    }

    #[test]
    fn test_new_record_starts_at_version_zero() {
        let now = Utc::now();
        let record = dynamic_record(TimeLock::None, now);
        assert_eq!(record.state_version_count(), 0);
        assert_eq!(record.created_at(), now);
        assert_eq!(record.last_state_change_at(), now);
        assert!(record.lock_metadata().is_none());
    }

    #[test]
    fn test_update_state_bumps_version_and_timestamp() {
        let now = Utc::now();
        let mut record = dynamic_record(TimeLock::None, now);
        let later = now + Duration::seconds(5);

        record
            .update_state(State::from_string("v2", Some("m2".to_string())), later)
            .unwrap();

        assert_eq!(record.state_version_count(), 1);
        assert_eq!(record.last_state_change_at(), later);
        assert_eq!(record.state.data.as_text().unwrap(), "v2");
    }

    #[test]
    fn test_update_metadata_does_not_touch_version() {
        let now = Utc::now();
        let mut record = dynamic_record(TimeLock::None, now);
        let later = now + Duration::seconds(5);

        record.update_metadata(Some("annotated".to_string()), later).unwrap();
        assert_eq!(record.updatable_metadata(), Some("annotated"));
        assert_eq!(record.state_version_count(), 0);
        assert_eq!(record.last_state_change_at(), now);

        record.update_metadata(None, later).unwrap();
        assert_eq!(record.updatable_metadata(), None);
    }

    #[test]
    fn test_locked_record_never_updatable_or_transferable() {
        let now = Utc::now();
        let mut record = locked_record(TimeLock::None, now);
        let far_future = now + Duration::days(10_000);

        assert!(record.is_update_locked(far_future));
        assert!(record.is_transfer_locked(far_future));
        assert!(matches!(
            record.update_state(State::from_string("x", None), far_future),
            Err(NotarizationError::UpdateLocked { unlocks_at: None, .. })
        ));
        assert!(matches!(
            record.transfer_to(PrincipalId::new(), far_future),
            Err(NotarizationError::TransferLocked { unlocks_at: None, .. })
        ));
        // Still at version 0 after failed mutations.
        assert_eq!(record.state_version_count(), 0);
    }

    #[test]
    fn test_locked_record_destroy_gated_by_delete_lock() {
        let now = Utc::now();
        let unlock = now + Duration::seconds(86400);
        let record = locked_record(TimeLock::UnlockAt(unlock), now);

        assert!(record.is_delete_locked(now));
        assert!(!record.is_destroy_allowed(now));
        assert!(matches!(
            record.check_destroy(now),
            Err(NotarizationError::DestroyLocked { unlocks_at: Some(at), .. }) if at == unlock
        ));

        let after = now + Duration::seconds(86401);
        assert!(record.is_destroy_allowed(after));
        assert!(record.check_destroy(after).is_ok());
    }

    #[test]
    fn test_until_destroyed_transfer_lock_blocks_transfer_not_destroy() {
        let now = Utc::now();
        let mut record = dynamic_record(TimeLock::UntilDestroyed, now);

        assert!(record.is_transfer_locked(now));
        assert!(record.transfer_to(PrincipalId::new(), now).is_err());
        assert!(record.is_destroy_allowed(now));
        assert!(record.check_destroy(now).is_ok());
    }

    #[test]
    fn test_timed_transfer_lock_boundary() {
        let now = Utc::now();
        let unlock = now + Duration::hours(1);
        let mut record = dynamic_record(TimeLock::UnlockAt(unlock), now);
        let original_owner = record.owner.clone();

        assert!(record.transfer_to(PrincipalId::new(), now).is_err());
        assert_eq!(record.owner, original_owner);

        let new_owner = PrincipalId::new();
        record.transfer_to(new_owner.clone(), unlock).unwrap();
        assert_eq!(record.owner, new_owner);
    }

    #[test]
    fn test_method_invariants() {
        let now = Utc::now();
        assert!(dynamic_record(TimeLock::None, now).assert_method_invariant().is_ok());
        assert!(dynamic_record(TimeLock::UntilDestroyed, now)
            .assert_method_invariant()
            .is_ok());
        assert!(locked_record(TimeLock::None, now).assert_method_invariant().is_ok());

        // A locked record whose transfer lock is not UntilDestroyed is broken.
        let mut broken = locked_record(TimeLock::None, now);
        broken.immutable_metadata.locking = Some(LockMetadata {
            update_lock: TimeLock::UntilDestroyed,
            delete_lock: TimeLock::None,
            transfer_lock: TimeLock::None,
        });
        assert!(matches!(
            broken.assert_method_invariant(),
            Err(NotarizationError::MethodInvariantViolation { .. })
        ));

        // A dynamic record carrying an update restriction is broken.
        let mut broken = dynamic_record(TimeLock::UntilDestroyed, now);
        broken.immutable_metadata.locking = Some(LockMetadata {
            update_lock: TimeLock::UntilDestroyed,
            delete_lock: TimeLock::None,
            transfer_lock: TimeLock::UntilDestroyed,
        });
        assert!(broken.assert_method_invariant().is_err());
    }
}
