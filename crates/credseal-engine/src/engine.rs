//! The notarization lifecycle engine
//!
//! The engine owns an injected store handle and clock, gates every mutation
//! on the record's method and lock status, and broadcasts one lifecycle
//! event per successful mutation. "Locked" is a business-rule rejection,
//! never a wait: every operation completes or fails synchronously.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::{broadcast, Mutex};
use tracing::info;

use credseal_types::{
    Data, ImmutableMetadata, LockMetadata, Notarization, NotarizationError, NotarizationEvent,
    NotarizationId, NotarizationMethod, PrincipalId, Result, State, TimeLock,
};

use crate::builder::{CreateDynamic, CreateLocked};
use crate::clock::Clock;
use crate::store::NotarizationStore;

/// Buffered lifecycle events per subscriber before lagging.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The record lifecycle engine.
///
/// Mutations are serialized internally so that every invariant check runs
/// against a snapshot that does not change mid-operation. Failed operations
/// leave the stored record untouched.
pub struct NotarizationEngine<S: NotarizationStore> {
    store: S,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<NotarizationEvent>,
    // Serializes read-modify-write sequences against the store.
    write_lock: Mutex<()>,
}

impl<S: NotarizationStore> NotarizationEngine<S> {
    /// Creates an engine over the given store and clock.
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            clock,
            events,
            write_lock: Mutex::new(()),
        }
    }

    /// Subscribe to lifecycle events.
    ///
    /// Events are a side-channel notification; the engine does not retry or
    /// replay them, and emitting to zero subscribers is not an error.
    pub fn subscribe(&self) -> broadcast::Receiver<NotarizationEvent> {
        self.events.subscribe()
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    /// Creates a dynamic notarization owned by `owner`.
    ///
    /// Lock metadata is built only when a transfer restriction was
    /// requested; update and delete locks are fixed to `None`.
    pub async fn create_dynamic(
        &self,
        request: CreateDynamic,
        owner: PrincipalId,
    ) -> Result<Notarization> {
        let _guard = self.write_lock.lock().await;
        let now = self.clock.now();

        validate_new_lock(&request.transfer_lock, now)?;
        let locking = if request.transfer_lock.is_none() {
            None
        } else {
            Some(LockMetadata::new(
                TimeLock::None,
                TimeLock::None,
                request.transfer_lock,
            )?)
        };

        let record = Notarization::new(
            NotarizationId::new(),
            request.state,
            ImmutableMetadata::new(now, request.description, locking),
            request.updatable_metadata,
            NotarizationMethod::Dynamic,
            owner,
        );
        record.assert_method_invariant()?;

        self.store.put(record.clone()).await?;
        info!("Created dynamic notarization {} for {}", record.id, record.owner);
        self.emit(NotarizationEvent::Created {
            notarization_id: record.id.clone(),
            method: NotarizationMethod::Dynamic,
            owner: record.owner.clone(),
            timestamp: now,
        });
        Ok(record)
    }

    /// Creates a locked notarization owned by `owner`.
    ///
    /// The update and transfer locks are always `UntilDestroyed`; the
    /// delete lock must be `None` or a future-dated `UnlockAt`.
    pub async fn create_locked(
        &self,
        request: CreateLocked,
        owner: PrincipalId,
    ) -> Result<Notarization> {
        let _guard = self.write_lock.lock().await;
        let now = self.clock.now();

        if request.delete_lock == TimeLock::UntilDestroyed {
            return Err(NotarizationError::InvalidLock {
                reason: "delete lock cannot be UntilDestroyed".to_string(),
            });
        }
        validate_new_lock(&request.delete_lock, now)?;
        let locking = LockMetadata::new(
            TimeLock::UntilDestroyed,
            request.delete_lock,
            TimeLock::UntilDestroyed,
        )?;

        let record = Notarization::new(
            NotarizationId::new(),
            request.state,
            ImmutableMetadata::new(now, request.description, Some(locking)),
            request.updatable_metadata,
            NotarizationMethod::Locked,
            owner,
        );
        record.assert_method_invariant()?;

        self.store.put(record.clone()).await?;
        info!("Created locked notarization {} for {}", record.id, record.owner);
        self.emit(NotarizationEvent::Created {
            notarization_id: record.id.clone(),
            method: NotarizationMethod::Locked,
            owner: record.owner.clone(),
            timestamp: now,
        });
        Ok(record)
    }

    // ========================================================================
    // Mutators
    // ========================================================================

    /// Replaces the record's state wholesale.
    ///
    /// Bumps the version counter and the last-change timestamp. Fails with
    /// `UpdateLocked` for locked records (their update lock never expires).
    pub async fn update_state(
        &self,
        id: &NotarizationId,
        caller: &PrincipalId,
        new_state: State,
    ) -> Result<Notarization> {
        let _guard = self.write_lock.lock().await;
        let now = self.clock.now();

        let mut record = self.load_owned(id, caller).await?;
        record.update_state(new_state, now)?;
        self.store.put(record.clone()).await?;

        info!("Updated notarization {} to version {}", record.id, record.state_version_count);
        self.emit(NotarizationEvent::Updated {
            notarization_id: record.id.clone(),
            new_state: record.state.clone(),
            version: record.state_version_count,
            timestamp: now,
        });
        Ok(record)
    }

    /// Replaces (or clears, with `None`) the updatable metadata.
    ///
    /// Gated by the same update lock as state updates, but touches neither
    /// the version counter nor the last-change timestamp.
    pub async fn update_metadata(
        &self,
        id: &NotarizationId,
        caller: &PrincipalId,
        metadata: Option<String>,
    ) -> Result<Notarization> {
        let _guard = self.write_lock.lock().await;
        let now = self.clock.now();

        let mut record = self.load_owned(id, caller).await?;
        record.update_metadata(metadata, now)?;
        self.store.put(record.clone()).await?;

        info!("Updated metadata on notarization {}", record.id);
        self.emit(NotarizationEvent::MetadataUpdated {
            notarization_id: record.id.clone(),
            updatable_metadata: record.updatable_metadata.clone(),
            timestamp: now,
        });
        Ok(record)
    }

    /// Transfers ownership to `new_owner`.
    ///
    /// Locked records always fail this check: their transfer lock is
    /// `UntilDestroyed`.
    pub async fn transfer(
        &self,
        id: &NotarizationId,
        caller: &PrincipalId,
        new_owner: PrincipalId,
    ) -> Result<Notarization> {
        let _guard = self.write_lock.lock().await;
        let now = self.clock.now();

        let mut record = self.load_owned(id, caller).await?;
        let from = record.owner.clone();
        record.transfer_to(new_owner.clone(), now)?;
        self.store.put(record.clone()).await?;

        info!("Transferred notarization {}: {} -> {}", record.id, from, new_owner);
        self.emit(NotarizationEvent::Transferred {
            notarization_id: record.id.clone(),
            from,
            to: new_owner,
            timestamp: now,
        });
        Ok(record)
    }

    /// Destroys the record, removing it and its lock metadata from the
    /// store irrecoverably.
    ///
    /// Every lock in the bundle is finalized individually: unexpired
    /// `UnlockAt` locks fail with `LockNotExpired`, while `None` and
    /// `UntilDestroyed` always pass (destruction is the event that
    /// satisfies an until-destroyed condition).
    pub async fn destroy(&self, id: &NotarizationId, caller: &PrincipalId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let now = self.clock.now();

        let record = self.load_owned(id, caller).await?;
        record.check_destroy(now)?;
        self.store.delete(id).await?;

        info!("Destroyed notarization {}", id);
        self.emit(NotarizationEvent::Destroyed {
            notarization_id: id.clone(),
            timestamp: now,
        });
        Ok(())
    }

    // ========================================================================
    // Read-only inspection
    // ========================================================================

    /// Fetches the full record. Requires no write credentials.
    pub async fn get(&self, id: &NotarizationId) -> Result<Notarization> {
        self.store.get(id).await?.ok_or_else(|| NotarizationError::NotFound {
            notarization_id: id.clone(),
        })
    }

    /// The record's current state.
    pub async fn state(&self, id: &NotarizationId) -> Result<State> {
        Ok(self.get(id).await?.state)
    }

    /// Decodes the state payload as JSON into `T`, preserving the
    /// state-scoped metadata.
    pub async fn state_as<T: DeserializeOwned>(&self, id: &NotarizationId) -> Result<State<T>> {
        let state = self.state(id).await?;
        let data = match &state.data {
            Data::Text(text) => serde_json::from_str(text),
            Data::Bytes(bytes) => serde_json::from_slice(bytes),
        }
        .map_err(|e| NotarizationError::StateDecoding(e.to_string()))?;
        Ok(State {
            data,
            metadata: state.metadata,
        })
    }

    /// The immutable description.
    pub async fn description(&self, id: &NotarizationId) -> Result<Option<String>> {
        Ok(self.get(id).await?.immutable_metadata.description)
    }

    /// The updatable metadata.
    pub async fn updatable_metadata(&self, id: &NotarizationId) -> Result<Option<String>> {
        Ok(self.get(id).await?.updatable_metadata)
    }

    /// When the record was created.
    pub async fn created_at(&self, id: &NotarizationId) -> Result<chrono::DateTime<chrono::Utc>> {
        Ok(self.get(id).await?.created_at())
    }

    /// When the record's state last changed.
    pub async fn last_state_change_at(
        &self,
        id: &NotarizationId,
    ) -> Result<chrono::DateTime<chrono::Utc>> {
        Ok(self.get(id).await?.last_state_change_at())
    }

    /// Number of successful state updates.
    pub async fn state_version_count(&self, id: &NotarizationId) -> Result<u64> {
        Ok(self.get(id).await?.state_version_count())
    }

    /// The record's method.
    pub async fn method(&self, id: &NotarizationId) -> Result<NotarizationMethod> {
        Ok(self.get(id).await?.method())
    }

    /// The record's lock configuration; absent for an unrestricted dynamic
    /// record.
    pub async fn lock_metadata(&self, id: &NotarizationId) -> Result<Option<LockMetadata>> {
        Ok(self.get(id).await?.immutable_metadata.locking)
    }

    /// Whether updates are currently blocked.
    pub async fn is_update_locked(&self, id: &NotarizationId) -> Result<bool> {
        Ok(self.get(id).await?.is_update_locked(self.clock.now()))
    }

    /// Whether deletion is blocked by the delete lock.
    pub async fn is_delete_locked(&self, id: &NotarizationId) -> Result<bool> {
        Ok(self.get(id).await?.is_delete_locked(self.clock.now()))
    }

    /// Whether ownership transfer is currently blocked.
    pub async fn is_transfer_locked(&self, id: &NotarizationId) -> Result<bool> {
        Ok(self.get(id).await?.is_transfer_locked(self.clock.now()))
    }

    /// Whether the record may be destroyed right now.
    pub async fn is_destroy_allowed(&self, id: &NotarizationId) -> Result<bool> {
        Ok(self.get(id).await?.is_destroy_allowed(self.clock.now()))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn load_owned(
        &self,
        id: &NotarizationId,
        caller: &PrincipalId,
    ) -> Result<Notarization> {
        let record = self.get(id).await?;
        if &record.owner != caller {
            return Err(NotarizationError::NotOwner {
                notarization_id: id.clone(),
                caller: caller.clone(),
            });
        }
        Ok(record)
    }

    fn emit(&self, event: NotarizationEvent) {
        // No subscribers is fine; events are best-effort notifications.
        let _ = self.events.send(event);
    }
}

fn validate_new_lock(lock: &TimeLock, now: chrono::DateTime<chrono::Utc>) -> Result<()> {
    if let TimeLock::UnlockAt(at) = lock {
        if *at <= now {
            return Err(NotarizationError::InvalidLock {
                reason: format!("unlock time {at} must be in the future (now: {now})"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NotarizationBuilder;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};

    fn engine_with_clock() -> (NotarizationEngine<MemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let engine = NotarizationEngine::new(MemoryStore::new(), clock.clone());
        (engine, clock)
    }

    #[tokio::test]
    async fn test_create_dynamic_emits_created() {
        let (engine, _clock) = engine_with_clock();
        let mut events = engine.subscribe();
        let owner = PrincipalId::new();

        let record = engine
            .create_dynamic(
                NotarizationBuilder::dynamic()
                    .with_string_state("v1", None)
                    .finish()
                    .unwrap(),
                owner.clone(),
            )
            .await
            .unwrap();

        assert_eq!(record.owner, owner);
        assert_eq!(record.method(), NotarizationMethod::Dynamic);
        assert!(record.lock_metadata().is_none());

        match events.try_recv().unwrap() {
            NotarizationEvent::Created { notarization_id, method, .. } => {
                assert_eq!(notarization_id, record.id);
                assert_eq!(method, NotarizationMethod::Dynamic);
            }
            other => panic!("expected Created, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_locked_shape() {
        let (engine, clock) = engine_with_clock();
        let unlock = clock.now() + Duration::days(1);

        let record = engine
            .create_locked(
                NotarizationBuilder::locked()
                    .with_string_state("diploma", None)
                    .with_delete_lock(TimeLock::UnlockAt(unlock))
                    .finish()
                    .unwrap(),
                PrincipalId::new(),
            )
            .await
            .unwrap();

        let locking = record.lock_metadata().unwrap();
        assert_eq!(locking.update_lock, TimeLock::UntilDestroyed);
        assert_eq!(locking.transfer_lock, TimeLock::UntilDestroyed);
        assert_eq!(locking.delete_lock, TimeLock::UnlockAt(unlock));
        assert_eq!(record.state_version_count(), 0);
    }

    #[tokio::test]
    async fn test_create_locked_rejects_until_destroyed_delete() {
        let (engine, _clock) = engine_with_clock();
        let result = engine
            .create_locked(
                NotarizationBuilder::locked()
                    .with_string_state("x", None)
                    .with_delete_lock(TimeLock::UntilDestroyed)
                    .finish()
                    .unwrap(),
                PrincipalId::new(),
            )
            .await;
        assert!(matches!(result, Err(NotarizationError::InvalidLock { .. })));
    }

    #[tokio::test]
    async fn test_create_rejects_past_dated_lock() {
        let (engine, clock) = engine_with_clock();
        let past = clock.now() - Duration::seconds(1);
        let result = engine
            .create_dynamic(
                NotarizationBuilder::dynamic()
                    .with_string_state("v1", None)
                    .with_transfer_lock(TimeLock::UnlockAt(past))
                    .finish()
                    .unwrap(),
                PrincipalId::new(),
            )
            .await;
        assert!(matches!(result, Err(NotarizationError::InvalidLock { .. })));
    }

    #[tokio::test]
    async fn test_only_owner_can_mutate() {
        let (engine, _clock) = engine_with_clock();
        let owner = PrincipalId::new();
        let stranger = PrincipalId::new();

        let record = engine
            .create_dynamic(
                NotarizationBuilder::dynamic()
                    .with_string_state("v1", None)
                    .finish()
                    .unwrap(),
                owner.clone(),
            )
            .await
            .unwrap();

        let result = engine
            .update_state(&record.id, &stranger, State::from_string("v2", None))
            .await;
        assert!(matches!(result, Err(NotarizationError::NotOwner { .. })));

        let result = engine.destroy(&record.id, &stranger).await;
        assert!(matches!(result, Err(NotarizationError::NotOwner { .. })));

        // Reads need no credentials.
        assert_eq!(engine.state_version_count(&record.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_destroyed_record_is_gone() {
        let (engine, _clock) = engine_with_clock();
        let owner = PrincipalId::new();
        let mut events = engine.subscribe();

        let record = engine
            .create_dynamic(
                NotarizationBuilder::dynamic()
                    .with_string_state("v1", None)
                    .finish()
                    .unwrap(),
                owner.clone(),
            )
            .await
            .unwrap();

        engine.destroy(&record.id, &owner).await.unwrap();
        assert!(matches!(
            engine.get(&record.id).await,
            Err(NotarizationError::NotFound { .. })
        ));
        // Retrying a destroy hits NotFound, never a partial state.
        assert!(matches!(
            engine.destroy(&record.id, &owner).await,
            Err(NotarizationError::NotFound { .. })
        ));

        // Exactly two events: Created then Destroyed.
        assert!(matches!(events.try_recv().unwrap(), NotarizationEvent::Created { .. }));
        assert!(matches!(events.try_recv().unwrap(), NotarizationEvent::Destroyed { .. }));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_state_as_decodes_json_payload() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Credential {
            degree: String,
            year: u32,
        }

        let (engine, _clock) = engine_with_clock();
        let record = engine
            .create_locked(
                NotarizationBuilder::locked()
                    .with_string_state(
                        r#"{"degree":"BSc Computer Science","year":2025}"#,
                        Some("credential json".to_string()),
                    )
                    .with_delete_lock(TimeLock::None)
                    .finish()
                    .unwrap(),
                PrincipalId::new(),
            )
            .await
            .unwrap();

        let state: State<Credential> = engine.state_as(&record.id).await.unwrap();
        assert_eq!(state.data.degree, "BSc Computer Science");
        assert_eq!(state.data.year, 2025);
        assert_eq!(state.metadata.as_deref(), Some("credential json"));

        let bad: Result<State<Credential>> = {
            let dynamic = engine
                .create_dynamic(
                    NotarizationBuilder::dynamic()
                        .with_string_state("not json", None)
                        .finish()
                        .unwrap(),
                    PrincipalId::new(),
                )
                .await
                .unwrap();
            engine.state_as(&dynamic.id).await
        };
        assert!(matches!(bad, Err(NotarizationError::StateDecoding(_))));
    }

    #[tokio::test]
    async fn test_update_failure_leaves_record_untouched() {
        let (engine, clock) = engine_with_clock();
        let owner = PrincipalId::new();
        let unlock = clock.now() + Duration::hours(1);

        let record = engine
            .create_dynamic(
                NotarizationBuilder::dynamic()
                    .with_string_state("v1", None)
                    .with_transfer_lock(TimeLock::UnlockAt(unlock))
                    .finish()
                    .unwrap(),
                owner.clone(),
            )
            .await
            .unwrap();

        let result = engine.transfer(&record.id, &owner, PrincipalId::new()).await;
        match result {
            Err(NotarizationError::TransferLocked { unlocks_at, .. }) => {
                assert_eq!(unlocks_at, Some(unlock));
            }
            other => panic!("expected TransferLocked, got {other:?}"),
        }

        // Ownership unchanged after the rejection.
        let fetched = engine.get(&record.id).await.unwrap();
        assert_eq!(fetched.owner, owner);
    }
}
