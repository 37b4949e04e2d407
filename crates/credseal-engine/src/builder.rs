//! Notarization builders
//!
//! A type-safe, fluent API for assembling creation requests. The marker
//! type parameter enforces method-specific fields at compile time: only
//! dynamic builders accept a transfer lock, only locked builders accept a
//! delete lock.

use std::marker::PhantomData;

use credseal_types::{NotarizationError, Result, State, TimeLock};

/// Marker type for locked notarizations.
#[derive(Debug, Clone)]
pub struct Locked;

/// Marker type for dynamic notarizations.
#[derive(Debug, Clone)]
pub struct Dynamic;

/// Validated request to create a dynamic notarization.
#[derive(Debug, Clone)]
pub struct CreateDynamic {
    pub state: State,
    pub description: Option<String>,
    pub updatable_metadata: Option<String>,
    pub transfer_lock: TimeLock,
}

/// Validated request to create a locked notarization.
#[derive(Debug, Clone)]
pub struct CreateLocked {
    pub state: State,
    pub description: Option<String>,
    pub updatable_metadata: Option<String>,
    pub delete_lock: TimeLock,
}

/// A builder for notarization creation requests.
#[derive(Debug, Clone)]
pub struct NotarizationBuilder<M> {
    state: Option<State>,
    description: Option<String>,
    updatable_metadata: Option<String>,
    delete_lock: Option<TimeLock>,
    transfer_lock: Option<TimeLock>,
    _marker: PhantomData<M>,
}

impl<M> NotarizationBuilder<M> {
    fn empty() -> Self {
        Self {
            state: None,
            description: None,
            updatable_metadata: None,
            delete_lock: None,
            transfer_lock: None,
            _marker: PhantomData,
        }
    }

    /// Sets the state (data) to be notarized.
    pub fn with_state(mut self, state: State) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the state from raw bytes.
    pub fn with_bytes_state(self, data: Vec<u8>, metadata: Option<String>) -> Self {
        self.with_state(State::from_bytes(data, metadata))
    }

    /// Sets the state from a string.
    pub fn with_string_state(self, data: impl Into<String>, metadata: Option<String>) -> Self {
        self.with_state(State::from_string(data, metadata))
    }

    /// Sets the permanent description, immutable after creation.
    pub fn with_immutable_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the initial updatable metadata.
    pub fn with_updatable_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.updatable_metadata = Some(metadata.into());
        self
    }

    fn take_state(&mut self) -> Result<State> {
        self.state
            .take()
            .ok_or_else(|| NotarizationError::InvalidArgument("state is required".to_string()))
    }
}

impl NotarizationBuilder<Dynamic> {
    /// Creates a builder for a dynamic notarization.
    ///
    /// Dynamic notarizations can be updated after creation and, unless a
    /// transfer lock says otherwise, transferred to other owners.
    pub fn dynamic() -> Self {
        Self::empty()
    }

    /// Restricts when the notarization can be transferred.
    ///
    /// `TimeLock::None` (the default) allows transfer anytime;
    /// `TimeLock::UntilDestroyed` forbids it for the record's lifetime.
    pub fn with_transfer_lock(mut self, lock: TimeLock) -> Self {
        self.transfer_lock = Some(lock);
        self
    }

    /// Finalizes the builder into a creation request.
    pub fn finish(mut self) -> Result<CreateDynamic> {
        Ok(CreateDynamic {
            state: self.take_state()?,
            description: self.description,
            updatable_metadata: self.updatable_metadata,
            transfer_lock: self.transfer_lock.unwrap_or(TimeLock::None),
        })
    }
}

impl NotarizationBuilder<Locked> {
    /// Creates a builder for a locked notarization.
    ///
    /// Locked notarizations are immutable after creation: they can never be
    /// updated or transferred, only destroyed once the delete lock permits.
    pub fn locked() -> Self {
        Self::empty()
    }

    /// Sets when the notarization can be destroyed.
    ///
    /// Required. `TimeLock::UntilDestroyed` is rejected at creation time:
    /// every record must have a concrete, eventually-satisfiable deletion
    /// condition.
    pub fn with_delete_lock(mut self, lock: TimeLock) -> Self {
        self.delete_lock = Some(lock);
        self
    }

    /// Finalizes the builder into a creation request.
    pub fn finish(mut self) -> Result<CreateLocked> {
        let state = self.take_state()?;
        let delete_lock = self.delete_lock.ok_or_else(|| {
            NotarizationError::InvalidArgument("delete lock is required".to_string())
        })?;
        Ok(CreateLocked {
            state,
            description: self.description,
            updatable_metadata: self.updatable_metadata,
            delete_lock,
        })
    }
}
