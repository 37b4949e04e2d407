//! CredSeal Types - Canonical domain types for time-lock-governed notarization
//!
//! This crate contains all foundational types for CredSeal with zero
//! dependencies on other credseal crates. It defines the complete type
//! system for:
//!
//! - Identity types (NotarizationId, PrincipalId)
//! - The three-variant TimeLock primitive and per-record lock bundles
//! - State payloads (bytes or text, replaced wholesale on update)
//! - The Notarization record aggregate and its method invariants
//! - Lifecycle events and the error taxonomy
//!
//! # Architectural Invariants
//!
//! 1. Immutable metadata (creation time, description, lock bundle) is set
//!    once and never mutated
//! 2. The version counter increments by exactly one per successful state
//!    update and is untouched by metadata updates
//! 3. Locked records can never be updated or transferred; their locks are
//!    satisfied only by destruction
//! 4. A delete lock is never `UntilDestroyed` and never unlocks before a
//!    timed update or transfer restriction from the same bundle

pub mod error;
pub mod event;
pub mod identity;
pub mod metadata;
pub mod record;
pub mod state;
pub mod timelock;

pub use error::*;
pub use event::*;
pub use identity::*;
pub use metadata::*;
pub use record::*;
pub use state::*;
pub use timelock::*;
