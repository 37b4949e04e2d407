//! CredSeal Engine - Record lifecycle engine for time-lock-governed notarizations
//!
//! The engine issues and manages tamper-evident, timestamped records whose
//! mutability and destructibility are governed by explicit time-based locks.
//! It is the trust primitive underneath a credential wallet: credentials are
//! serialized into a record's state so that their existence, content, and
//! issuance time can later be proven.
//!
//! # Architecture
//!
//! ```text
//! caller ──► NotarizationBuilder ──► NotarizationEngine ──► NotarizationStore
//!                                          │
//!                                          ├── Clock (injected)
//!                                          └── broadcast::Sender<NotarizationEvent>
//! ```
//!
//! Two record methods exist: **Dynamic** records are updatable and
//! optionally transfer-locked; **Locked** records are immutable, can never
//! be transferred, and are destroyable only once their delete lock permits.

pub mod builder;
pub mod clock;
pub mod engine;
pub mod store;

pub use builder::{CreateDynamic, CreateLocked, Dynamic, Locked, NotarizationBuilder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::NotarizationEngine;
pub use store::{MemoryStore, NotarizationStore};

// Re-export the domain types callers need alongside the engine.
pub use credseal_types::{
    Data, ImmutableMetadata, LockMetadata, Notarization, NotarizationError, NotarizationEvent,
    NotarizationId, NotarizationMethod, PrincipalId, Result, State, TimeLock,
};
