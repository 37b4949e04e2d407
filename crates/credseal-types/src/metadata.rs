//! Immutable notarization metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timelock::LockMetadata;

/// The immutable metadata of a notarization.
///
/// Set once by the constructor and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImmutableMetadata {
    /// Timestamp when the notarization was created
    pub created_at: DateTime<Utc>,
    /// Human-readable description of the notarization
    pub description: Option<String>,
    /// Optional time-based access restrictions
    pub locking: Option<LockMetadata>,
}

impl ImmutableMetadata {
    /// Creates the immutable metadata for a new record.
    pub fn new(
        created_at: DateTime<Utc>,
        description: Option<String>,
        locking: Option<LockMetadata>,
    ) -> Self {
        Self {
            created_at,
            description,
            locking,
        }
    }
}
