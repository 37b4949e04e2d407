//! Error types for CredSeal
//!
//! All errors are explicit and synchronous. The engine never retries a
//! failed operation on its own; lock errors carry the concrete unlock
//! instant (where one exists) so callers can decide to wait or abandon.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::identity::{NotarizationId, PrincipalId};

/// Result type for CredSeal operations
pub type Result<T> = std::result::Result<T, NotarizationError>;

/// CredSeal error types
#[derive(Debug, Clone, Error)]
pub enum NotarizationError {
    // ========================================================================
    // Lock Configuration Errors
    // ========================================================================

    /// A lock could not be constructed or violates a cross-lock constraint
    #[error("Invalid lock: {reason}")]
    InvalidLock { reason: String },

    // ========================================================================
    // Lock Gate Errors
    // ========================================================================

    /// The record's update lock still blocks state/metadata updates
    #[error("Notarization {notarization_id} is update-locked{}", display_until(.unlocks_at))]
    UpdateLocked {
        notarization_id: NotarizationId,
        /// Set for `UnlockAt` locks; `None` means locked until destroyed
        unlocks_at: Option<DateTime<Utc>>,
    },

    /// The record's transfer lock still blocks ownership changes
    #[error("Notarization {notarization_id} is transfer-locked{}", display_until(.unlocks_at))]
    TransferLocked {
        notarization_id: NotarizationId,
        unlocks_at: Option<DateTime<Utc>>,
    },

    /// A time-based lock still blocks destruction of the record
    #[error("Notarization {notarization_id} is destroy-locked{}", display_until(.unlocks_at))]
    DestroyLocked {
        notarization_id: NotarizationId,
        unlocks_at: Option<DateTime<Utc>>,
    },

    /// A lock being finalized at destroy time has not expired yet
    #[error("Lock has not expired, unlocks at {unlocks_at}")]
    LockNotExpired { unlocks_at: DateTime<Utc> },

    // ========================================================================
    // Record Errors
    // ========================================================================

    /// A constructed record does not satisfy its method's fixed lock shape.
    /// Unreachable outside the constructors; signals a programming error.
    #[error("Notarization {notarization_id} violates its method invariant: {detail}")]
    MethodInvariantViolation {
        notarization_id: NotarizationId,
        detail: String,
    },

    /// Record not found (or already destroyed)
    #[error("Notarization {notarization_id} not found")]
    NotFound { notarization_id: NotarizationId },

    /// Caller is not the record's owner
    #[error("Principal {caller} does not own notarization {notarization_id}")]
    NotOwner {
        notarization_id: NotarizationId,
        caller: PrincipalId,
    },

    // ========================================================================
    // Data & Infrastructure Errors
    // ========================================================================

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// State data is not of the requested format
    #[error("State data is not {expected}")]
    DataFormat { expected: &'static str },

    /// State payload could not be decoded into the requested type
    #[error("Failed to decode state payload: {0}")]
    StateDecoding(String),

    /// Store backend error
    #[error("Store error: {0}")]
    Store(String),
}

fn display_until(unlocks_at: &Option<DateTime<Utc>>) -> String {
    match unlocks_at {
        Some(at) => format!(" until {at}"),
        None => " until destroyed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_lock_error_messages() {
        let id = NotarizationId::new();
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

        let timed = NotarizationError::UpdateLocked {
            notarization_id: id.clone(),
            unlocks_at: Some(at),
        };
        assert!(timed.to_string().contains("until 2030-01-01"));

        let indefinite = NotarizationError::TransferLocked {
            notarization_id: id,
            unlocks_at: None,
        };
        assert!(indefinite.to_string().contains("until destroyed"));
    }

    #[test]
    fn test_not_owner_message() {
        let err = NotarizationError::NotOwner {
            notarization_id: NotarizationId::new(),
            caller: PrincipalId::new(),
        };
        assert!(err.to_string().contains("does not own"));
    }
}
