//! Lifecycle events for notarizations
//!
//! Every successful mutating operation emits exactly one event. Events are
//! a side-channel notification for indexers and UIs; they are never
//! persisted alongside the record and the engine does not retry or replay
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{NotarizationId, PrincipalId};
use crate::record::NotarizationMethod;
use crate::state::State;

/// Events emitted by the notarization engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotarizationEvent {
    /// A new notarization was created
    Created {
        notarization_id: NotarizationId,
        method: NotarizationMethod,
        owner: PrincipalId,
        timestamp: DateTime<Utc>,
    },

    /// The state of a notarization was replaced
    Updated {
        notarization_id: NotarizationId,
        new_state: State,
        version: u64,
        timestamp: DateTime<Utc>,
    },

    /// The updatable metadata of a notarization was replaced or cleared
    MetadataUpdated {
        notarization_id: NotarizationId,
        updatable_metadata: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Ownership of a notarization changed
    Transferred {
        notarization_id: NotarizationId,
        from: PrincipalId,
        to: PrincipalId,
        timestamp: DateTime<Utc>,
    },

    /// A notarization was irrecoverably removed
    Destroyed {
        notarization_id: NotarizationId,
        timestamp: DateTime<Utc>,
    },
}

impl NotarizationEvent {
    /// Get the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            NotarizationEvent::Created { timestamp, .. } => *timestamp,
            NotarizationEvent::Updated { timestamp, .. } => *timestamp,
            NotarizationEvent::MetadataUpdated { timestamp, .. } => *timestamp,
            NotarizationEvent::Transferred { timestamp, .. } => *timestamp,
            NotarizationEvent::Destroyed { timestamp, .. } => *timestamp,
        }
    }

    /// The record the event concerns
    pub fn notarization_id(&self) -> &NotarizationId {
        match self {
            NotarizationEvent::Created { notarization_id, .. } => notarization_id,
            NotarizationEvent::Updated { notarization_id, .. } => notarization_id,
            NotarizationEvent::MetadataUpdated { notarization_id, .. } => notarization_id,
            NotarizationEvent::Transferred { notarization_id, .. } => notarization_id,
            NotarizationEvent::Destroyed { notarization_id, .. } => notarization_id,
        }
    }

    /// Get a short description for logging
    pub fn summary(&self) -> String {
        match self {
            NotarizationEvent::Created { notarization_id, method, .. } => {
                format!("Created {:?} notarization {}", method, notarization_id)
            }
            NotarizationEvent::Updated { notarization_id, version, .. } => {
                format!("Updated {} to version {}", notarization_id, version)
            }
            NotarizationEvent::MetadataUpdated { notarization_id, .. } => {
                format!("Metadata updated on {}", notarization_id)
            }
            NotarizationEvent::Transferred { notarization_id, from, to, .. } => {
                format!("Transferred {}: {} -> {}", notarization_id, from, to)
            }
            NotarizationEvent::Destroyed { notarization_id, .. } => {
                format!("Destroyed {}", notarization_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = NotarizationEvent::Created {
            notarization_id: NotarizationId::new(),
            method: NotarizationMethod::Locked,
            owner: PrincipalId::new(),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Created\""));

        let back: NotarizationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_event_summary() {
        let id = NotarizationId::new();
        let event = NotarizationEvent::Updated {
            notarization_id: id.clone(),
            new_state: State::from_string("v2", None),
            version: 2,
            timestamp: Utc::now(),
        };
        let summary = event.summary();
        assert!(summary.contains("version 2"));
        assert_eq!(event.notarization_id(), &id);
    }

    #[test]
    fn test_transfer_summary_is_ascii() {
        let from = PrincipalId::new();
        let to = PrincipalId::new();
        let event = NotarizationEvent::Transferred {
            notarization_id: NotarizationId::new(),
            from: from.clone(),
            to: to.clone(),
            timestamp: Utc::now(),
        };
        let summary = event.summary();
        assert!(summary.contains(&format!("{} -> {}", from, to)));
        assert!(summary.is_ascii());
    }
}
