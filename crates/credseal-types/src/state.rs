//! Notarization state
//!
//! The state is the payload being attested: raw bytes or UTF-8 text, plus
//! optional free-text metadata scoped to this particular state. State is
//! replaced wholesale on every update; partial field updates do not exist.

use serde::{Deserialize, Serialize};

use crate::error::{NotarizationError, Result};

/// The payload of a notarization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Data {
    /// Raw binary data (e.g., files, serialized credentials, hashes)
    Bytes(Vec<u8>),
    /// UTF-8 text data (e.g., documents, JSON)
    Text(String),
}

impl Data {
    /// Extracts the payload as bytes, failing for text payloads.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Data::Bytes(data) => Ok(data),
            Data::Text(_) => Err(NotarizationError::DataFormat { expected: "bytes" }),
        }
    }

    /// Extracts the payload as text, failing for byte payloads.
    pub fn as_text(&self) -> Result<&str> {
        match self {
            Data::Text(data) => Ok(data),
            Data::Bytes(_) => Err(NotarizationError::DataFormat { expected: "text" }),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Data::Bytes(data) => data.len(),
            Data::Text(data) => data.len(),
        }
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The state of a notarization: the data being attested plus optional
/// state-scoped metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State<T = Data> {
    /// The actual data being notarized
    pub data: T,
    /// Optional metadata describing this particular state
    #[serde(default)]
    pub metadata: Option<String>,
}

impl State {
    /// Creates a new state from raw bytes.
    pub fn from_bytes(data: Vec<u8>, metadata: Option<String>) -> Self {
        Self {
            data: Data::Bytes(data),
            metadata,
        }
    }

    /// Creates a new state from a string.
    pub fn from_string(data: impl Into<String>, metadata: Option<String>) -> Self {
        Self {
            data: Data::Text(data.into()),
            metadata,
        }
    }
}

impl<T> State<T> {
    /// Returns a reference to the data.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Returns the state-scoped metadata.
    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }
}
