//! Error types for LogIQ client operations

use logiq_json_rpc::{MessageError, clip};
use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type for connection operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Error type for client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection-level errors outside of a send
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Message construction or decoding errors
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    /// A payload could not be handed to the connection. Unsent payloads are not queued.
    #[error("Failed to send {preview}: {source}")]
    Send {
        preview: String,
        #[source]
        source: TransportError,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Connection-specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection is not open yet")]
    NotOpen,

    #[error("Connection closed")]
    Closed,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection events have already been taken")]
    EventsUnavailable,
}

impl ClientError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Wrap a failed send, keeping a short preview of the payload for diagnostics
    pub fn send_failed(payload: &str, preview_length: usize, source: TransportError) -> Self {
        Self::Send {
            preview: clip(payload, preview_length),
            source,
        }
    }

    /// The underlying connection error, if any
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(error) | Self::Send { source: error, .. } => Some(error),
            _ => None,
        }
    }

    /// Check if the connection has gone away for good
    pub fn is_closed(&self) -> bool {
        matches!(self.transport_error(), Some(TransportError::Closed))
    }
}
