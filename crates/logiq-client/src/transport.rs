//! Connection contract for the LogIQ client
//!
//! The client does not own a network stack. Anything that can move UTF-8 text
//! frames in both directions (a WebSocket, a pipe, an in-process loopback)
//! implements [`Connection`] and reports what happens to it as
//! [`ConnectionEvent`]s on an unbounded channel.

use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;

use crate::error::TransportResult;

pub mod memory;

pub use memory::{MemoryConnection, MemoryPeer};

/// Lifecycle of a connection. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// Something that happened to a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The connection reached `Open`
    Opened,
    /// The connection reached `Closed`, initiated locally or by the remote end
    Closed {
        code: u16,
        reason: String,
        remote: bool,
    },
    /// A text frame arrived
    Message(String),
    /// A non-terminal failure. May be followed by `Closed`.
    Error(String),
}

/// Sending half of a connection's event channel
pub type EventSender = mpsc::UnboundedSender<ConnectionEvent>;

/// Receiving half of a connection's event channel
pub type EventReceiver = mpsc::UnboundedReceiver<ConnectionEvent>;

/// A bidirectional text connection
#[async_trait]
pub trait Connection: Send + Sync {
    /// Current lifecycle state
    fn state(&self) -> ConnectionState;

    /// Start the connection. Emits [`ConnectionEvent::Opened`] once open.
    async fn open(&mut self) -> TransportResult<()>;

    /// Send one text frame. Fails unless the connection is `Open`.
    async fn send_text(&mut self, payload: &str) -> TransportResult<()>;

    /// Close the connection. Emits [`ConnectionEvent::Closed`] with `remote == false`.
    async fn close(&mut self) -> TransportResult<()>;

    /// Take the event receiver. Only the first call succeeds.
    fn take_events(&mut self) -> TransportResult<EventReceiver>;

    /// Human-readable description of the remote end
    fn endpoint(&self) -> String {
        "unknown".to_string()
    }
}

/// Type alias for a boxed connection
pub type BoxedConnection = Box<dyn Connection>;
