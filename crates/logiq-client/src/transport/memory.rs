//! In-process loopback connection
//!
//! [`MemoryConnection::pair`] returns the client side of a connection and a
//! [`MemoryPeer`] that plays the remote end: it reads what the client sent and
//! injects messages, errors and closes.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use super::{Connection, ConnectionEvent, ConnectionState, EventReceiver, EventSender};
use crate::error::{TransportError, TransportResult};

/// Close code for a normal closure
pub const NORMAL_CLOSURE: u16 = 1000;

/// Client side of an in-memory connection
#[derive(Debug)]
pub struct MemoryConnection {
    state: Arc<Mutex<ConnectionState>>,
    events: EventSender,
    receiver: Option<EventReceiver>,
    outbound: mpsc::UnboundedSender<String>,
}

/// Remote side of an in-memory connection
#[derive(Debug)]
pub struct MemoryPeer {
    state: Arc<Mutex<ConnectionState>>,
    events: EventSender,
    inbound: mpsc::UnboundedReceiver<String>,
}

impl MemoryConnection {
    /// Create a connected pair in the `Connecting` state
    pub fn pair() -> (MemoryConnection, MemoryPeer) {
        let state = Arc::new(Mutex::new(ConnectionState::Connecting));
        let (events, receiver) = mpsc::unbounded_channel();
        let (outbound, inbound) = mpsc::unbounded_channel();

        let connection = MemoryConnection {
            state: Arc::clone(&state),
            events: events.clone(),
            receiver: Some(receiver),
            outbound,
        };
        let peer = MemoryPeer {
            state,
            events,
            inbound,
        };

        (connection, peer)
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    async fn open(&mut self) -> TransportResult<()> {
        {
            let mut state = self.state.lock();
            match *state {
                ConnectionState::Open => return Ok(()),
                ConnectionState::Closed => return Err(TransportError::Closed),
                ConnectionState::Connecting => *state = ConnectionState::Open,
            }
        }

        debug!("Memory connection opened");
        let _ = self.events.send(ConnectionEvent::Opened);
        Ok(())
    }

    async fn send_text(&mut self, payload: &str) -> TransportResult<()> {
        match self.state() {
            ConnectionState::Open => {}
            ConnectionState::Connecting => return Err(TransportError::NotOpen),
            ConnectionState::Closed => return Err(TransportError::Closed),
        }

        self.outbound
            .send(payload.to_string())
            .map_err(|_| TransportError::ConnectionFailed("peer dropped".to_string()))
    }

    async fn close(&mut self) -> TransportResult<()> {
        {
            let mut state = self.state.lock();
            if state.is_closed() {
                return Ok(());
            }
            *state = ConnectionState::Closed;
        }

        debug!("Memory connection closed locally");
        let _ = self.events.send(ConnectionEvent::Closed {
            code: NORMAL_CLOSURE,
            reason: "normal closure".to_string(),
            remote: false,
        });
        Ok(())
    }

    fn take_events(&mut self) -> TransportResult<EventReceiver> {
        self.receiver.take().ok_or(TransportError::EventsUnavailable)
    }

    fn endpoint(&self) -> String {
        "memory".to_string()
    }
}

impl MemoryPeer {
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Next text frame the client sent, or `None` once the client side is gone
    pub async fn recv_text(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    /// Next text frame the client sent, without waiting
    pub fn try_recv_text(&mut self) -> Option<String> {
        self.inbound.try_recv().ok()
    }

    /// Deliver a text frame to the client. Fails unless the connection is `Open`.
    pub fn deliver(&self, text: impl Into<String>) -> TransportResult<()> {
        match self.state() {
            ConnectionState::Open => {}
            ConnectionState::Connecting => return Err(TransportError::NotOpen),
            ConnectionState::Closed => return Err(TransportError::Closed),
        }

        self.events
            .send(ConnectionEvent::Message(text.into()))
            .map_err(|_| TransportError::ConnectionFailed("client dropped".to_string()))
    }

    /// Report a non-terminal failure to the client
    pub fn fail(&self, description: impl Into<String>) {
        let _ = self.events.send(ConnectionEvent::Error(description.into()));
    }

    /// Close the connection from the remote end
    pub fn close(&self, code: u16, reason: impl Into<String>) {
        {
            let mut state = self.state.lock();
            if state.is_closed() {
                return;
            }
            *state = ConnectionState::Closed;
        }

        let _ = self.events.send(ConnectionEvent::Closed {
            code,
            reason: reason.into(),
            remote: true,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_lifecycle_events() {
        let (mut connection, peer) = MemoryConnection::pair();
        let mut events = connection.take_events().unwrap();

        assert_eq!(connection.state(), ConnectionState::Connecting);
        assert_ok!(connection.open().await);
        assert_eq!(peer.state(), ConnectionState::Open);

        peer.deliver("hello").unwrap();
        peer.fail("flaky");
        assert_ok!(connection.close().await);

        assert_eq!(events.recv().await, Some(ConnectionEvent::Opened));
        assert_eq!(
            events.recv().await,
            Some(ConnectionEvent::Message("hello".to_string()))
        );
        assert_eq!(
            events.recv().await,
            Some(ConnectionEvent::Error("flaky".to_string()))
        );
        assert_eq!(
            events.recv().await,
            Some(ConnectionEvent::Closed {
                code: NORMAL_CLOSURE,
                reason: "normal closure".to_string(),
                remote: false,
            })
        );
    }

    #[tokio::test]
    async fn test_send_requires_open() {
        let (mut connection, mut peer) = MemoryConnection::pair();

        assert_eq!(
            connection.send_text("early").await,
            Err(TransportError::NotOpen)
        );

        connection.open().await.unwrap();
        assert_ok!(connection.send_text("one").await);
        assert_eq!(peer.recv_text().await.as_deref(), Some("one"));

        peer.close(4000, "server shutdown");
        assert_eq!(
            connection.send_text("late").await,
            Err(TransportError::Closed)
        );
        assert!(peer.try_recv_text().is_none());
        assert_err!(connection.open().await);
    }

    #[tokio::test]
    async fn test_remote_close_is_reported_once() {
        let (mut connection, peer) = MemoryConnection::pair();
        let mut events = connection.take_events().unwrap();
        connection.open().await.unwrap();

        peer.close(4000, "bye");
        peer.close(4001, "again");
        assert_ok!(connection.close().await);
        drop(connection);
        drop(peer);

        let mut closes = Vec::new();
        while let Some(event) = events.recv().await {
            if let ConnectionEvent::Closed { code, remote, .. } = event {
                closes.push((code, remote));
            }
        }
        assert_eq!(closes, vec![(4000, true)]);
    }

    #[test]
    fn test_events_taken_once() {
        let (mut connection, _peer) = MemoryConnection::pair();
        assert!(connection.take_events().is_ok());
        assert_eq!(
            connection.take_events().err(),
            Some(TransportError::EventsUnavailable)
        );
    }

    #[test]
    fn test_deliver_before_open() {
        let (_connection, peer) = MemoryConnection::pair();
        assert_eq!(peer.deliver("x"), Err(TransportError::NotOpen));
    }
}
