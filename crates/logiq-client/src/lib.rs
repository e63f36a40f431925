//! # LogIQ Client Library
//!
//! Connects the LogIQ JSON-RPC message layer to a bidirectional text
//! connection. The crate defines the [`Connection`] contract and translates
//! what a connection reports into requests sent and responses received; it
//! does not implement a network transport itself.
//!
//! ## Features
//!
//! - **Connection contract**: `open`, `send_text`, `close` and an event channel
//! - **Pull or push**: read events with [`RpcClient::next_event`] or register
//!   callbacks on an [`EventDispatcher`] and call [`RpcClient::start`]
//! - **Loopback**: [`MemoryConnection`] for tests and demos
//!
//! ## Quick Start
//!
//! ```rust
//! use logiq_client::{ClientEvent, MemoryConnection, RpcClientBuilder};
//! use logiq_json_rpc::{params, Response};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (connection, mut peer) = MemoryConnection::pair();
//! let client = RpcClientBuilder::new()
//!     .with_connection(Box::new(connection))
//!     .build()?;
//!
//! client.open().await?;
//! let id = client.call("getWells", params!["Troll"]).await?;
//!
//! let _request = peer.recv_text().await;
//! peer.deliver(Response::success(3, id).encode())?;
//!
//! while let Some(event) = client.next_event().await {
//!     if let ClientEvent::Response(response) = event {
//!         assert_eq!(response.id(), Some(id));
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod prelude;
pub mod transport;

// Re-export main types
pub use client::{ClientStatistics, RpcClient, RpcClientBuilder};
pub use config::{ClientConfig, ClientInfo, DiagnosticsConfig, LoggingConfig};
pub use error::{ClientError, ClientResult, TransportError, TransportResult};
pub use handler::{ClientEvent, EventDispatcher};

// Re-export transport types
pub use transport::{
    BoxedConnection, Connection, ConnectionEvent, ConnectionState, MemoryConnection, MemoryPeer,
};
