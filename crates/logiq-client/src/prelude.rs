//! # LogIQ Client Prelude
//!
//! Convenient re-exports of the most commonly used client types, together
//! with the message layer's prelude.
//!
//! ```rust
//! use logiq_client::prelude::*;
//! ```

// Core client types
pub use crate::client::{ClientStatistics, RpcClient, RpcClientBuilder};
pub use crate::config::{ClientConfig, DiagnosticsConfig, LoggingConfig};
pub use crate::error::{ClientError, ClientResult, TransportError};
pub use crate::handler::{ClientEvent, EventDispatcher};

// Transport types
pub use crate::transport::{Connection, ConnectionEvent, ConnectionState, MemoryConnection};

// Message types
pub use logiq_json_rpc::prelude::*;
