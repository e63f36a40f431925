//! # LogIQ JSON-RPC Messages
//!
//! The message layer of the LogIQ client: a runtime-typed JSON value model and
//! the JSON-RPC 2.0 request and response envelopes built on it. This crate does
//! no I/O; transports live in `logiq-client`.
//!
//! ## Features
//! - Classification of arbitrary JSON into native values (`Int`, `Long`, `Double`, ...)
//! - Lossy-but-well-formed encoding: non-finite floats become `null`
//! - Process-wide or injected request id generation
//! - The JSON-RPC and LogIQ error taxonomy
//!
//! ```rust
//! use logiq_json_rpc::{params, NativeValue, Request, Response};
//!
//! let request = Request::with_id("getWells", params!["Troll"], 1).unwrap();
//! assert_eq!(
//!     request.encode(),
//!     r#"{"jsonrpc":"2.0","method":"getWells","params":["Troll"],"id":1}"#
//! );
//!
//! let response = Response::decode(r#"{"jsonrpc":"2.0","result":42,"id":1}"#).unwrap();
//! assert_eq!(response.result(), Some(&NativeValue::Int(42)));
//! ```

pub mod error;
pub mod id;
pub mod prelude;
pub mod request;
pub mod response;
pub mod value;

// Re-export main types
pub use error::{ErrorObject, ErrorType, MessageError, MessageResult};
pub use id::{AtomicIdGenerator, IdGenerator};
pub use request::Request;
pub use response::{Outcome, Response, clip};
pub use value::{JsonValue, NativeValue, TargetType, ToWireValue};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";
