//! # LogIQ JSON-RPC Prelude
//!
//! Convenient re-exports of the most commonly used message types.
//!
//! ```rust
//! use logiq_json_rpc::prelude::*;
//! ```

pub use crate::error::{ErrorObject, ErrorType, MessageError, MessageResult};
pub use crate::id::{AtomicIdGenerator, IdGenerator};
pub use crate::params;
pub use crate::request::Request;
pub use crate::response::{Outcome, Response};
pub use crate::value::{JsonValue, NativeValue, TargetType, ToWireValue};
