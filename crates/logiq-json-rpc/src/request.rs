use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{MessageError, MessageResult};
use crate::id::{self, IdGenerator};
use crate::response::clip;
use crate::value::{self, JsonValue, NativeValue, ToWireValue};
use crate::JSONRPC_VERSION;

/// Length `Display` clips the parameter list to
pub const DEFAULT_DEBUG_LENGTH: usize = 60;

/// A JSON-RPC request.
///
/// ```text
/// {"jsonrpc":"2.0","method":<method>,"params":[<p1>,<p2>,...],"id":<id>}
/// ```
///
/// `params` is left out of the wire form when there are no parameters.
#[derive(Debug, Clone)]
pub struct Request {
    method: String,
    params: Vec<NativeValue>,
    id: i64,
    created_at: DateTime<Utc>,
}

impl Request {
    /// Create a request whose id is controlled by the caller
    pub fn with_id(
        method: impl Into<String>,
        params: Vec<NativeValue>,
        id: i64,
    ) -> MessageResult<Self> {
        let method = method.into();
        if method.is_empty() {
            return Err(MessageError::EmptyMethod);
        }

        Ok(Self {
            method,
            params,
            id,
            created_at: Utc::now(),
        })
    }

    /// Create a request with the next id from the process-wide generator
    pub fn new(method: impl Into<String>, params: Vec<NativeValue>) -> MessageResult<Self> {
        Self::with_generator(method, params, id::global())
    }

    /// Create a request with the next id from the given generator
    pub fn with_generator(
        method: impl Into<String>,
        params: Vec<NativeValue>,
        ids: &dyn IdGenerator,
    ) -> MessageResult<Self> {
        let method = method.into();
        if method.is_empty() {
            return Err(MessageError::EmptyMethod);
        }
        Self::with_id(method, params, ids.next_id())
    }

    /// Decode a request from wire text.
    ///
    /// The text must hold a JSON object. `method` and `id` are mandatory; each
    /// element of `params` is classified and converted independently.
    pub fn decode(text: &str) -> MessageResult<Self> {
        let mut fields: Map<String, Value> = serde_json::from_str(text)?;

        let method = match fields.remove("method") {
            None | Some(Value::Null) => return Err(MessageError::MissingField("method")),
            Some(Value::String(method)) if method.is_empty() => {
                return Err(MessageError::invalid("method", "must not be empty"));
            }
            Some(Value::String(method)) => method,
            Some(other) => {
                return Err(MessageError::invalid(
                    "method",
                    format!("expected a string, found {other}"),
                ));
            }
        };

        let params = match fields.remove("params") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(value::to_native).collect(),
            Some(other) => {
                return Err(MessageError::invalid(
                    "params",
                    format!("expected an array, found {other}"),
                ));
            }
        };

        let id = match fields.remove("id") {
            None | Some(Value::Null) => return Err(MessageError::MissingField("id")),
            Some(Value::Number(number)) => value::integral(&number)
                .ok_or_else(|| MessageError::invalid("id", format!("{number} is not an integer")))?,
            Some(other) => {
                return Err(MessageError::invalid(
                    "id",
                    format!("expected a number, found {other}"),
                ));
            }
        };

        Self::with_id(method, params, id)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &[NativeValue] {
        &self.params
    }

    /// Parameter at the given position, if present
    pub fn param(&self, index: usize) -> Option<&NativeValue> {
        self.params.get(index)
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Time the request was created, either built locally or decoded
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Compact JSON text of this request
    pub fn encode(&self) -> String {
        self.to_wire_value().to_string()
    }

    /// Indented, length-bounded rendering for logs. Not guaranteed to be valid JSON.
    pub fn to_debug_string(&self, max_length: usize) -> String {
        let mut s = String::from("{\n");
        s.push_str(&format!("  \"jsonrpc\": \"{JSONRPC_VERSION}\",\n"));
        s.push_str(&format!("  \"method\": {},\n", value::encode(self.method.as_str())));
        if !self.params.is_empty() {
            let params = self
                .params
                .iter()
                .map(value::encode)
                .collect::<Vec<_>>()
                .join(",");
            s.push_str(&format!("  \"params\": [{}],\n", clip(&params, max_length)));
        }
        s.push_str(&format!("  \"id\": {}\n", self.id));
        s.push('}');
        s
    }
}

impl ToWireValue for Request {
    fn to_wire_value(&self) -> JsonValue {
        let mut object = Map::new();
        object.insert("jsonrpc".to_string(), Value::from(JSONRPC_VERSION));
        object.insert("method".to_string(), Value::from(self.method.as_str()));
        if !self.params.is_empty() {
            object.insert("params".to_string(), self.params.to_wire_value());
        }
        object.insert("id".to_string(), Value::from(self.id));
        Value::Object(object)
    }
}

impl Serialize for Request {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_wire_value().serialize(serializer)
    }
}

/// Requests are equal when method, params and id match; creation time is ignored
impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.params == other.params && self.id == other.id
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_debug_string(DEFAULT_DEBUG_LENGTH))
    }
}

/// Build a `Vec<NativeValue>` from heterogeneous values
///
/// ```rust
/// use logiq_json_rpc::{params, Request};
///
/// let request = Request::with_id("getCurve", params!["GR", 1024, true], 7).unwrap();
/// assert_eq!(request.params().len(), 3);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::NativeValue>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::NativeValue::from($value)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use crate::id::AtomicIdGenerator;
    use crate::params;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = Request::with_id("subtract", params![42, 23], 1).unwrap();
        let expected = r#"{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":1}"#;
        assert_eq!(request.encode(), expected);
        assert_eq!(serde_json::to_string(&request).unwrap(), expected);
    }

    #[test]
    fn test_empty_params_are_omitted() {
        let request = Request::with_id("ping", params![], 3).unwrap();
        assert_eq!(request.encode(), r#"{"jsonrpc":"2.0","method":"ping","id":3}"#);
        assert!(!request.encode().contains("params"));
    }

    #[test]
    fn test_single_string_param() {
        let request = Request::with_id("open", params!["x"], 9).unwrap();
        assert!(request.encode().contains(r#""params":["x"]"#));
    }

    #[test]
    fn test_method_is_escaped() {
        let request = Request::with_id("say \"hi\"", params![], 1).unwrap();
        let decoded = Request::decode(&request.encode()).unwrap();
        assert_eq!(decoded.method(), "say \"hi\"");
    }

    #[test]
    fn test_empty_method_rejected() {
        assert!(matches!(
            Request::with_id("", params![], 1),
            Err(MessageError::EmptyMethod)
        ));
        assert!(Request::new("", params![]).is_err());
    }

    #[test]
    fn test_injected_generator() {
        let ids = AtomicIdGenerator::starting_at(100);
        let first = Request::with_generator("a", params![], &ids).unwrap();
        let second = Request::with_generator("b", params![], &ids).unwrap();
        assert_eq!(first.id(), 100);
        assert_eq!(second.id(), 101);
    }

    #[test]
    fn test_auto_ids_increase() {
        let first = Request::new("a", params![]).unwrap();
        let second = Request::new("a", params![]).unwrap();
        assert!(second.id() > first.id());
    }

    #[test]
    fn test_decode_converts_params() {
        let text = r#"{"jsonrpc":"2.0","method":"m","params":["s",1,5000000000,2.5,true,null,[1],{"k":"v"}],"id":12}"#;
        let request = Request::decode(text).unwrap();

        assert_eq!(request.method(), "m");
        assert_eq!(request.id(), 12);
        assert_eq!(
            request.params(),
            &[
                NativeValue::Text("s".to_string()),
                NativeValue::Int(1),
                NativeValue::Long(5_000_000_000),
                NativeValue::Double(2.5),
                NativeValue::Bool(true),
                NativeValue::Null,
                NativeValue::List(vec![NativeValue::Int(1)]),
                NativeValue::Raw(json!({"k": "v"})),
            ]
        );
        assert_eq!(request.param(0).and_then(NativeValue::as_str), Some("s"));
        assert!(request.param(8).is_none());
    }

    #[test]
    fn test_decode_missing_fields() {
        let error = Request::decode(r#"{"jsonrpc":"2.0","id":1}"#).unwrap_err();
        assert!(matches!(error, MessageError::MissingField("method")));
        assert!(error.to_string().contains("method"));

        let error = Request::decode(r#"{"jsonrpc":"2.0","method":"m"}"#).unwrap_err();
        assert!(matches!(error, MessageError::MissingField("id")));
        assert!(error.to_string().contains("id"));

        let error = Request::decode(r#"{"jsonrpc":"2.0","method":"m","id":null}"#).unwrap_err();
        assert_eq!(error.field(), Some("id"));
    }

    #[test]
    fn test_decode_invalid_input() {
        assert!(matches!(
            Request::decode("{not json"),
            Err(MessageError::Malformed(_))
        ));
        for text in ["[1,2]", r#"["getWells",["Troll"],5]"#, "[]", r#""x""#, "42", "null"] {
            let error = Request::decode(text).unwrap_err();
            assert!(matches!(error, MessageError::Malformed(_)), "{text}: {error:?}");
            assert_eq!(error.to_error_object().code, ErrorType::ParseError.code());
        }
        assert_eq!(
            Request::decode(r#"{"method":7,"id":1}"#).unwrap_err().field(),
            Some("method")
        );
        assert_eq!(
            Request::decode(r#"{"method":"m","params":{"a":1},"id":1}"#)
                .unwrap_err()
                .field(),
            Some("params")
        );
        assert_eq!(
            Request::decode(r#"{"method":"m","id":"abc"}"#).unwrap_err().field(),
            Some("id")
        );
        assert_eq!(
            Request::decode(r#"{"method":"m","id":1.5}"#).unwrap_err().field(),
            Some("id")
        );
    }

    #[test]
    fn test_round_trip() {
        let request = Request::with_id("query", params!["well-1", 3, false], 77).unwrap();
        let decoded = Request::decode(&request.encode()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_debug_string() {
        let request = Request::with_id("load", params!["abcdefghijklmnopqrstuvwxyz"], 4).unwrap();
        let debug = request.to_debug_string(5);
        assert!(debug.starts_with("{\n  \"jsonrpc\": \"2.0\",\n"));
        assert!(debug.contains("  \"method\": \"load\",\n"));
        assert!(debug.contains("\"params\": [\"abcd... (24 more)],"));
        assert!(debug.ends_with("  \"id\": 4\n}"));

        let short = Request::with_id("ping", params![], 5).unwrap();
        assert!(!short.to_string().contains("params"));
    }
}
