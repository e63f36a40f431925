use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::JSONRPC_VERSION;
use crate::error::{ErrorObject, ErrorType, MessageError, MessageResult};
use crate::value::{self, JsonValue, NativeValue, ToWireValue};

/// Length `Display` clips the result to
pub const DEFAULT_DEBUG_LENGTH: usize = 100_000;

/// Outcome of a call: exactly one of a result or an error
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(NativeValue),
    Failure(ErrorObject),
}

/// A JSON-RPC response.
///
/// ```text
/// {"jsonrpc":"2.0","result":<result>,"id":<id>}
/// {"jsonrpc":"2.0","error":{"code":<code>,"message":<message>,"data":<data>},"id":<id>}
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    outcome: Outcome,
    id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl Response {
    pub fn success(result: impl Into<NativeValue>, id: i64) -> Self {
        Self::with_outcome(Outcome::Success(result.into()), Some(id))
    }

    pub fn failure(error_type: ErrorType, data: Option<NativeValue>, id: Option<i64>) -> Self {
        Self::from_error(ErrorObject::from_type(error_type, data), id)
    }

    /// Failure with an arbitrary error object, for server-defined codes
    pub fn from_error(error: ErrorObject, id: Option<i64>) -> Self {
        Self::with_outcome(Outcome::Failure(error), id)
    }

    fn with_outcome(outcome: Outcome, id: Option<i64>) -> Self {
        Self {
            outcome,
            id,
            created_at: Utc::now(),
        }
    }

    /// Decode a response from wire text.
    ///
    /// The text must hold a JSON object. A missing `result` and `error`
    /// decodes as a success carrying `null`.
    pub fn decode(text: &str) -> MessageResult<Self> {
        let mut fields: Map<String, Value> = serde_json::from_str(text)?;

        let id = match fields.remove("id") {
            None | Some(Value::Null) => None,
            Some(Value::Number(number)) => Some(value::integral(&number).ok_or_else(|| {
                MessageError::invalid("id", format!("{number} is not an integer"))
            })?),
            Some(other) => {
                return Err(MessageError::invalid(
                    "id",
                    format!("expected a number, found {other}"),
                ));
            }
        };

        let outcome = match (fields.remove("result"), fields.remove("error")) {
            (Some(result), Some(error)) if !result.is_null() && !error.is_null() => {
                return Err(MessageError::ConflictingFields("result", "error"));
            }
            (_, Some(error)) if !error.is_null() => Outcome::Failure(decode_error(error)?),
            (Some(result), _) => Outcome::Success(value::to_native(&result)),
            (None, _) => Outcome::Success(NativeValue::Null),
        };

        Ok(Self::with_outcome(outcome, id))
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Result of a successful call; `None` for failures
    pub fn result(&self) -> Option<&NativeValue> {
        match &self.outcome {
            Outcome::Success(result) => Some(result),
            Outcome::Failure(_) => None,
        }
    }

    /// Error of a failed call; `None` for successes
    pub fn error(&self) -> Option<&ErrorObject> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure(error) => Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn into_result(self) -> Result<NativeValue, ErrorObject> {
        match self.outcome {
            Outcome::Success(result) => Ok(result),
            Outcome::Failure(error) => Err(error),
        }
    }

    /// Compact JSON text of this response
    pub fn encode(&self) -> String {
        self.to_wire_value().to_string()
    }

    /// Indented, length-bounded rendering for logs. Not guaranteed to be valid JSON.
    pub fn to_debug_string(&self, max_length: usize) -> String {
        let id = self
            .id
            .map_or_else(|| "null".to_string(), |id| id.to_string());

        let mut s = String::from("{\n");
        s.push_str(&format!("  \"jsonrpc\": \"{JSONRPC_VERSION}\",\n"));
        match &self.outcome {
            Outcome::Success(result) => {
                s.push_str(&format!(
                    "  \"result\": {},\n",
                    clip(&value::encode(result), max_length)
                ));
            }
            Outcome::Failure(error) => {
                s.push_str("  \"error\": {\n");
                s.push_str(&format!("    \"code\": {},\n", error.code));
                s.push_str(&format!(
                    "    \"message\": {}",
                    value::encode(error.message.as_str())
                ));
                if let Some(data) = &error.data {
                    s.push_str(&format!(
                        ",\n    \"data\": {}",
                        clip(&value::encode(data), max_length)
                    ));
                }
                s.push_str("\n  },\n");
            }
        }
        s.push_str(&format!("  \"id\": {id}\n"));
        s.push('}');
        s
    }
}

fn decode_error(error: Value) -> MessageResult<ErrorObject> {
    let Value::Object(mut fields) = error else {
        return Err(MessageError::invalid(
            "error",
            format!("expected an object, found {error}"),
        ));
    };

    let code = match fields.remove("code") {
        None | Some(Value::Null) => return Err(MessageError::MissingField("error.code")),
        Some(Value::Number(number)) => value::integral(&number)
            .and_then(|code| i32::try_from(code).ok())
            .ok_or_else(|| {
                MessageError::invalid("error.code", format!("{number} is not a 32-bit integer"))
            })?,
        Some(other) => {
            return Err(MessageError::invalid(
                "error.code",
                format!("expected a number, found {other}"),
            ));
        }
    };

    let message = match fields.remove("message") {
        None | Some(Value::Null) => return Err(MessageError::MissingField("error.message")),
        Some(Value::String(message)) => message,
        Some(other) => {
            return Err(MessageError::invalid(
                "error.message",
                format!("expected a string, found {other}"),
            ));
        }
    };

    let data = match fields.remove("data") {
        None | Some(Value::Null) => None,
        Some(data) => Some(NativeValue::Raw(data)),
    };

    Ok(ErrorObject::new(code, message, data))
}

impl ToWireValue for Response {
    fn to_wire_value(&self) -> JsonValue {
        let mut object = Map::new();
        object.insert("jsonrpc".to_string(), Value::from(JSONRPC_VERSION));
        match &self.outcome {
            Outcome::Success(result) => {
                object.insert("result".to_string(), result.to_wire_value());
            }
            Outcome::Failure(error) => {
                let mut fields = Map::new();
                fields.insert("code".to_string(), Value::from(error.code));
                fields.insert("message".to_string(), Value::from(error.message.as_str()));
                if let Some(data) = &error.data {
                    fields.insert("data".to_string(), data.to_wire_value());
                }
                object.insert("error".to_string(), Value::Object(fields));
            }
        }
        object.insert("id".to_string(), self.id.map_or(Value::Null, Value::from));
        Value::Object(object)
    }
}

impl Serialize for Response {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_wire_value().serialize(serializer)
    }
}

/// Responses are equal when outcome and id match; creation time is ignored
impl PartialEq for Response {
    fn eq(&self, other: &Self) -> bool {
        self.outcome == other.outcome && self.id == other.id
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_debug_string(DEFAULT_DEBUG_LENGTH))
    }
}

/// Truncate `text` to `length` characters, noting how many were dropped.
///
/// ```rust
/// use logiq_json_rpc::clip;
///
/// assert_eq!(clip("abcdefghij", 4), "abcd... (6 more)");
/// assert_eq!(clip("short", 100), "short");
/// ```
pub fn clip(text: &str, length: usize) -> String {
    let total = text.chars().count();
    if total <= length {
        return text.to_string();
    }

    let kept: String = text.chars().take(length).collect();
    format!("{kept}... ({} more)", total - length)
}
