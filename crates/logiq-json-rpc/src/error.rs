use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::value::NativeValue;

/// Predefined JSON-RPC error types: the reserved protocol codes plus the
/// LogIQ application codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Invalid JSON was received
    ParseError,
    /// The JSON sent is not a valid request object
    InvalidRequest,
    /// The method does not exist or is not available
    MethodNotFound,
    /// Invalid method parameters
    InvalidParams,
    /// Internal JSON-RPC error
    InternalError,
    DatabaseError,
    InvalidLogin,
    /// Invalid JSON Well Log Format
    InvalidFormat,
    /// Incompatible JSON Well Log Format
    IncompatibleFormat,
    UnknownInstance,
    IllegalAccess,
}

impl ErrorType {
    pub const ALL: [ErrorType; 11] = [
        ErrorType::ParseError,
        ErrorType::InvalidRequest,
        ErrorType::MethodNotFound,
        ErrorType::InvalidParams,
        ErrorType::InternalError,
        ErrorType::DatabaseError,
        ErrorType::InvalidLogin,
        ErrorType::InvalidFormat,
        ErrorType::IncompatibleFormat,
        ErrorType::UnknownInstance,
        ErrorType::IllegalAccess,
    ];

    pub fn code(&self) -> i32 {
        match self {
            ErrorType::ParseError => -32700,
            ErrorType::InvalidRequest => -32600,
            ErrorType::MethodNotFound => -32601,
            ErrorType::InvalidParams => -32602,
            ErrorType::InternalError => -32603,
            ErrorType::DatabaseError => -32001,
            ErrorType::InvalidLogin => -32002,
            ErrorType::InvalidFormat => -32003,
            ErrorType::IncompatibleFormat => -32004,
            ErrorType::UnknownInstance => -32005,
            ErrorType::IllegalAccess => -32006,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorType::ParseError => "Parse error",
            ErrorType::InvalidRequest => "Invalid request",
            ErrorType::MethodNotFound => "Method not found",
            ErrorType::InvalidParams => "Invalid params",
            ErrorType::InternalError => "Internal error",
            ErrorType::DatabaseError => "LogIQ - Database error",
            ErrorType::InvalidLogin => "LogIQ - Invalid login",
            ErrorType::InvalidFormat => "LogIQ - Invalid format",
            ErrorType::IncompatibleFormat => "LogIQ - Incompatible format",
            ErrorType::UnknownInstance => "LogIQ - Unknown instance",
            ErrorType::IllegalAccess => "LogIQ - Illegal access",
        }
    }

    /// Find the error type with the given code. `None` for unknown codes.
    pub fn lookup(code: i32) -> Option<ErrorType> {
        Self::ALL.into_iter().find(|error_type| error_type.code() == code)
    }

    /// Whether the code lies in the range the JSON-RPC standard reserves for itself
    pub fn is_protocol_reserved(&self) -> bool {
        (-32768..=-32100).contains(&self.code())
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.message())
    }
}

/// The `error` member of a failed response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<NativeValue>,
}

impl ErrorObject {
    pub fn new(code: i32, message: impl Into<String>, data: Option<NativeValue>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    pub fn from_type(error_type: ErrorType, data: Option<NativeValue>) -> Self {
        Self::new(error_type.code(), error_type.message(), data)
    }

    /// The predefined error type matching this code, if any
    pub fn error_type(&self) -> Option<ErrorType> {
        ErrorType::lookup(self.code)
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

impl From<ErrorType> for ErrorObject {
    fn from(error_type: ErrorType) -> Self {
        Self::from_type(error_type, None)
    }
}

/// Result type for message construction and decoding
pub type MessageResult<T> = Result<T, MessageError>;

/// Errors raised while building or decoding messages
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Parse error: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Parse error: {0} must be present")]
    MissingField(&'static str),

    #[error("Parse error: invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Parse error: {0} and {1} are mutually exclusive")]
    ConflictingFields(&'static str, &'static str),

    #[error("Invalid request: method cannot be empty")]
    EmptyMethod,
}

impl MessageError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Whether this error came from decoding wire text
    pub fn is_parse_error(&self) -> bool {
        !matches!(self, MessageError::EmptyMethod)
    }

    /// Name of the field that caused the failure, if one is known
    pub fn field(&self) -> Option<&'static str> {
        match self {
            MessageError::MissingField(field) | MessageError::InvalidField { field, .. } => {
                Some(*field)
            }
            MessageError::ConflictingFields(first, _) => Some(*first),
            MessageError::Malformed(_) => None,
            MessageError::EmptyMethod => Some("method"),
        }
    }

    /// Error object a peer would report for this failure
    pub fn to_error_object(&self) -> ErrorObject {
        let error_type = match self {
            MessageError::Malformed(_) => ErrorType::ParseError,
            _ => ErrorType::InvalidRequest,
        };
        ErrorObject::from_type(error_type, Some(NativeValue::Text(self.to_string())))
    }
}
