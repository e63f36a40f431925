//! Configuration types for the LogIQ client

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Main client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Client identification information
    pub client_info: ClientInfo,

    /// Lengths used when rendering messages for diagnostics
    pub diagnostics: DiagnosticsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Client identification information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientInfo {
    /// Client name
    pub name: String,

    /// Client version
    pub version: String,
}

/// Clip lengths for log output. Wire payloads are never clipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Characters of request parameters shown in logs
    pub request_clip_length: usize,

    /// Characters of response results shown in logs
    pub response_clip_length: usize,

    /// Characters of a payload kept in a failed-send error
    pub send_preview_length: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether to log outgoing requests
    pub log_requests: bool,

    /// Whether to log incoming responses
    pub log_responses: bool,

    /// Whether to log connection lifecycle events
    pub log_transport: bool,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            name: "logiq-client".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            request_clip_length: 60,
            response_clip_length: 100_000,
            send_preview_length: 40,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_requests: true,
            log_responses: true,
            log_transport: false,
        }
    }
}

impl ClientConfig {
    /// Parse a configuration from JSON. Missing sections and fields take their defaults.
    pub fn from_json(text: &str) -> ClientResult<Self> {
        serde_json::from_str(text).map_err(|e| ClientError::config(e.to_string()))
    }
}
