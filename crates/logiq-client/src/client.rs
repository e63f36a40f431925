//! LogIQ JSON-RPC client over a [`Connection`]

use logiq_json_rpc::{IdGenerator, MessageResult, NativeValue, Request, Response, clip, id};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, DiagnosticsConfig, LoggingConfig};
use crate::error::{ClientError, ClientResult, TransportError};
use crate::handler::{ClientEvent, EventDispatcher};
use crate::transport::{BoxedConnection, ConnectionEvent, ConnectionState, EventReceiver};

/// Counters for traffic through one client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientStatistics {
    /// Requests handed to the connection
    pub requests_sent: u64,
    /// Incoming messages decoded into responses
    pub responses_received: u64,
    /// Incoming messages that failed to decode
    pub decode_failures: u64,
    /// Failed sends plus error events reported by the connection
    pub transport_errors: u64,
}

/// Client that encodes requests onto a connection and decodes what comes back.
///
/// Outstanding requests are not tracked; match [`Response::id`] against the id
/// returned by [`RpcClient::call`].
pub struct RpcClient {
    /// Underlying connection
    connection: Arc<tokio::sync::Mutex<BoxedConnection>>,
    /// Event receiver until handed to [`RpcClient::start`]
    events: tokio::sync::Mutex<Option<EventReceiver>>,
    /// Source of request ids
    ids: Arc<dyn IdGenerator>,
    /// Configuration
    config: ClientConfig,
    /// Shared with the event translator
    statistics: Arc<Mutex<ClientStatistics>>,
    endpoint: String,
}

/// Turns connection events into client events, logging and counting as it goes
#[derive(Clone)]
struct EventTranslator {
    diagnostics: DiagnosticsConfig,
    logging: LoggingConfig,
    statistics: Arc<Mutex<ClientStatistics>>,
}

impl EventTranslator {
    fn translate(&self, event: ConnectionEvent) -> ClientEvent {
        match event {
            ConnectionEvent::Opened => {
                if self.logging.log_transport {
                    info!("Connection opened");
                }
                ClientEvent::Opened
            }
            ConnectionEvent::Closed {
                code,
                reason,
                remote,
            } => {
                if self.logging.log_transport {
                    info!(code, reason = %reason, remote, "Connection closed");
                }
                ClientEvent::Closed {
                    code,
                    reason,
                    remote,
                }
            }
            ConnectionEvent::Message(payload) => match Response::decode(&payload) {
                Ok(response) => {
                    self.statistics.lock().responses_received += 1;
                    if self.logging.log_responses {
                        debug!(
                            id = ?response.id(),
                            success = response.is_success(),
                            response = %response.to_debug_string(self.diagnostics.response_clip_length),
                            "Received response"
                        );
                    }
                    ClientEvent::Response(response)
                }
                Err(error) => {
                    self.statistics.lock().decode_failures += 1;
                    warn!(
                        error = %error,
                        payload = %clip(&payload, self.diagnostics.response_clip_length),
                        "Failed to decode incoming message"
                    );
                    ClientEvent::DecodeFailed { payload, error }
                }
            },
            ConnectionEvent::Error(description) => {
                self.statistics.lock().transport_errors += 1;
                warn!(error = %description, "Connection error");
                ClientEvent::Error(description)
            }
        }
    }
}

impl RpcClient {
    /// Create a client over the given connection, taking its event receiver
    pub fn new(connection: BoxedConnection, config: ClientConfig) -> ClientResult<Self> {
        Self::with_id_generator(connection, config, Arc::new(id::global()))
    }

    /// Create a client that draws request ids from `ids`
    pub fn with_id_generator(
        mut connection: BoxedConnection,
        config: ClientConfig,
        ids: Arc<dyn IdGenerator>,
    ) -> ClientResult<Self> {
        let events = connection.take_events()?;
        let endpoint = connection.endpoint();

        Ok(Self {
            connection: Arc::new(tokio::sync::Mutex::new(connection)),
            events: tokio::sync::Mutex::new(Some(events)),
            ids,
            config,
            statistics: Arc::new(Mutex::new(ClientStatistics::default())),
            endpoint,
        })
    }

    /// Open the underlying connection
    pub async fn open(&self) -> ClientResult<()> {
        info!(
            endpoint = %self.endpoint,
            client = %self.config.client_info.name,
            version = %self.config.client_info.version,
            "Opening connection"
        );
        self.connection.lock().await.open().await?;
        Ok(())
    }

    /// Close the underlying connection
    pub async fn close(&self) -> ClientResult<()> {
        info!(endpoint = %self.endpoint, "Closing connection");
        self.connection.lock().await.close().await?;
        Ok(())
    }

    pub async fn state(&self) -> ConnectionState {
        self.connection.lock().await.state()
    }

    /// Encode a request and hand it to the connection
    pub async fn send(&self, request: &Request) -> ClientResult<()> {
        let payload = request.encode();

        if self.config.logging.log_requests {
            debug!(
                id = request.id(),
                method = request.method(),
                request = %request.to_debug_string(self.config.diagnostics.request_clip_length),
                "Sending request"
            );
        }

        let result = self.connection.lock().await.send_text(&payload).await;
        match result {
            Ok(()) => {
                self.statistics.lock().requests_sent += 1;
                Ok(())
            }
            Err(source) => {
                self.statistics.lock().transport_errors += 1;
                warn!(
                    id = request.id(),
                    method = request.method(),
                    error = %source,
                    "Failed to send request"
                );
                Err(ClientError::send_failed(
                    &payload,
                    self.config.diagnostics.send_preview_length,
                    source,
                ))
            }
        }
    }

    /// Build a request with the next id and send it. Returns the id to correlate the response.
    pub async fn call(
        &self,
        method: impl Into<String>,
        params: Vec<NativeValue>,
    ) -> ClientResult<i64> {
        let request = Request::with_generator(method, params, self.ids.as_ref())?;
        self.send(&request).await?;
        Ok(request.id())
    }

    /// Decode incoming text into a response
    pub fn decode_message(&self, text: &str) -> MessageResult<Response> {
        Response::decode(text)
    }

    /// Wait for the next event. `None` once the connection is gone or the
    /// events were handed to [`RpcClient::start`].
    pub async fn next_event(&self) -> Option<ClientEvent> {
        let mut events = self.events.lock().await;
        let event = events.as_mut()?.recv().await?;
        Some(self.translator().translate(event))
    }

    /// Process events on a background task, handing each to `dispatcher` in arrival order.
    /// The task ends when the connection's event channel closes.
    ///
    /// Fails with [`TransportError::EventsUnavailable`] if the events were already
    /// taken or a [`RpcClient::next_event`] call is waiting on them.
    pub async fn start(&self, dispatcher: EventDispatcher) -> ClientResult<JoinHandle<()>> {
        let mut events = self
            .events
            .try_lock()
            .map_err(|_| TransportError::EventsUnavailable)?
            .take()
            .ok_or(TransportError::EventsUnavailable)?;
        let translator = self.translator();

        Ok(tokio::spawn(async move {
            info!("Event dispatcher started");

            while let Some(event) = events.recv().await {
                dispatcher.dispatch(translator.translate(event));
            }

            info!("Event dispatcher stopped");
        }))
    }

    /// Snapshot of the traffic counters
    pub fn statistics(&self) -> ClientStatistics {
        self.statistics.lock().clone()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn translator(&self) -> EventTranslator {
        EventTranslator {
            diagnostics: self.config.diagnostics.clone(),
            logging: self.config.logging.clone(),
            statistics: Arc::clone(&self.statistics),
        }
    }
}

/// Builder for creating clients
#[derive(Default)]
pub struct RpcClientBuilder {
    connection: Option<BoxedConnection>,
    config: Option<ClientConfig>,
    ids: Option<Arc<dyn IdGenerator>>,
}

impl RpcClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set connection
    pub fn with_connection(mut self, connection: BoxedConnection) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Set configuration
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set id generator. Defaults to the process-wide generator.
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Build the client
    pub fn build(self) -> ClientResult<RpcClient> {
        let connection = self
            .connection
            .ok_or_else(|| ClientError::config("connection must be set before building client"))?;
        let config = self.config.unwrap_or_default();

        match self.ids {
            Some(ids) => RpcClient::with_id_generator(connection, config, ids),
            None => RpcClient::new(connection, config),
        }
    }
}
