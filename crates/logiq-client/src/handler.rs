//! Callback registration for client events

use logiq_json_rpc::{MessageError, Response};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// An event surfaced by [`RpcClient`](crate::RpcClient) after translating a
/// connection event
#[derive(Debug)]
pub enum ClientEvent {
    Opened,
    Closed {
        code: u16,
        reason: String,
        remote: bool,
    },
    /// An incoming message decoded into a response
    Response(Response),
    /// An incoming message that is not a valid response
    DecodeFailed {
        payload: String,
        error: MessageError,
    },
    /// A non-terminal connection failure
    Error(String),
}

impl ClientEvent {
    pub fn as_response(&self) -> Option<&Response> {
        match self {
            ClientEvent::Response(response) => Some(response),
            _ => None,
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            ClientEvent::Response(response) => Some(response),
            _ => None,
        }
    }
}

type OpenCallback = Box<dyn Fn() + Send + Sync>;
type CloseCallback = Box<dyn Fn(u16, &str, bool) + Send + Sync>;
type ResponseCallback = Box<dyn Fn(Response) + Send + Sync>;
type DecodeFailureCallback = Box<dyn Fn(&str, &MessageError) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Callbacks for each kind of client event
#[derive(Default)]
pub struct EventCallbacks {
    pub open: Option<OpenCallback>,
    pub close: Option<CloseCallback>,
    pub response: Option<ResponseCallback>,
    pub decode_failure: Option<DecodeFailureCallback>,
    pub error: Option<ErrorCallback>,
}

impl fmt::Debug for EventCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCallbacks")
            .field("open", &self.open.as_ref().map(|_| "function"))
            .field("close", &self.close.as_ref().map(|_| "function"))
            .field("response", &self.response.as_ref().map(|_| "function"))
            .field(
                "decode_failure",
                &self.decode_failure.as_ref().map(|_| "function"),
            )
            .field("error", &self.error.as_ref().map(|_| "function"))
            .finish()
    }
}

/// Routes client events to registered callbacks.
///
/// Clones share one callback table, so callbacks may be registered after the
/// dispatcher was handed to [`RpcClient::start`](crate::RpcClient::start).
/// Callbacks run while the table is locked and must not register callbacks themselves.
#[derive(Debug, Clone, Default)]
pub struct EventDispatcher {
    callbacks: Arc<Mutex<EventCallbacks>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set open callback
    pub fn on_open<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callbacks.lock().open = Some(Box::new(callback));
    }

    /// Set close callback, called with the close code, reason and whether the remote end closed
    pub fn on_close<F>(&self, callback: F)
    where
        F: Fn(u16, &str, bool) + Send + Sync + 'static,
    {
        self.callbacks.lock().close = Some(Box::new(callback));
    }

    /// Set response callback
    pub fn on_response<F>(&self, callback: F)
    where
        F: Fn(Response) + Send + Sync + 'static,
    {
        self.callbacks.lock().response = Some(Box::new(callback));
    }

    /// Set decode failure callback, called with the raw payload and the error
    pub fn on_decode_failure<F>(&self, callback: F)
    where
        F: Fn(&str, &MessageError) + Send + Sync + 'static,
    {
        self.callbacks.lock().decode_failure = Some(Box::new(callback));
    }

    /// Set error callback
    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.lock().error = Some(Box::new(callback));
    }

    /// Hand one event to its callback. Returns `false` when none is registered.
    pub fn dispatch(&self, event: ClientEvent) -> bool {
        let callbacks = self.callbacks.lock();

        match event {
            ClientEvent::Opened => callbacks.open.as_ref().map(|callback| callback()).is_some(),
            ClientEvent::Closed {
                code,
                reason,
                remote,
            } => callbacks
                .close
                .as_ref()
                .map(|callback| callback(code, reason.as_str(), remote))
                .is_some(),
            ClientEvent::Response(response) => {
                if let Some(ref callback) = callbacks.response {
                    callback(response);
                    true
                } else {
                    debug!(id = ?response.id(), "Response received but no response handler configured");
                    false
                }
            }
            ClientEvent::DecodeFailed { payload, error } => {
                if let Some(ref callback) = callbacks.decode_failure {
                    callback(payload.as_str(), &error);
                    true
                } else {
                    warn!(error = %error, "Undecodable message dropped");
                    false
                }
            }
            ClientEvent::Error(description) => callbacks
                .error
                .as_ref()
                .map(|callback| callback(description.as_str()))
                .is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logiq_json_rpc::ErrorType;

    #[test]
    fn test_dispatch_routes_events() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&log);
        dispatcher.on_open(move || sink.lock().push("open".to_string()));
        let sink = Arc::clone(&log);
        dispatcher.on_close(move |code, reason, remote| {
            sink.lock().push(format!("close {code} {reason} {remote}"))
        });
        let sink = Arc::clone(&log);
        dispatcher.on_response(move |response| {
            sink.lock().push(format!("response {:?}", response.id()))
        });
        let sink = Arc::clone(&log);
        dispatcher.on_error(move |description| sink.lock().push(format!("error {description}")));

        assert!(dispatcher.dispatch(ClientEvent::Opened));
        assert!(dispatcher.dispatch(ClientEvent::Response(Response::success(1, 9))));
        assert!(dispatcher.dispatch(ClientEvent::Error("reset".to_string())));
        assert!(dispatcher.dispatch(ClientEvent::Closed {
            code: 1000,
            reason: "done".to_string(),
            remote: true,
        }));

        assert_eq!(
            *log.lock(),
            vec![
                "open".to_string(),
                "response Some(9)".to_string(),
                "error reset".to_string(),
                "close 1000 done true".to_string(),
            ]
        );
    }

    #[test]
    fn test_unhandled_events() {
        let dispatcher = EventDispatcher::new();
        assert!(!dispatcher.dispatch(ClientEvent::Opened));
        assert!(!dispatcher.dispatch(ClientEvent::Response(Response::failure(
            ErrorType::InternalError,
            None,
            None
        ))));
        assert!(!dispatcher.dispatch(ClientEvent::DecodeFailed {
            payload: "{".to_string(),
            error: MessageError::EmptyMethod,
        }));
    }

    #[test]
    fn test_clones_share_callbacks() {
        let dispatcher = EventDispatcher::new();
        let clone = dispatcher.clone();
        let failures = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&failures);
        clone.on_decode_failure(move |payload, _error| {
            assert_eq!(payload, "oops");
            *counter.lock() += 1;
        });

        assert!(dispatcher.dispatch(ClientEvent::DecodeFailed {
            payload: "oops".to_string(),
            error: MessageError::MissingField("id"),
        }));
        assert_eq!(*failures.lock(), 1);
    }

    #[test]
    fn test_event_accessors() {
        let event = ClientEvent::Response(Response::success("ok", 3));
        assert_eq!(event.as_response().and_then(Response::id), Some(3));
        assert!(event.into_response().is_some());
        assert!(ClientEvent::Opened.into_response().is_none());
    }
}
