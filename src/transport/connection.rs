//! WebSocket connection and event loop.
//!
//! This module handles the WebSocket connection to a BiDi remote end,
//! including request/response correlation and event routing.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Incoming messages from the remote end (responses, events)
//! - Outgoing commands from the driver
//! - Request/response correlation by request ID
//! - Event handler callbacks
//! - Broadcasting closure to anyone awaiting [`Connection::closed`]

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, from_str, to_string};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{Event, Message, Request};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for command execution.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum pending requests before rejecting new ones.
const MAX_PENDING_REQUESTS: usize = 100;

// ============================================================================
// Types
// ============================================================================

/// WebSocket stream type produced by `connect_async`.
type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Map of request IDs to response channels.
type CorrelationMap = FxHashMap<RequestId, oneshot::Sender<Result<Value>>>;

/// Event handler callback type.
///
/// Called for each event received from the remote end.
pub type EventHandler = Box<dyn Fn(Event) + Send + Sync>;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Send a request and wait for response.
    Send {
        request: Request,
        response_tx: oneshot::Sender<Result<Value>>,
    },
    /// Remove a timed-out correlation entry.
    RemoveCorrelation(RequestId),
    /// Shutdown the connection.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to a BiDi remote end.
///
/// Handles request/response correlation and event routing.
/// The connection spawns an internal event loop task.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync` and cheap to clone.
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
    /// Event handler (shared with event loop).
    event_handler: Arc<Mutex<Option<EventHandler>>>,
    /// Flips to `true` once the event loop terminates.
    closed_rx: watch::Receiver<bool>,
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            correlation: Arc::clone(&self.correlation),
            event_handler: Arc::clone(&self.event_handler),
            closed_rx: self.closed_rx.clone(),
        }
    }
}

impl Connection {
    /// Opens a WebSocket to `url` and spawns the event loop.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the handshake exceeds `connect_timeout`
    /// - [`Error::WebSocket`] if the handshake fails
    pub async fn connect(url: &str, connect_timeout: Duration) -> Result<Self> {
        debug!(url, "Connecting to BiDi endpoint");

        let (ws_stream, _response) = timeout(connect_timeout, connect_async(url))
            .await
            .map_err(|_| Error::connection_timeout(connect_timeout.as_millis() as u64))??;

        debug!(url, "WebSocket connected");
        Ok(Self::new(ws_stream))
    }

    /// Creates a new connection from a WebSocket stream.
    ///
    /// Spawns the event loop task internally.
    fn new(ws_stream: Stream) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = watch::channel(false);
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));
        let event_handler: Arc<Mutex<Option<EventHandler>>> = Arc::new(Mutex::new(None));

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlation),
            Arc::clone(&event_handler),
            closed_tx,
        ));

        Self {
            command_tx,
            correlation,
            event_handler,
            closed_rx,
        }
    }

    /// Sets the event handler callback.
    pub fn set_event_handler(&self, handler: EventHandler) {
        let mut guard = self.event_handler.lock();
        *guard = Some(handler);
    }

    /// Clears the event handler.
    pub fn clear_event_handler(&self) {
        let mut guard = self.event_handler.lock();
        *guard = None;
    }

    /// Sends a request and waits for response with default timeout (30s).
    ///
    /// # Errors
    ///
    /// - [`Error::SessionLost`] if connection is closed
    /// - [`Error::RequestTimeout`] if response not received within timeout
    /// - [`Error::Protocol`] if too many pending requests
    /// - any error mapped from a BiDi error response
    pub async fn send(&self, request: Request) -> Result<Value> {
        self.send_with_timeout(request, DEFAULT_COMMAND_TIMEOUT)
            .await
    }

    /// Sends a request and waits for response with custom timeout.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::send`].
    pub async fn send_with_timeout(
        &self,
        request: Request,
        request_timeout: Duration,
    ) -> Result<Value> {
        if self.is_closed() {
            return Err(Error::SessionLost);
        }

        let request_id = request.id;

        {
            let correlation = self.correlation.lock();
            if correlation.len() >= MAX_PENDING_REQUESTS {
                warn!(
                    pending = correlation.len(),
                    max = MAX_PENDING_REQUESTS,
                    "Too many pending requests"
                );
                return Err(Error::protocol(format!(
                    "Too many pending requests: {}/{}",
                    correlation.len(),
                    MAX_PENDING_REQUESTS
                )));
            }
        }

        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Send {
                request,
                response_tx,
            })
            .map_err(|_| Error::SessionLost)?;

        match timeout(request_timeout, response_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::SessionLost),
            Err(_) => {
                let _ = self
                    .command_tx
                    .send(ConnectionCommand::RemoveCorrelation(request_id));

                Err(Error::request_timeout(
                    request_id,
                    request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Returns `true` once the event loop has terminated.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.closed_rx.borrow()
    }

    /// Resolves when the connection closes.
    ///
    /// Used to interrupt sleeps when the session is torn down.
    pub async fn closed(&self) {
        let mut rx = self.closed_rx.clone();
        // Err means the loop dropped the sender, which also means closed.
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Shuts down the connection gracefully.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        ws_stream: Stream,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        correlation: Arc<Mutex<CorrelationMap>>,
        event_handler: Arc<Mutex<Option<EventHandler>>>,
        closed_tx: watch::Sender<bool>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(WsMessage::Text(text))) => {
                            Self::handle_incoming_message(&text, &correlation, &event_handler);
                        }

                        Some(Ok(WsMessage::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { request, response_tx }) => {
                            Self::handle_send_command(
                                request,
                                response_tx,
                                &mut ws_write,
                                &correlation,
                            ).await;
                        }

                        Some(ConnectionCommand::RemoveCorrelation(request_id)) => {
                            correlation.lock().remove(&request_id);
                            debug!(%request_id, "Removed timed-out correlation");
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        let _ = closed_tx.send(true);
        Self::fail_pending_requests(&correlation);

        debug!("Event loop terminated");
    }

    /// Handles an incoming text message from the remote end.
    fn handle_incoming_message(
        text: &str,
        correlation: &Arc<Mutex<CorrelationMap>>,
        event_handler: &Arc<Mutex<Option<EventHandler>>>,
    ) {
        let message = match from_str::<Message>(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, text = %text, "Failed to parse incoming message");
                return;
            }
        };

        if let Message::Event(event) = message {
            trace!(method = %event.method, "Event received");
            let handler = event_handler.lock();
            if let Some(ref handler) = *handler {
                handler(event);
            }
            return;
        }

        let Some(request_id) = message.request_id() else {
            warn!(?message, "Error response without request id");
            return;
        };

        let tx = correlation.lock().remove(&request_id);
        match tx {
            Some(tx) => {
                let _ = tx.send(message.into_result());
            }
            None => warn!(%request_id, "Response for unknown request"),
        }
    }

    /// Handles a send command from the driver.
    async fn handle_send_command(
        request: Request,
        response_tx: oneshot::Sender<Result<Value>>,
        ws_write: &mut futures_util::stream::SplitSink<Stream, WsMessage>,
        correlation: &Arc<Mutex<CorrelationMap>>,
    ) {
        let request_id = request.id;

        let json = match to_string(&request) {
            Ok(j) => j,
            Err(e) => {
                let _ = response_tx.send(Err(Error::Json(e)));
                return;
            }
        };

        // Store correlation before sending
        correlation.lock().insert(request_id, response_tx);

        if let Err(e) = ws_write.send(WsMessage::Text(json.into())).await
            && let Some(tx) = correlation.lock().remove(&request_id)
        {
            let _ = tx.send(Err(Error::connection(e.to_string())));
        }

        trace!(method = request.command.method(), %request_id, "Request sent");
    }

    /// Fails all pending requests with [`Error::SessionLost`].
    fn fail_pending_requests(correlation: &Arc<Mutex<CorrelationMap>>) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(Error::SessionLost));
        }

        if count > 0 {
            debug!(count, "Failed pending requests on shutdown");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_COMMAND_TIMEOUT.as_secs(), 30);
        assert_eq!(MAX_PENDING_REQUESTS, 100);
    }

    #[tokio::test]
    async fn test_incoming_success_resolves_pending_request() {
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));
        let handler: Arc<Mutex<Option<EventHandler>>> = Arc::new(Mutex::new(None));
        let (tx, rx) = oneshot::channel();
        correlation.lock().insert(RequestId::from_raw(42), tx);

        Connection::handle_incoming_message(
            r#"{"type":"success","id":42,"result":{"contexts":[]}}"#,
            &correlation,
            &handler,
        );

        let result = rx.await.expect("sender kept").expect("success");
        assert_eq!(result, json!({"contexts": []}));
        assert!(correlation.lock().is_empty());
    }

    #[tokio::test]
    async fn test_incoming_event_reaches_handler() {
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let handler: Arc<Mutex<Option<EventHandler>>> =
            Arc::new(Mutex::new(Some(Box::new(move |event: Event| {
                seen_clone.lock().push(event.method);
            }))));

        Connection::handle_incoming_message(
            r#"{"type":"event","method":"browsingContext.load","params":{}}"#,
            &correlation,
            &handler,
        );

        assert_eq!(seen.lock().as_slice(), ["browsingContext.load".to_string()]);
    }

    #[tokio::test]
    async fn test_fail_pending_requests_reports_session_lost() {
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));
        let (tx, rx) = oneshot::channel();
        correlation.lock().insert(RequestId::from_raw(1), tx);

        Connection::fail_pending_requests(&correlation);

        let result = rx.await.expect("sender kept");
        assert!(matches!(result, Err(Error::SessionLost)));
    }
}
