//! Request and incoming message types.
//!
//! Defines the envelope for commands sent to the remote end and for the
//! three kinds of messages it sends back: command success, command error,
//! and events.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

use super::Command;
use super::event::Event;

// ============================================================================
// Request
// ============================================================================

/// A command request from local end to remote end.
///
/// # Format
///
/// ```json
/// {
///   "id": 1,
///   "method": "module.methodName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Identifier for request/response correlation.
    pub id: RequestId,

    /// Command with method and params.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    /// Creates a new request with auto-generated ID.
    #[inline]
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            id: RequestId::generate(),
            command,
        }
    }

    /// Creates a new request with specific ID.
    #[inline]
    #[must_use]
    pub fn with_id(id: RequestId, command: Command) -> Self {
        Self { id, command }
    }
}

// ============================================================================
// Incoming Message
// ============================================================================

/// A message from remote end to local end.
///
/// # Format
///
/// Success:
/// ```json
/// { "type": "success", "id": 1, "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "type": "error", "id": 1, "error": "no such node", "message": "..." }
/// ```
///
/// Event:
/// ```json
/// { "type": "event", "method": "log.entryAdded", "params": { ... } }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Successful command response.
    Success {
        /// Matches the command `id`.
        id: RequestId,
        /// Result data.
        #[serde(default)]
        result: Value,
    },

    /// Error response.
    ///
    /// `id` is null when the remote end could not parse the command.
    Error {
        /// Matches the command `id`, if known.
        #[serde(default)]
        id: Option<RequestId>,
        /// BiDi error code.
        error: String,
        /// Human-readable message.
        #[serde(default)]
        message: String,
    },

    /// Event notification.
    Event(Event),
}

impl Message {
    /// Returns the correlated request ID, if any.
    #[inline]
    #[must_use]
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::Success { id, .. } => Some(*id),
            Self::Error { id, .. } => *id,
            Self::Event(_) => None,
        }
    }

    /// Converts a command response into its result value.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownCommand`] for `unknown command` responses
    /// - [`Error::InvalidArgument`] for `invalid argument` / `invalid selector`
    /// - [`Error::Remote`] for any other error code
    /// - [`Error::Protocol`] if called on an event
    pub fn into_result(self) -> Result<Value> {
        match self {
            Self::Success { result, .. } => Ok(result),
            Self::Error { error, message, .. } => Err(match error.as_str() {
                "unknown command" => Error::unknown_command(message),
                "invalid argument" | "invalid selector" => {
                    Error::invalid_argument(format!("{error}: {message}"))
                }
                _ => Error::remote(error, message),
            }),
            Self::Event(event) => Err(Error::protocol(format!(
                "Expected command response, got event {}",
                event.method
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SessionCommand;

    #[test]
    fn test_request_serialization() {
        let request = Request::with_id(
            RequestId::from_raw(3),
            Command::Session(SessionCommand::Status {}),
        );
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["id"], 3);
        assert_eq!(json["method"], "session.status");
        assert!(json["params"].is_object());
    }

    #[test]
    fn test_success_message() {
        let text = r#"{"type": "success", "id": 4, "result": {"ready": true}}"#;
        let message: Message = serde_json::from_str(text).expect("parse");

        assert_eq!(message.request_id(), Some(RequestId::from_raw(4)));
        let result = message.into_result().expect("success");
        assert_eq!(result["ready"], true);
    }

    #[test]
    fn test_error_message_maps_code() {
        let text = r#"{"type": "error", "id": 5, "error": "no such node", "message": "gone"}"#;
        let message: Message = serde_json::from_str(text).expect("parse");

        let err = message.into_result().expect_err("error");
        assert_eq!(err.remote_code(), Some("no such node"));
    }

    #[test]
    fn test_invalid_selector_is_invalid_argument() {
        let text = r#"{"type": "error", "id": 6, "error": "invalid selector", "message": "bad xpath"}"#;
        let message: Message = serde_json::from_str(text).expect("parse");

        let err = message.into_result().expect_err("error");
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_error_with_null_id() {
        let text = r#"{"type": "error", "id": null, "error": "invalid argument", "message": "x"}"#;
        let message: Message = serde_json::from_str(text).expect("parse");
        assert_eq!(message.request_id(), None);
    }

    #[test]
    fn test_event_message() {
        let text = r#"{"type": "event", "method": "log.entryAdded", "params": {"level": "error"}}"#;
        let message: Message = serde_json::from_str(text).expect("parse");

        assert!(message.request_id().is_none());
        assert!(matches!(message, Message::Event(ref e) if e.method == "log.entryAdded"));
    }
}
