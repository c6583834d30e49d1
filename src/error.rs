//! Error types for the end-to-end suite.
//!
//! The core distinguishes three kinds of failure:
//!
//! | Kind | Variants | Core behaviour |
//! |------|----------|----------------|
//! | Setup | [`Error::Config`], [`Error::InvalidArgument`], [`Error::Toml`], [`Error::Url`], [`Error::Io`] | returned before any browser traffic |
//! | Fatal | [`Error::SessionLost`], [`Error::ChannelClosed`], [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::WebSocket`] | aborts the scenario |
//! | Transient | [`Error::StaleElement`], [`Error::ScriptError`], [`Error::Remote`], [`Error::Protocol`], [`Error::UnknownCommand`], [`Error::Timeout`], [`Error::RequestTimeout`], [`Error::Json`] | a miss for the oracle and locator |
//!
//! Missing elements are not errors at all: the locator reports them as
//! [`LocatorOutcome::NotFound`](crate::LocatorOutcome::NotFound).
//!
//! ```ignore
//! use notion_e2e::{Driver, Result};
//!
//! async fn read_title(driver: &dyn Driver) -> Result<String> {
//!     driver.navigate("https://www.notion.so").await?;
//!     driver.title().await
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{ElementId, RequestId};

// ============================================================================
// Result Alias
// ============================================================================

/// Crate-wide result, failing with [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Everything that can go wrong between a scenario and the browser.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Setup
    // ========================================================================
    /// A suite configuration key is missing, unknown or out of range.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Offending key and reason.
        message: String,
    },

    /// A budget, option or command argument cannot be used.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with it.
        message: String,
    },

    // ========================================================================
    // Session
    // ========================================================================
    /// The BiDi endpoint refused or dropped the WebSocket.
    #[error("Cannot reach browser: {message}")]
    Connection {
        /// Transport detail.
        message: String,
    },

    /// The WebSocket handshake did not finish in time.
    #[error("Browser endpoint did not answer within {timeout_ms}ms")]
    ConnectionTimeout {
        /// Handshake limit.
        timeout_ms: u64,
    },

    /// The driver session is gone.
    ///
    /// Fatal for the running scenario: the runner owns teardown.
    #[error("Browser session lost")]
    SessionLost,

    // ========================================================================
    // Remote End
    // ========================================================================
    /// The remote end does not implement a command.
    #[error("Command not supported by the browser: {command}")]
    UnknownCommand {
        /// Remote message, usually naming the method.
        command: String,
    },

    /// A message did not have the shape the protocol promises.
    #[error("Malformed BiDi message: {message}")]
    Protocol {
        /// What was missing or unexpected.
        message: String,
    },

    /// The remote end answered a command with an error.
    #[error("Browser rejected command ({code}): {message}")]
    Remote {
        /// BiDi error code (e.g. `no such node`).
        code: String,
        /// Message from the remote end.
        message: String,
    },

    /// Element handle no longer refers to a node in the document.
    ///
    /// Common after a client-side re-render replaced the subtree.
    #[error("Element {element_id} detached from the page")]
    StaleElement {
        /// The detached handle.
        element_id: ElementId,
    },

    /// In-page script threw.
    #[error("Page script threw: {message}")]
    ScriptError {
        /// Exception text reported by the page.
        message: String,
    },

    // ========================================================================
    // Time Limits
    // ========================================================================
    /// A page load or similar bounded operation ran out of time.
    #[error("{operation} exceeded {timeout_ms}ms")]
    Timeout {
        /// What was being waited for.
        operation: String,
        /// The limit that was hit.
        timeout_ms: u64,
    },

    /// No response arrived for a command.
    #[error("No response to request {request_id} within {timeout_ms}ms")]
    RequestTimeout {
        /// Correlation id of the unanswered command.
        request_id: RequestId,
        /// The limit that was hit.
        timeout_ms: u64,
    },

    // ========================================================================
    // Wrapped
    // ========================================================================
    #[error("I/O failure: {0}")]
    Io(#[from] IoError),

    #[error("JSON failure: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed configuration file.
    #[error("Config file is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Malformed URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("WebSocket failure: {0}")]
    WebSocket(#[from] WsError),

    /// The connection task dropped a pending reply.
    #[error("Response channel dropped")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Setup failure naming a configuration key.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Unusable argument.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Endpoint unreachable.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Handshake exceeded `timeout_ms`.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Unexpected message shape.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// BiDi `error` response.
    #[inline]
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }

    /// BiDi `unknown command` response.
    #[inline]
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Handle detached from the document.
    #[inline]
    pub fn stale_element(element_id: ElementId) -> Self {
        Self::StaleElement { element_id }
    }

    /// In-page exception.
    #[inline]
    pub fn script_error(message: impl Into<String>) -> Self {
        Self::ScriptError {
            message: message.into(),
        }
    }

    /// `operation` ran past `timeout_ms`.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// `request_id` went unanswered for `timeout_ms`.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the driver session is unreachable.
    ///
    /// This is the only error the locator and readiness oracle propagate.
    #[inline]
    #[must_use]
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Self::SessionLost | Self::ChannelClosed(_))
    }

    /// BiDi error code of a [`Error::Remote`].
    #[inline]
    #[must_use]
    pub fn remote_code(&self) -> Option<&str> {
        match self {
            Self::Remote { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Returns `true` for any exceeded time limit.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::Timeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if the browser cannot be talked to at all.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::SessionLost
                | Self::ChannelClosed(_)
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` for failures tied to the current DOM that a later
    /// attempt may not see.
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::StaleElement { .. }
                | Self::ScriptError { .. }
                | Self::Remote { .. }
                | Self::Protocol { .. }
                | Self::UnknownCommand { .. }
                | Self::Timeout { .. }
                | Self::RequestTimeout { .. }
                | Self::Json(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
