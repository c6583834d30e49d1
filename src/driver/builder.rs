//! Builder pattern for session configuration.
//!
//! Provides a fluent API for configuring and opening [`BidiDriver`] sessions.
//!
//! # Example
//!
//! ```no_run
//! use notion_e2e::{SessionBuilder, SessionOptions};
//!
//! # async fn example() -> notion_e2e::Result<()> {
//! let driver = SessionBuilder::new()
//!     .endpoint("ws://127.0.0.1:4444/session")
//!     .options(SessionOptions::headless())
//!     .connect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

use super::bidi::BidiDriver;
use super::options::SessionOptions;

// ============================================================================
// Constants
// ============================================================================

/// Endpoint geckodriver exposes for BiDi-only sessions.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:4444/session";

/// Default WebSocket handshake limit.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// SessionBuilder
// ============================================================================

/// Builder for a [`BidiDriver`] session.
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    /// BiDi WebSocket endpoint.
    endpoint: Option<String>,
    /// Session options.
    options: SessionOptions,
    /// WebSocket handshake limit.
    connect_timeout: Duration,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            endpoint: None,
            options: SessionOptions::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

// ============================================================================
// SessionBuilder Implementation
// ============================================================================

impl SessionBuilder {
    /// Creates a builder with default options and no endpoint.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the BiDi endpoint (`ws://` or `wss://`).
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Sets the session options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the WebSocket handshake limit.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Validates the configuration and opens the session.
    ///
    /// Falls back to [`DEFAULT_ENDPOINT`] if no endpoint was set.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] / [`Error::Config`] for a malformed endpoint
    /// - [`Error::InvalidArgument`] for invalid options
    /// - any error from [`BidiDriver::connect`]
    pub async fn connect(self) -> Result<BidiDriver> {
        let endpoint = self.validate_endpoint()?;
        self.options.validate()?;

        BidiDriver::connect(endpoint.as_str(), self.options, self.connect_timeout).await
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SessionBuilder {
    /// Validates the endpoint configuration.
    fn validate_endpoint(&self) -> Result<Url> {
        let endpoint = Url::parse(self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT))?;

        match endpoint.scheme() {
            "ws" | "wss" => Ok(endpoint),
            other => Err(Error::config(format!(
                "BiDi endpoint must use ws:// or wss://, got {other}://\n\
                 Example: SessionBuilder::new().endpoint(\"{DEFAULT_ENDPOINT}\")"
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

    #[test]
    fn test_new_creates_default_builder() {
        let builder = SessionBuilder::new();
        assert!(builder.endpoint.is_none());
        assert_eq!(builder.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn test_default_endpoint_is_valid() {
        let url = SessionBuilder::new().validate_endpoint().expect("default endpoint");
        assert_eq!(url.as_str(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_endpoint_rejects_http_scheme() {
        let builder = SessionBuilder::new().endpoint("http://127.0.0.1:4444");
        let err = builder.validate_endpoint().expect_err("http scheme");
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        let builder = SessionBuilder::new().endpoint("not a url");
        assert!(matches!(builder.validate_endpoint(), Err(Error::Url(_))));
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_options() {
        let err = SessionBuilder::new()
            .options(SessionOptions::new().with_window_size(0, 0))
            .connect()
            .await
            .expect_err("zero window");
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }
}
