//! Browser session options.
//!
//! Provides a type-safe builder for the capabilities sent with
//! `session.new`.
//!
//! # Example
//!
//! ```ignore
//! use notion_e2e::SessionOptions;
//!
//! let options = SessionOptions::new()
//!     .with_headless()
//!     .with_window_size(1920, 1080)
//!     .with_arg("-private");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde_json::{Map, Value, json};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Desktop user agent the suite presents to the product.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default per-call element lookup budget.
pub const DEFAULT_IMPLICIT_WAIT: Duration = Duration::from_secs(15);

/// Default page-load limit.
pub const DEFAULT_PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Default script execution limit.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Viewport used when no window size is given ("maximised").
const MAXIMISED_WINDOW: (u32, u32) = (1920, 1080);

// ============================================================================
// SessionOptions
// ============================================================================

/// Launch options for a browser session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Run without a visible window.
    pub headless: bool,

    /// Viewport size as (width, height).
    pub window_size: Option<(u32, u32)>,

    /// User-agent override.
    pub user_agent: Option<String>,

    /// Additional browser command-line arguments.
    pub extra_args: Vec<String>,

    /// Budget for a single element lookup.
    pub implicit_wait: Duration,

    /// Limit for `browsingContext.navigate`.
    pub page_load_timeout: Duration,

    /// Limit for `script.callFunction`.
    pub script_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            headless: false,
            window_size: None,
            user_agent: Some(DESKTOP_USER_AGENT.to_string()),
            extra_args: Vec::new(),
            implicit_wait: DEFAULT_IMPLICIT_WAIT,
            page_load_timeout: DEFAULT_PAGE_LOAD_TIMEOUT,
            script_timeout: DEFAULT_SCRIPT_TIMEOUT,
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl SessionOptions {
    /// Creates options with the suite defaults.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options with headless mode enabled.
    #[inline]
    #[must_use]
    pub fn headless() -> Self {
        Self::new().with_headless()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SessionOptions {
    /// Enables headless mode.
    #[inline]
    #[must_use]
    pub fn with_headless(mut self) -> Self {
        self.headless = true;
        self
    }

    /// Sets the viewport size.
    #[inline]
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = Some((width, height));
        self
    }

    /// Overrides the user agent.
    #[inline]
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Keeps the browser's own user agent.
    #[inline]
    #[must_use]
    pub fn with_native_user_agent(mut self) -> Self {
        self.user_agent = None;
        self
    }

    /// Adds a custom command-line argument.
    #[inline]
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Adds multiple custom command-line arguments.
    #[inline]
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the element lookup budget.
    #[inline]
    #[must_use]
    pub fn with_implicit_wait(mut self, wait: Duration) -> Self {
        self.implicit_wait = wait;
        self
    }

    /// Sets the page-load limit.
    #[inline]
    #[must_use]
    pub fn with_page_load_timeout(mut self, timeout: Duration) -> Self {
        self.page_load_timeout = timeout;
        self
    }

    /// Sets the script execution limit.
    #[inline]
    #[must_use]
    pub fn with_script_timeout(mut self, timeout: Duration) -> Self {
        self.script_timeout = timeout;
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl SessionOptions {
    /// Converts options to Firefox command-line arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(2 + self.extra_args.len());

        if self.headless {
            args.push("-headless".to_string());
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Returns the viewport to apply after the session starts.
    #[inline]
    #[must_use]
    pub fn viewport(&self) -> (u32, u32) {
        self.window_size.unwrap_or(MAXIMISED_WINDOW)
    }

    /// Builds the `capabilities` object for `session.new`.
    #[must_use]
    pub fn to_capabilities(&self) -> Value {
        let mut prefs = Map::new();
        if let Some(user_agent) = &self.user_agent {
            prefs.insert(
                "general.useragent.override".to_string(),
                Value::String(user_agent.clone()),
            );
        }

        json!({
            "alwaysMatch": {
                "acceptInsecureCerts": true,
                "moz:firefoxOptions": {
                    "args": self.to_args(),
                    "prefs": prefs,
                }
            }
        })
    }

    /// Validates the options configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a zero window dimension or a
    /// zero timeout.
    pub fn validate(&self) -> Result<()> {
        if let Some((width, height)) = self.window_size
            && (width == 0 || height == 0)
        {
            return Err(Error::invalid_argument(
                "Window dimensions must be greater than zero",
            ));
        }

        for (name, value) in [
            ("implicit wait", self.implicit_wait),
            ("page load timeout", self.page_load_timeout),
            ("script timeout", self.script_timeout),
        ] {
            if value.is_zero() {
                return Err(Error::invalid_argument(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        Ok(())
    }

    /// Returns `true` if headless mode is enabled.
    #[inline]
    #[must_use]
    pub const fn is_headless(&self) -> bool {
        self.headless
    }
}

// ============================================================================
// Tests
// ============================================================================
