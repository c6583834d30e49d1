//! Driver Facade: the narrow contract the core speaks to.
//!
//! Everything above this trait (oracle, locator, page contracts) is written
//! against `&dyn Driver` only, so any automation backend can be plugged in.
//!
//! # Error contract
//!
//! | Outcome | Meaning |
//! |---------|---------|
//! | `Ok(None)` from [`Driver::find_one`] | no such element (normal control flow) |
//! | [`Error::SessionLost`] | connection to the driver broken |
//! | [`Error::Timeout`] | page load exceeded its limit |
//! | [`Error::ScriptError`] | in-page script threw |
//!
//! [`Error::SessionLost`]: crate::Error::SessionLost
//! [`Error::Timeout`]: crate::Error::Timeout
//! [`Error::ScriptError`]: crate::Error::ScriptError

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::ElementId;
use crate::locator::Selector;

// ============================================================================
// Driver
// ============================================================================

/// A browser automation session.
///
/// Implementations are not expected to be shared across scenarios; one
/// scenario drives one session, strictly sequentially.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Navigates the session to `url` and waits for the page load.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Returns the current document URL.
    async fn current_url(&self) -> Result<String>;

    /// Returns the current document title.
    async fn title(&self) -> Result<String>;

    /// Returns the serialized document (`outerHTML` of the root element).
    async fn page_source(&self) -> Result<String>;

    /// Returns the first element matching `selector`, or `None`.
    ///
    /// Bounded by the implicit-wait budget; never polls.
    async fn find_one(&self, selector: &Selector) -> Result<Option<ElementId>>;

    /// Returns every element matching `selector`, in document order.
    async fn find_all(&self, selector: &Selector) -> Result<Vec<ElementId>>;

    /// Runs a script body (`return ...` style) and returns its JSON result.
    ///
    /// Scripts passed by the core are idempotent and side-effect free.
    async fn execute_script(&self, source: &str) -> Result<Value>;

    /// Sleeps for `duration`.
    ///
    /// Implementations should return early when the session is torn down.
    async fn sleep(&self, duration: Duration);

    // ========================================================================
    // Element capabilities
    // ========================================================================

    /// Returns `true` if the element is rendered and visible.
    async fn is_displayed(&self, element: &ElementId) -> Result<bool>;

    /// Clicks the element.
    async fn click(&self, element: &ElementId) -> Result<()>;

    /// Types `text` into the element.
    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()>;

    /// Clears the element's value.
    async fn clear(&self, element: &ElementId) -> Result<()>;

    /// Returns the element's rendered text.
    async fn text(&self, element: &ElementId) -> Result<String>;

    /// Returns an attribute value, or `None` if absent.
    async fn attribute(&self, element: &ElementId, name: &str) -> Result<Option<String>>;
}
