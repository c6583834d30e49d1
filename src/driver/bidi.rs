//! WebDriver BiDi session backing the [`Driver`] facade.
//!
//! Talks to a BiDi-only endpoint (geckodriver's `ws://host:port/session`)
//! over a single [`Connection`]. One session drives one top-level browsing
//! context.
//!
//! # Mapping
//!
//! | Facade | BiDi |
//! |--------|------|
//! | `navigate` | `browsingContext.navigate` (`wait: complete`) |
//! | `find_one` / `find_all` | `browsingContext.locateNodes` |
//! | `execute_script`, reads, `is_displayed`, `clear` | `script.callFunction` |
//! | `click`, `send_keys` | `input.performActions` |

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{ContextId, ElementId, SessionId};
use crate::locator::Selector;
use crate::protocol::value::{node_argument, script_result, shared_id, string_argument};
use crate::protocol::{
    BrowsingContextCommand, Command, InputCommand, ParsedEvent, ReadinessState, Request,
    ScriptCommand, ScriptTarget, SessionCommand, Viewport,
};
use crate::transport::Connection;

use super::facade::Driver;
use super::options::SessionOptions;

// ============================================================================
// Constants
// ============================================================================

/// Limit for session-management commands.
const SESSION_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Events logged for diagnostics.
const SUBSCRIBED_EVENTS: [&str; 2] = ["browsingContext.load", "log.entryAdded"];

/// Visibility check run against an element.
const IS_DISPLAYED_FN: &str = r"function(el) {
    if (!el || !el.isConnected) return false;
    const style = window.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') {
        return false;
    }
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
}";

const SCROLL_INTO_VIEW_FN: &str =
    "function(el) { el.scrollIntoView({ block: 'center', inline: 'center' }); }";

const FOCUS_FN: &str = "function(el) { el.focus(); }";

const CLEAR_FN: &str = r"function(el) {
    if (el.isContentEditable) {
        el.textContent = '';
    } else {
        el.value = '';
    }
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
}";

const TEXT_FN: &str = "function(el) { return el.innerText ?? el.textContent ?? ''; }";

const ATTRIBUTE_FN: &str = "function(el, name) { return el.getAttribute(name); }";

// ============================================================================
// BidiDriver
// ============================================================================

/// A live browser session over WebDriver BiDi.
pub struct BidiDriver {
    connection: Connection,
    session: SessionId,
    context: ContextId,
    options: SessionOptions,
}

impl std::fmt::Debug for BidiDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BidiDriver")
            .field("session", &self.session)
            .field("context", &self.context)
            .field("closed", &self.connection.is_closed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// BidiDriver - Lifecycle
// ============================================================================

impl BidiDriver {
    /// Connects to `endpoint`, starts a session and selects its top-level
    /// browsing context.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] / [`Error::WebSocket`] if the endpoint
    ///   is unreachable
    /// - [`Error::Protocol`] if `session.new` returns an unexpected shape
    /// - [`Error::Remote`] if the remote end refuses the capabilities
    pub async fn connect(
        endpoint: &str,
        options: SessionOptions,
        connect_timeout: Duration,
    ) -> Result<Self> {
        options.validate()?;

        let connection = Connection::connect(endpoint, connect_timeout).await?;

        let result = connection
            .send_with_timeout(
                Request::new(Command::Session(SessionCommand::New {
                    capabilities: options.to_capabilities(),
                })),
                SESSION_COMMAND_TIMEOUT,
            )
            .await?;

        let session = result
            .get("sessionId")
            .and_then(Value::as_str)
            .map(SessionId::new)
            .ok_or_else(|| Error::protocol(format!("session.new without sessionId: {result}")))?;

        let context = Self::top_level_context(&connection).await?;

        let driver = Self {
            connection,
            session,
            context,
            options,
        };

        driver.install_event_logging().await;
        driver.apply_viewport().await?;

        debug!(session = %driver.session, context = %driver.context, "Session started");
        Ok(driver)
    }

    /// Ends the session and closes the connection.
    ///
    /// Any in-flight [`Driver::sleep`] returns early; later calls fail with
    /// [`Error::SessionLost`].
    ///
    /// # Errors
    ///
    /// Returns the `session.end` failure, after shutting the connection down.
    pub async fn close(&self) -> Result<()> {
        debug!(session = %self.session, "Ending session");

        let result = self
            .connection
            .send_with_timeout(
                Request::new(Command::Session(SessionCommand::End {})),
                SESSION_COMMAND_TIMEOUT,
            )
            .await;

        self.connection.clear_event_handler();
        self.connection.shutdown();

        match result {
            Ok(_) | Err(Error::SessionLost) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Returns the session ID.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    /// Returns the driven browsing context.
    #[inline]
    #[must_use]
    pub fn context_id(&self) -> &ContextId {
        &self.context
    }

    /// Returns the options the session was started with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Returns `true` once the connection is gone.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.connection.is_closed()
    }

    async fn top_level_context(connection: &Connection) -> Result<ContextId> {
        let tree = connection
            .send_with_timeout(
                Request::new(Command::BrowsingContext(BrowsingContextCommand::GetTree {
                    max_depth: 0,
                })),
                SESSION_COMMAND_TIMEOUT,
            )
            .await?;

        if let Some(context) = tree
            .pointer("/contexts/0/context")
            .and_then(Value::as_str)
        {
            return Ok(ContextId::new(context));
        }

        let created = connection
            .send_with_timeout(
                Request::new(Command::BrowsingContext(BrowsingContextCommand::Create {
                    kind: "tab".to_string(),
                })),
                SESSION_COMMAND_TIMEOUT,
            )
            .await?;

        created
            .get("context")
            .and_then(Value::as_str)
            .map(ContextId::new)
            .ok_or_else(|| Error::protocol(format!("browsingContext.create without context: {created}")))
    }

    async fn install_event_logging(&self) {
        self.connection.set_event_handler(Box::new(|event| match event.parse() {
            ParsedEvent::Load { url, .. } => debug!(%url, "Page loaded"),
            ParsedEvent::LogEntry { level, text } => trace!(%level, %text, "Console"),
            other => trace!(?other, "Event"),
        }));

        let subscribe = Command::Session(SessionCommand::Subscribe {
            events: SUBSCRIBED_EVENTS.iter().map(ToString::to_string).collect(),
        });
        if let Err(e) = self
            .connection
            .send_with_timeout(Request::new(subscribe), SESSION_COMMAND_TIMEOUT)
            .await
        {
            debug!(error = %e, "Event subscription refused");
        }
    }

    async fn apply_viewport(&self) -> Result<()> {
        let (width, height) = self.options.viewport();
        self.send(
            Command::BrowsingContext(BrowsingContextCommand::SetViewport {
                context: self.context.clone(),
                viewport: Viewport { width, height },
            }),
            SESSION_COMMAND_TIMEOUT,
        )
        .await
        .map(|_| ())
    }
}

// ============================================================================
// BidiDriver - Command Helpers
// ============================================================================

impl BidiDriver {
    async fn send(&self, command: Command, timeout: Duration) -> Result<Value> {
        let method = command.method();
        trace!(method, "Sending command");
        self.connection
            .send_with_timeout(Request::new(command), timeout)
            .await
    }

    async fn call_function(&self, declaration: String, arguments: Vec<Value>) -> Result<Value> {
        let result = self
            .send(
                Command::Script(ScriptCommand::CallFunction {
                    function_declaration: declaration,
                    await_promise: true,
                    target: ScriptTarget {
                        context: self.context.clone(),
                    },
                    arguments,
                }),
                self.options.script_timeout,
            )
            .await?;

        script_result(result)
    }

    /// Runs `declaration` with `element` as its first argument.
    async fn call_on(
        &self,
        element: &ElementId,
        declaration: &str,
        mut extra: Vec<Value>,
    ) -> Result<Value> {
        let mut arguments = Vec::with_capacity(1 + extra.len());
        arguments.push(node_argument(element));
        arguments.append(&mut extra);

        self.call_function(declaration.to_string(), arguments)
            .await
            .map_err(|e| stale_if_missing(e, element))
    }

    async fn locate(&self, selector: &Selector, max: Option<u32>) -> Result<Vec<ElementId>> {
        let result = self
            .send(
                Command::BrowsingContext(BrowsingContextCommand::LocateNodes {
                    context: self.context.clone(),
                    locator: selector.to_node_locator(),
                    max_node_count: max,
                }),
                self.options.implicit_wait,
            )
            .await
            .map_err(|e| match e {
                Error::RequestTimeout { timeout_ms, .. } => Error::timeout("locateNodes", timeout_ms),
                other => other,
            })?;

        Ok(result
            .get("nodes")
            .and_then(Value::as_array)
            .map(|nodes| nodes.iter().filter_map(shared_id).collect())
            .unwrap_or_default())
    }

    async fn perform_actions(&self, element: &ElementId, actions: Vec<Value>) -> Result<()> {
        self.send(
            Command::Input(InputCommand::PerformActions {
                context: self.context.clone(),
                actions,
            }),
            self.options.script_timeout,
        )
        .await
        .map_err(|e| stale_if_missing(e, element))?;

        self.send(
            Command::Input(InputCommand::ReleaseActions {
                context: self.context.clone(),
            }),
            self.options.script_timeout,
        )
        .await
        .map(|_| ())
    }

    async fn read_string(&self, body: &str) -> Result<String> {
        let value = self.execute_script(body).await?;
        Ok(value.as_str().map(str::to_string).unwrap_or_default())
    }
}

// ============================================================================
// Driver Implementation
// ============================================================================

#[async_trait]
impl Driver for BidiDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!(url, "Navigating");

        let timeout = self.options.page_load_timeout;
        self.send(
            Command::BrowsingContext(BrowsingContextCommand::Navigate {
                context: self.context.clone(),
                url: url.to_string(),
                wait: ReadinessState::Complete,
            }),
            timeout,
        )
        .await
        .map_err(|e| match e {
            Error::RequestTimeout { timeout_ms, .. } => Error::timeout("page load", timeout_ms),
            other => other,
        })?;

        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.read_string("return document.location.href;").await
    }

    async fn title(&self) -> Result<String> {
        self.read_string("return document.title;").await
    }

    async fn page_source(&self) -> Result<String> {
        self.read_string(
            "return document.documentElement ? document.documentElement.outerHTML : '';",
        )
        .await
    }

    async fn find_one(&self, selector: &Selector) -> Result<Option<ElementId>> {
        let mut nodes = self.locate(selector, Some(1)).await?;
        trace!(%selector, found = !nodes.is_empty(), "find_one");
        Ok(if nodes.is_empty() {
            None
        } else {
            Some(nodes.swap_remove(0))
        })
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<ElementId>> {
        self.locate(selector, None).await
    }

    async fn execute_script(&self, source: &str) -> Result<Value> {
        self.call_function(format!("function() {{ {source} }}"), Vec::new())
            .await
    }

    async fn sleep(&self, duration: Duration) {
        tokio::select! {
            () = tokio::time::sleep(duration) => {}
            () = self.connection.closed() => {
                warn!(session = %self.session, "Sleep interrupted by session teardown");
            }
        }
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        let value = self.call_on(element, IS_DISPLAYED_FN, Vec::new()).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        debug!(element = %element, "Clicking");
        self.call_on(element, SCROLL_INTO_VIEW_FN, Vec::new()).await?;

        let pointer = json!({
            "type": "pointer",
            "id": "mouse",
            "parameters": { "pointerType": "mouse" },
            "actions": [
                {
                    "type": "pointerMove",
                    "x": 0,
                    "y": 0,
                    "origin": { "type": "element", "element": node_argument(element) }
                },
                { "type": "pointerDown", "button": 0 },
                { "type": "pointerUp", "button": 0 }
            ]
        });
        self.perform_actions(element, vec![pointer]).await
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()> {
        debug!(element = %element, chars = text.chars().count(), "Typing");
        self.call_on(element, FOCUS_FN, Vec::new()).await?;

        let key_actions: Vec<Value> = text
            .chars()
            .flat_map(|c| {
                let value = c.to_string();
                [
                    json!({ "type": "keyDown", "value": value }),
                    json!({ "type": "keyUp", "value": value }),
                ]
            })
            .collect();

        if key_actions.is_empty() {
            return Ok(());
        }

        let keyboard = json!({
            "type": "key",
            "id": "keyboard",
            "actions": key_actions
        });
        self.perform_actions(element, vec![keyboard]).await
    }

    async fn clear(&self, element: &ElementId) -> Result<()> {
        self.call_on(element, CLEAR_FN, Vec::new()).await.map(|_| ())
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        let value = self.call_on(element, TEXT_FN, Vec::new()).await?;
        Ok(value.as_str().map(str::to_string).unwrap_or_default())
    }

    async fn attribute(&self, element: &ElementId, name: &str) -> Result<Option<String>> {
        let value = self
            .call_on(element, ATTRIBUTE_FN, vec![string_argument(name)])
            .await?;
        Ok(value.as_str().map(str::to_string))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Maps BiDi "node gone" errors onto [`Error::StaleElement`].
fn stale_if_missing(error: Error, element: &ElementId) -> Error {
    match error.remote_code() {
        Some("no such node" | "no such element") => Error::stale_element(element.clone()),
        _ => error,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_if_missing_maps_no_such_node() {
        let element = ElementId::new("n-7");
        let err = stale_if_missing(Error::remote("no such node", "gone"), &element);
        assert!(matches!(err, Error::StaleElement { ref element_id } if element_id.as_str() == "n-7"));
    }

    #[test]
    fn test_stale_if_missing_keeps_other_errors() {
        let element = ElementId::new("n-7");
        let err = stale_if_missing(Error::remote("unknown error", "boom"), &element);
        assert!(matches!(err, Error::Remote { .. }));

        let err = stale_if_missing(Error::SessionLost, &element);
        assert!(err.is_session_lost());
    }

    #[test]
    fn test_element_scripts_are_function_declarations() {
        for script in [IS_DISPLAYED_FN, SCROLL_INTO_VIEW_FN, FOCUS_FN, CLEAR_FN, TEXT_FN, ATTRIBUTE_FN] {
            assert!(script.starts_with("function(el"), "{script}");
        }
    }

    #[tokio::test]
    async fn test_connect_unreachable_endpoint_fails() {
        let result = BidiDriver::connect(
            "ws://127.0.0.1:1/session",
            SessionOptions::headless(),
            Duration::from_millis(500),
        )
        .await;
        assert!(result.is_err());
    }
}
