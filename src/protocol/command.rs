//! Command definitions organized by BiDi module.
//!
//! Commands follow the WebDriver BiDi `module.methodName` format.
//!
//! # Command Modules
//!
//! | Module | Commands |
//! |--------|----------|
//! | `session` | `new`, `end`, `status`, `subscribe` |
//! | `browsingContext` | `getTree`, `create`, `navigate`, `locateNodes`, `setViewport` |
//! | `script` | `callFunction` |
//! | `input` | `performActions`, `releaseActions` |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::identifiers::ContextId;

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by module.
///
/// This enum wraps module-specific command enums for unified serialization.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Command {
    /// Session module commands.
    Session(SessionCommand),
    /// BrowsingContext module commands.
    BrowsingContext(BrowsingContextCommand),
    /// Script module commands.
    Script(ScriptCommand),
    /// Input module commands.
    Input(InputCommand),
}

impl Command {
    /// Returns the `module.methodName` string of this command.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Session(SessionCommand::New { .. }) => "session.new",
            Self::Session(SessionCommand::End {}) => "session.end",
            Self::Session(SessionCommand::Status {}) => "session.status",
            Self::Session(SessionCommand::Subscribe { .. }) => "session.subscribe",
            Self::BrowsingContext(BrowsingContextCommand::GetTree { .. }) => {
                "browsingContext.getTree"
            }
            Self::BrowsingContext(BrowsingContextCommand::Create { .. }) => {
                "browsingContext.create"
            }
            Self::BrowsingContext(BrowsingContextCommand::Navigate { .. }) => {
                "browsingContext.navigate"
            }
            Self::BrowsingContext(BrowsingContextCommand::LocateNodes { .. }) => {
                "browsingContext.locateNodes"
            }
            Self::BrowsingContext(BrowsingContextCommand::SetViewport { .. }) => {
                "browsingContext.setViewport"
            }
            Self::Script(ScriptCommand::CallFunction { .. }) => "script.callFunction",
            Self::Input(InputCommand::PerformActions { .. }) => "input.performActions",
            Self::Input(InputCommand::ReleaseActions { .. }) => "input.releaseActions",
        }
    }
}

// ============================================================================
// Session Commands
// ============================================================================

/// Session module commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum SessionCommand {
    /// Create a BiDi-only session.
    #[serde(rename = "session.new")]
    New {
        /// Capabilities request (`alwaysMatch` / `firstMatch`).
        capabilities: Value,
    },

    /// End the session.
    #[serde(rename = "session.end")]
    End {},

    /// Query remote end readiness.
    #[serde(rename = "session.status")]
    Status {},

    /// Subscribe to events.
    #[serde(rename = "session.subscribe")]
    Subscribe {
        /// Event names or module names.
        events: Vec<String>,
    },
}

// ============================================================================
// BrowsingContext Commands
// ============================================================================

/// Page load state to wait for on navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessState {
    /// Return immediately.
    None,
    /// Wait for `DOMContentLoaded`.
    Interactive,
    /// Wait for `load`.
    Complete,
}

/// Node locator for `browsingContext.locateNodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum NodeLocator {
    /// CSS selector.
    #[serde(rename = "css")]
    Css(String),
    /// XPath expression.
    #[serde(rename = "xpath")]
    XPath(String),
}

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// BrowsingContext module commands for navigation and node lookup.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum BrowsingContextCommand {
    /// List top-level browsing contexts.
    #[serde(rename = "browsingContext.getTree")]
    GetTree {
        /// Depth of children to include (0 = top-level only).
        #[serde(rename = "maxDepth")]
        max_depth: u32,
    },

    /// Create a new tab.
    #[serde(rename = "browsingContext.create")]
    Create {
        /// Context type (`tab` or `window`).
        #[serde(rename = "type")]
        kind: String,
    },

    /// Navigate to URL.
    #[serde(rename = "browsingContext.navigate")]
    Navigate {
        /// Target context.
        context: ContextId,
        /// URL to navigate to.
        url: String,
        /// Load state to wait for.
        wait: ReadinessState,
    },

    /// Find nodes matching a locator.
    #[serde(rename = "browsingContext.locateNodes")]
    LocateNodes {
        /// Target context.
        context: ContextId,
        /// CSS or XPath locator.
        locator: NodeLocator,
        /// Result limit (`None` = all).
        #[serde(rename = "maxNodeCount", skip_serializing_if = "Option::is_none")]
        max_node_count: Option<u32>,
    },

    /// Resize the viewport.
    #[serde(rename = "browsingContext.setViewport")]
    SetViewport {
        /// Target context.
        context: ContextId,
        /// New dimensions.
        viewport: Viewport,
    },
}

// ============================================================================
// Script Commands
// ============================================================================

/// Script target realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptTarget {
    /// Browsing context whose window realm runs the script.
    pub context: ContextId,
}

/// Script module commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum ScriptCommand {
    /// Call a function declaration with serialized arguments.
    #[serde(rename = "script.callFunction")]
    CallFunction {
        /// Function source, e.g. `function() { return document.title }`.
        #[serde(rename = "functionDeclaration")]
        function_declaration: String,
        /// Whether to await a returned promise.
        #[serde(rename = "awaitPromise")]
        await_promise: bool,
        /// Target realm.
        target: ScriptTarget,
        /// Local values passed as arguments.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        arguments: Vec<Value>,
    },
}

// ============================================================================
// Input Commands
// ============================================================================

/// Input module commands for keyboard and pointer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum InputCommand {
    /// Dispatch action sequences.
    #[serde(rename = "input.performActions")]
    PerformActions {
        /// Target context.
        context: ContextId,
        /// Input sources with their action lists.
        actions: Vec<Value>,
    },

    /// Release all pressed keys and buttons.
    #[serde(rename = "input.releaseActions")]
    ReleaseActions {
        /// Target context.
        context: ContextId,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_navigate_serialization() {
        let command = Command::BrowsingContext(BrowsingContextCommand::Navigate {
            context: ContextId::new("ctx"),
            url: "https://www.notion.so".to_string(),
            wait: ReadinessState::Complete,
        });

        let value = serde_json::to_value(&command).expect("serialize");
        assert_eq!(value["method"], "browsingContext.navigate");
        assert_eq!(value["params"]["context"], "ctx");
        assert_eq!(value["params"]["wait"], "complete");
    }

    #[test]
    fn test_session_end_has_empty_params() {
        let command = Command::Session(SessionCommand::End {});
        let value = serde_json::to_value(&command).expect("serialize");
        assert_eq!(value, json!({"method": "session.end", "params": {}}));
    }

    #[test]
    fn test_locate_nodes_xpath() {
        let command = Command::BrowsingContext(BrowsingContextCommand::LocateNodes {
            context: ContextId::new("ctx"),
            locator: NodeLocator::XPath("//input[@type='email']".to_string()),
            max_node_count: Some(1),
        });

        let value = serde_json::to_value(&command).expect("serialize");
        assert_eq!(value["params"]["locator"]["type"], "xpath");
        assert_eq!(value["params"]["locator"]["value"], "//input[@type='email']");
        assert_eq!(value["params"]["maxNodeCount"], 1);
    }

    #[test]
    fn test_locate_nodes_omits_unbounded_count() {
        let command = Command::BrowsingContext(BrowsingContextCommand::LocateNodes {
            context: ContextId::new("ctx"),
            locator: NodeLocator::Css("button".to_string()),
            max_node_count: None,
        });

        let value = serde_json::to_value(&command).expect("serialize");
        assert!(value["params"].get("maxNodeCount").is_none());
    }

    #[test]
    fn test_call_function_field_names() {
        let command = Command::Script(ScriptCommand::CallFunction {
            function_declaration: "function() { return 1 }".to_string(),
            await_promise: false,
            target: ScriptTarget {
                context: ContextId::new("ctx"),
            },
            arguments: vec![],
        });

        let value = serde_json::to_value(&command).expect("serialize");
        assert_eq!(value["params"]["functionDeclaration"], "function() { return 1 }");
        assert_eq!(value["params"]["awaitPromise"], false);
        assert!(value["params"].get("arguments").is_none());
    }

    #[test]
    fn test_method_names_match_serialization() {
        let commands = [
            Command::Session(SessionCommand::Status {}),
            Command::BrowsingContext(BrowsingContextCommand::GetTree { max_depth: 0 }),
            Command::Input(InputCommand::ReleaseActions {
                context: ContextId::new("ctx"),
            }),
        ];

        for command in commands {
            let value = serde_json::to_value(&command).expect("serialize");
            assert_eq!(value["method"], command.method());
        }
    }
}
