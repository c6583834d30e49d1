//! Event message types.
//!
//! Events are notifications the remote end pushes once the session has
//! subscribed to them with `session.subscribe`.
//!
//! # Event Types
//!
//! | Module | Events used by this crate |
//! |--------|---------------------------|
//! | `browsingContext` | `load`, `navigationStarted` |
//! | `log` | `entryAdded` |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

// ============================================================================
// Event
// ============================================================================

/// An event notification from remote end to local end.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Event name in `module.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,
}

impl Event {
    /// Returns the module name from the method.
    #[inline]
    #[must_use]
    pub fn module(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name from the method.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method.split('.').nth(1).unwrap_or_default()
    }

    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        let get_str = |key: &str| {
            self.params
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        match self.method.as_str() {
            "browsingContext.load" => ParsedEvent::Load {
                context: get_str("context"),
                url: get_str("url"),
            },
            "browsingContext.navigationStarted" => ParsedEvent::NavigationStarted {
                context: get_str("context"),
                url: get_str("url"),
            },
            "log.entryAdded" => ParsedEvent::LogEntry {
                level: get_str("level"),
                text: get_str("text"),
            },
            _ => ParsedEvent::Unknown {
                method: self.method.clone(),
            },
        }
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Typed view of the events this crate subscribes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEvent {
    /// Page `load` fired.
    Load {
        /// Context ID.
        context: String,
        /// Loaded URL.
        url: String,
    },
    /// Navigation started.
    NavigationStarted {
        /// Context ID.
        context: String,
        /// Target URL.
        url: String,
    },
    /// Console or JavaScript log entry.
    LogEntry {
        /// `debug`, `info`, `warn` or `error`.
        level: String,
        /// Entry text.
        text: String,
    },
    /// Any other event.
    Unknown {
        /// Event method.
        method: String,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn event(method: &str, params: Value) -> Event {
        Event {
            method: method.to_string(),
            params,
        }
    }

    #[test]
    fn test_module_and_name() {
        let e = event("browsingContext.load", json!({}));
        assert_eq!(e.module(), "browsingContext");
        assert_eq!(e.event_name(), "load");
    }

    #[test]
    fn test_parse_log_entry() {
        let e = event(
            "log.entryAdded",
            json!({"level": "error", "text": "Uncaught TypeError"}),
        );
        assert_eq!(
            e.parse(),
            ParsedEvent::LogEntry {
                level: "error".to_string(),
                text: "Uncaught TypeError".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_unknown() {
        let e = event("network.responseCompleted", json!({}));
        assert!(matches!(e.parse(), ParsedEvent::Unknown { .. }));
    }
}
