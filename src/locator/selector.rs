//! Element query values.
//!
//! A [`Selector`] pairs a query language with the original query text. The
//! text is kept verbatim so diagnostics print exactly what was tried.
//!
//! # Example
//!
//! ```ignore
//! use notion_e2e::Selector;
//!
//! let email = Selector::xpath("//input[@type='email']");
//! let submit = Selector::css("button[type=submit]");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::NodeLocator;

// ============================================================================
// Selector
// ============================================================================

/// Element query strategy with its original text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "value")]
pub enum Selector {
    /// XPath expression.
    ///
    /// # Example
    /// ```ignore
    /// Selector::XPath("//button[contains(text(), 'Continue')]".into())
    /// ```
    #[serde(rename = "xpath")]
    XPath(String),

    /// CSS selector.
    ///
    /// # Example
    /// ```ignore
    /// Selector::Css("input[type=email]".into())
    /// ```
    #[serde(rename = "css")]
    Css(String),
}

impl Selector {
    /// Creates an XPath selector.
    #[inline]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Creates a CSS selector.
    #[inline]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Returns the query language tag.
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::XPath(_) => "xpath",
            Self::Css(_) => "css",
        }
    }

    /// Returns the original query text.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::XPath(v) | Self::Css(v) => v,
        }
    }

    /// Converts to the BiDi `locateNodes` locator.
    #[must_use]
    pub fn to_node_locator(&self) -> NodeLocator {
        match self {
            Self::XPath(v) => NodeLocator::XPath(v.clone()),
            Self::Css(v) => NodeLocator::Css(v.clone()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.strategy(), self.value())
    }
}

// ============================================================================
// From implementations for ergonomics
// ============================================================================

impl From<&str> for Selector {
    /// Converts a string to an XPath selector (the suite's default language).
    fn from(s: &str) -> Self {
        Self::XPath(s.to_string())
    }
}

impl From<String> for Selector {
    /// Converts a string to an XPath selector (the suite's default language).
    fn from(s: String) -> Self {
        Self::XPath(s)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_xpath() {
        let selector = Selector::xpath("//button");
        assert_eq!(selector.strategy(), "xpath");
        assert_eq!(selector.value(), "//button");
    }

    #[test]
    fn test_selector_css() {
        let selector = Selector::css("#login");
        assert_eq!(selector.strategy(), "css");
        assert_eq!(selector.value(), "#login");
    }

    #[test]
    fn test_from_str_is_xpath() {
        let selector: Selector = "//input".into();
        assert!(matches!(selector, Selector::XPath(_)));
    }

    #[test]
    fn test_display_keeps_original_text() {
        let selector = Selector::xpath("//input[contains(@name, 'email')]");
        assert_eq!(
            selector.to_string(),
            "xpath://input[contains(@name, 'email')]"
        );
    }

    #[test]
    fn test_to_node_locator() {
        assert_eq!(
            Selector::css("nav a").to_node_locator(),
            NodeLocator::Css("nav a".to_string())
        );
    }
}
