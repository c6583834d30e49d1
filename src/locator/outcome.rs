//! Locator outcomes.

use std::time::Duration;

use crate::identifiers::ElementId;

use super::selector::Selector;

// ============================================================================
// LocatorOutcome
// ============================================================================

/// Result of a locator call.
///
/// A miss is a value, not an error. `Found` always carries a handle;
/// `NotFound` never does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorOutcome {
    /// A displayed element matched.
    Found {
        /// Handle of the matched element.
        element: ElementId,
        /// Selector that produced it.
        selector: Selector,
    },
    /// Every candidate missed for the whole budget.
    NotFound {
        /// Semantic label of the candidate set.
        label: String,
        /// Selectors tried, in order.
        tried: Vec<Selector>,
        /// Time spent before giving up.
        elapsed: Duration,
    },
}

impl LocatorOutcome {
    /// Returns `true` for [`LocatorOutcome::Found`].
    #[inline]
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// Returns the element handle, if found.
    #[inline]
    #[must_use]
    pub fn element(&self) -> Option<&ElementId> {
        match self {
            Self::Found { element, .. } => Some(element),
            Self::NotFound { .. } => None,
        }
    }

    /// Returns the winning selector, if found.
    #[inline]
    #[must_use]
    pub fn selector(&self) -> Option<&Selector> {
        match self {
            Self::Found { selector, .. } => Some(selector),
            Self::NotFound { .. } => None,
        }
    }

    /// Consumes the outcome, returning the element handle if found.
    #[inline]
    #[must_use]
    pub fn into_element(self) -> Option<ElementId> {
        match self {
            Self::Found { element, .. } => Some(element),
            Self::NotFound { .. } => None,
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
    fn test_found_exposes_handle() {
        let outcome = LocatorOutcome::Found {
            element: ElementId::new("n-1"),
            selector: Selector::xpath("//button"),
        };
        assert!(outcome.is_found());
        assert_eq!(outcome.selector().map(Selector::value), Some("//button"));
        assert_eq!(outcome.into_element(), Some(ElementId::new("n-1")));
    }

    #[test]
    fn test_not_found_has_no_handle() {
        let outcome = LocatorOutcome::NotFound {
            label: "submit button".into(),
            tried: vec![Selector::xpath("//button")],
            elapsed: Duration::from_secs(4),
        };
        assert!(!outcome.is_found());
        assert!(outcome.element().is_none());
        assert!(outcome.selector().is_none());
    }
}
