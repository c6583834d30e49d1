//! Candidate sets: ordered selectors bound to a semantic label.
//!
//! Order is priority. The locator never scores matches; the earliest
//! selector with a displayed match wins.

use std::fmt;
use std::sync::Arc;

use super::selector::Selector;

// ============================================================================
// Fixed Sets
// ============================================================================

/// Label of [`CandidateSet::any_input_field`].
pub const ANY_INPUT_FIELD_LABEL: &str = "any input field";

/// Label of [`CandidateSet::any_submit_button`].
pub const ANY_SUBMIT_BUTTON_LABEL: &str = "any submit button";

/// Input probe order, most specific first.
pub const ANY_INPUT_FIELD: [&str; 10] = [
    "//input[@type='email']",
    "//input[contains(@placeholder, 'email')]",
    "//input[contains(@placeholder, 'Email')]",
    "//input[contains(@name, 'email')]",
    "//input[contains(@id, 'email')]",
    "//input[@type='text']",
    "//input",
    "//*[@contenteditable='true']",
    "//div[contains(@class, 'input')]//input",
    "//form//input",
];

/// Submit probe order, most specific first.
pub const ANY_SUBMIT_BUTTON: [&str; 11] = [
    "//button[contains(text(), 'Continue')]",
    "//button[contains(text(), 'Continue with email')]",
    "//button[contains(text(), 'Log in')]",
    "//button[contains(text(), 'Sign in')]",
    "//button[@type='submit']",
    "//input[@type='submit']",
    "//button[contains(@class, 'submit')]",
    "//button[contains(@class, 'primary')]",
    "//button",
    "//div[contains(@role, 'button')]",
    "//*[contains(@onclick, 'submit')]",
];

// ============================================================================
// CandidateSet
// ============================================================================

/// An immutable, ordered list of selectors for one semantic element.
///
/// Cloning is cheap: the selectors are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    label: Arc<str>,
    selectors: Arc<[Selector]>,
}

impl CandidateSet {
    /// Creates a set from selectors in priority order.
    pub fn new<S>(label: &str, selectors: impl IntoIterator<Item = S>) -> Self
    where
        S: Into<Selector>,
    {
        Self {
            label: Arc::from(label),
            selectors: selectors.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a set of XPath selectors.
    #[must_use]
    pub fn xpaths(label: &str, expressions: &[&str]) -> Self {
        Self::new(label, expressions.iter().map(|e| Selector::xpath(*e)))
    }

    /// Any visible text-entry field.
    #[must_use]
    pub fn any_input_field() -> Self {
        Self::xpaths(ANY_INPUT_FIELD_LABEL, &ANY_INPUT_FIELD)
    }

    /// Any visible submit control.
    #[must_use]
    pub fn any_submit_button() -> Self {
        Self::xpaths(ANY_SUBMIT_BUTTON_LABEL, &ANY_SUBMIT_BUTTON)
    }

    /// Returns the semantic label.
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the selectors in priority order.
    #[inline]
    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Returns the number of selectors.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Returns `true` if there are no selectors.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Iterates selectors in priority order.
    pub fn iter(&self) -> std::slice::Iter<'_, Selector> {
        self.selectors.iter()
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Selector;
    type IntoIter = std::slice::Iter<'a, Selector>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for CandidateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} candidates)", self.label, self.selectors.len())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_preserved() {
        let set = CandidateSet::xpaths("menu", &["//a", "//b", "//c"]);
        let values: Vec<&str> = set.iter().map(Selector::value).collect();
        assert_eq!(values, ["//a", "//b", "//c"]);
        assert_eq!(set.label(), "menu");
    }

    #[test]
    fn test_any_input_field_prefers_email() {
        let set = CandidateSet::any_input_field();
        assert_eq!(set.len(), 10);
        assert_eq!(set.selectors()[0].value(), "//input[@type='email']");
        assert_eq!(set.selectors()[6].value(), "//input");
    }

    #[test]
    fn test_any_submit_button_prefers_continue() {
        let set = CandidateSet::any_submit_button();
        assert_eq!(set.len(), 11);
        assert_eq!(
            set.selectors()[0].value(),
            "//button[contains(text(), 'Continue')]"
        );
        assert_eq!(
            set.selectors()[10].value(),
            "//*[contains(@onclick, 'submit')]"
        );
    }

    #[test]
    fn test_clone_shares_selectors() {
        let set = CandidateSet::any_submit_button();
        let copy = set.clone();
        assert!(Arc::ptr_eq(&set.selectors, &copy.selectors));
    }
}
