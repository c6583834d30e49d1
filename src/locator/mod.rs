//! Element location across an unstable client-rendered page.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Selector`] | Query language plus original text |
//! | [`CandidateSet`] | Labelled, ordered selectors |
//! | [`Locator`] | Readiness-aware multi-attempt search |
//! | [`LocatorOutcome`] | `Found` or `NotFound` |

// ============================================================================
// Submodules
// ============================================================================

/// Candidate sets and the fixed input/submit sets.
pub mod candidates;

/// The locate loop.
pub mod engine;

/// Locate results.
pub mod outcome;

/// Selector values.
pub mod selector;

// ============================================================================
// Re-exports
// ============================================================================

pub use candidates::{ANY_INPUT_FIELD, ANY_SUBMIT_BUTTON, CandidateSet};
pub use engine::{DEFAULT_ATTEMPTS, Locator};
pub use outcome::LocatorOutcome;
pub use selector::Selector;
