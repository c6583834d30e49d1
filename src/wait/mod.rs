//! Bounded waits over a [`Driver`](crate::Driver).
//!
//! | Type | Description |
//! |------|-------------|
//! | [`WaitBudget`] | `(total_deadline, probe_interval)` pair |
//! | [`Deadline`] | A running budget |
//! | [`ReadinessOracle`] | Page readiness probes and URL/title waits |
//! | [`ReadinessReport`] | Readiness outcome with measurements |

// ============================================================================
// Submodules
// ============================================================================

/// Wait budgets and deadlines.
pub mod budget;

/// Readiness probes.
pub mod oracle;

// ============================================================================
// Re-exports
// ============================================================================

pub use budget::{DEFAULT_PROBE_INTERVAL, Deadline, WaitBudget};
pub use oracle::{
    DEFAULT_CHANGE_POLL, DEFAULT_FRAMEWORK_GRACE, Probe, Readiness, ReadinessOracle,
    ReadinessReport,
};
