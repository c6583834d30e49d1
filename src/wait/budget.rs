//! Wait budgets and deadlines.
//!
//! Every wait in the crate is bounded by a [`WaitBudget`]: a total deadline
//! plus the sleep between probes.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default sleep between readiness polls and locator attempts.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(2);

// ============================================================================
// WaitBudget
// ============================================================================

/// `(total_deadline, probe_interval)` with `probe_interval < total_deadline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitBudget {
    total: Duration,
    interval: Duration,
}

impl WaitBudget {
    /// Creates a budget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] unless `0 < interval < total`.
    pub fn new(total: Duration, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::invalid_argument("probe interval must be positive"));
        }
        if interval >= total {
            return Err(Error::invalid_argument(format!(
                "probe interval {interval:?} must be shorter than total deadline {total:?}"
            )));
        }
        Ok(Self { total, interval })
    }

    /// Creates a budget with the default 2 s probe interval.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `total` is not above 2 s.
    pub fn with_default_interval(total: Duration) -> Result<Self> {
        Self::new(total, DEFAULT_PROBE_INTERVAL)
    }

    /// Returns a budget of `total` whose interval is at most half of it.
    ///
    /// Used for short optional steps where a missing element is expected.
    #[must_use]
    pub fn shortened(&self, total: Duration) -> Self {
        let total = total.max(Duration::from_millis(2));
        Self {
            total,
            interval: self.interval.min(total / 2),
        }
    }

    /// Returns the total deadline.
    #[inline]
    #[must_use]
    pub const fn total(&self) -> Duration {
        self.total
    }

    /// Returns the probe interval.
    #[inline]
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts the clock.
    #[inline]
    #[must_use]
    pub fn start(&self) -> Deadline {
        Deadline::after(self.total)
    }
}

// ============================================================================
// Deadline
// ============================================================================

/// Stand-in for a deadline too far out to represent.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A point in time a wait must not run past.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    started: Instant,
    at: Instant,
}

impl Deadline {
    /// A deadline `within` from now.
    #[must_use]
    pub fn after(within: Duration) -> Self {
        let started = Instant::now();
        let at = started
            .checked_add(within)
            .unwrap_or_else(|| started + FAR_FUTURE);
        Self { started, at }
    }

    /// Time left, zero once expired.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Time since the deadline was started.
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The full span this deadline was created with.
    #[inline]
    #[must_use]
    pub fn span(&self) -> Duration {
        self.at.saturating_duration_since(self.started)
    }

    /// Returns `true` once no time is left.
    #[inline]
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// `interval`, clipped to the time left.
    #[inline]
    #[must_use]
    pub fn clip(&self, interval: Duration) -> Duration {
        interval.min(self.remaining())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_requires_interval_below_total() {
        assert!(WaitBudget::new(Duration::from_secs(10), Duration::from_secs(2)).is_ok());
        assert!(WaitBudget::new(Duration::from_secs(2), Duration::from_secs(2)).is_err());
        assert!(WaitBudget::new(Duration::from_secs(1), Duration::from_secs(2)).is_err());
        assert!(WaitBudget::new(Duration::from_secs(1), Duration::ZERO).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_deadline_saturates() {
        let deadline = Deadline::after(Duration::MAX);
        assert!(!deadline.is_expired());
        assert_eq!(deadline.clip(Duration::from_secs(2)), Duration::from_secs(2));
        assert_eq!(deadline.span(), FAR_FUTURE);
    }

    #[test]
    fn test_with_default_interval() {
        let budget = WaitBudget::with_default_interval(Duration::from_secs(20)).expect("budget");
        assert_eq!(budget.interval(), DEFAULT_PROBE_INTERVAL);
        assert_eq!(budget.total(), Duration::from_secs(20));
    }

    #[test]
    fn test_shortened_keeps_interval_below_total() {
        let budget = WaitBudget::with_default_interval(Duration::from_secs(20)).expect("budget");
        let short = budget.shortened(Duration::from_secs(3));
        assert_eq!(short.total(), Duration::from_secs(3));
        assert!(short.interval() < short.total());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_counts_down() {
        let deadline = Deadline::after(Duration::from_secs(5));
        assert_eq!(deadline.remaining(), Duration::from_secs(5));

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(deadline.remaining(), Duration::from_secs(2));
        assert_eq!(deadline.clip(Duration::from_secs(4)), Duration::from_secs(2));

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(deadline.is_expired());
        assert_eq!(deadline.elapsed(), Duration::from_secs(6));
        assert_eq!(deadline.span(), Duration::from_secs(5));
    }
}
