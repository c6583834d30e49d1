//! Multi-strategy element location.
//!
//! # Algorithm
//!
//! For up to [`Locator::attempts`] rounds, against one overall deadline:
//!
//! 1. Wait for readiness with the time left.
//! 2. Probe each selector in order; the first match that reports itself
//!    displayed wins.
//! 3. Sleep the probe interval (clipped to the deadline) and retry.
//!
//! A match that is not displayed is treated as no match. Errors other than
//! [`Error::SessionLost`](crate::Error::SessionLost) count as a miss for
//! that selector.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::driver::Driver;
use crate::error::Result;
use crate::identifiers::ElementId;
use crate::wait::{ReadinessOracle, WaitBudget};

use super::candidates::CandidateSet;
use super::outcome::LocatorOutcome;
use super::selector::Selector;

// ============================================================================
// Constants
// ============================================================================

/// Default number of locate rounds.
pub const DEFAULT_ATTEMPTS: u32 = 3;

// ============================================================================
// Locator
// ============================================================================

/// Finds the first displayed element of a [`CandidateSet`].
#[derive(Debug, Clone, Copy)]
pub struct Locator {
    oracle: ReadinessOracle,
    budget: WaitBudget,
    attempts: u32,
}

impl Locator {
    /// Creates a locator with the default three attempts.
    #[must_use]
    pub fn new(oracle: ReadinessOracle, budget: WaitBudget) -> Self {
        Self {
            oracle,
            budget,
            attempts: DEFAULT_ATTEMPTS,
        }
    }

    /// Sets the number of attempts (at least one).
    #[inline]
    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Returns the default budget.
    #[inline]
    #[must_use]
    pub const fn budget(&self) -> WaitBudget {
        self.budget
    }

    /// Returns the readiness oracle consulted before each attempt.
    #[inline]
    #[must_use]
    pub const fn oracle(&self) -> &ReadinessOracle {
        &self.oracle
    }

    /// Returns the number of attempts.
    #[inline]
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Locates `set` within the default budget.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn find(&self, driver: &dyn Driver, set: &CandidateSet) -> Result<LocatorOutcome> {
        self.find_within(driver, set, &self.budget).await
    }

    /// Locates `set` within `budget`.
    ///
    /// Returns no later than `budget.total() + budget.interval()` after entry
    /// (plus driver call latency).
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn find_within(
        &self,
        driver: &dyn Driver,
        set: &CandidateSet,
        budget: &WaitBudget,
    ) -> Result<LocatorOutcome> {
        let deadline = budget.start();

        for attempt in 1..=self.attempts {
            let report = self
                .oracle
                .wait_until(driver, deadline, budget.interval())
                .await?;
            if !report.readiness.is_ready() {
                debug!(
                    label = set.label(),
                    attempt,
                    readiness = ?report.readiness,
                    "Locating on unsettled page"
                );
            }

            if let Some((element, selector)) = scan(driver, set).await? {
                info!(
                    label = set.label(),
                    selector = %selector,
                    attempt,
                    elapsed_ms = deadline.elapsed().as_millis() as u64,
                    "Located element"
                );
                return Ok(LocatorOutcome::Found { element, selector });
            }

            if attempt == self.attempts {
                break;
            }
            let pause = deadline.clip(budget.interval());
            if pause.is_zero() {
                break;
            }
            debug!(label = set.label(), attempt, "No candidate displayed, retrying");
            driver.sleep(pause).await;
        }

        Ok(not_found(set, deadline.elapsed()))
    }

    /// Probes `set` once, without waiting for readiness or retrying.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn probe_once(
        &self,
        driver: &dyn Driver,
        set: &CandidateSet,
    ) -> Result<LocatorOutcome> {
        let started = Instant::now();
        match scan(driver, set).await? {
            Some((element, selector)) => {
                info!(label = set.label(), selector = %selector, "Located element");
                Ok(LocatorOutcome::Found { element, selector })
            }
            None => Ok(not_found(set, started.elapsed())),
        }
    }

    /// Locates [`CandidateSet::any_input_field`].
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn find_any_input_field(&self, driver: &dyn Driver) -> Result<LocatorOutcome> {
        self.find(driver, &CandidateSet::any_input_field()).await
    }

    /// Locates [`CandidateSet::any_submit_button`].
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn find_any_submit_button(&self, driver: &dyn Driver) -> Result<LocatorOutcome> {
        self.find(driver, &CandidateSet::any_submit_button()).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// One pass over the set; first displayed match wins.
async fn scan(driver: &dyn Driver, set: &CandidateSet) -> Result<Option<(ElementId, Selector)>> {
    for selector in set {
        match probe(driver, selector).await {
            Ok(Some(element)) => return Ok(Some((element, selector.clone()))),
            Ok(None) => {}
            Err(e) if e.is_session_lost() => return Err(e),
            Err(e) => debug!(label = set.label(), selector = %selector, error = %e, "Probe failed"),
        }
    }
    Ok(None)
}

async fn probe(driver: &dyn Driver, selector: &Selector) -> Result<Option<ElementId>> {
    let Some(element) = driver.find_one(selector).await? else {
        return Ok(None);
    };
    if driver.is_displayed(&element).await? {
        Ok(Some(element))
    } else {
        debug!(selector = %selector, "Match not displayed");
        Ok(None)
    }
}

fn not_found(set: &CandidateSet, elapsed: Duration) -> LocatorOutcome {
    let tried: Vec<Selector> = set.selectors().to_vec();
    warn!(
        label = set.label(),
        tried = ?tried.iter().map(Selector::value).collect::<Vec<_>>(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Element not found"
    );
    LocatorOutcome::NotFound {
        label: set.label().to_string(),
        tried,
        elapsed,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::driver::{ClickAction, FakeDriver, FakeElement, FakePage, ScriptReply};

    const URL: &str = "https://www.notion.so/login";

    fn locator() -> Locator {
        let budget = WaitBudget::with_default_interval(Duration::from_secs(10)).expect("budget");
        Locator::new(ReadinessOracle::new(), budget)
    }

    fn driver_with(page: FakePage) -> FakeDriver {
        let driver = FakeDriver::new();
        driver.page(page);
        driver.start_at(URL);
        driver
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_displayed_selector_wins() {
        let driver = driver_with(
            FakePage::new(URL)
                .element(FakeElement::new("hidden-email").matches("//input[@type='email']").hidden())
                .element(FakeElement::new("text").matches("//input[@type='text']"))
                .element(FakeElement::new("any").matches("//input")),
        );

        let outcome = locator()
            .find_any_input_field(&driver)
            .await
            .expect("locate");

        assert_eq!(outcome.element(), Some(&ElementId::new("text")));
        assert_eq!(outcome.selector().map(Selector::value), Some("//input[@type='text']"));
        assert_eq!(driver.finds("//input"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_lists_every_candidate() {
        let driver = driver_with(FakePage::new(URL));
        let start = Instant::now();

        let outcome = locator()
            .find_any_submit_button(&driver)
            .await
            .expect("locate");

        let LocatorOutcome::NotFound { label, tried, elapsed } = outcome else {
            panic!("expected miss");
        };
        assert_eq!(label, "any submit button");
        assert_eq!(tried.len(), 11);
        // Three attempts, two 2 s sleeps between them.
        assert_eq!(elapsed, Duration::from_secs(4));
        assert_eq!(start.elapsed(), Duration::from_secs(4));
        assert_eq!(driver.finds("//button"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_element_appearing_on_second_attempt() {
        let driver = driver_with(FakePage::new(URL).element(
            FakeElement::new("late")
                .matches("//button[@type='submit']")
                .appears_after(1),
        ));

        let outcome = locator()
            .find_any_submit_button(&driver)
            .await
            .expect("locate");

        assert!(outcome.is_found());
        assert_eq!(driver.sleeps(), vec![Duration::from_secs(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revealed_element_is_found_later() {
        let driver = driver_with(
            FakePage::new(URL)
                .element(FakeElement::new("menu").matches("//nav").hidden())
                .element(
                    FakeElement::new("toggle")
                        .on_click(ClickAction::Reveal(ElementId::new("menu"))),
                ),
        );
        let set = CandidateSet::xpaths("menu", &["//nav"]);

        assert!(!locator().probe_once(&driver, &set).await.expect("probe").is_found());
        driver.click(&ElementId::new("toggle")).await.expect("click");
        assert!(locator().probe_once(&driver, &set).await.expect("probe").is_found());
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_exceeds_total_plus_interval() {
        let driver = driver_with(FakePage::new(URL).script("readyState", json!(false)));
        let budget = WaitBudget::new(Duration::from_secs(7), Duration::from_secs(3)).expect("budget");
        let start = Instant::now();

        let outcome = locator()
            .find_within(&driver, &CandidateSet::any_input_field(), &budget)
            .await
            .expect("locate");

        assert!(!outcome.is_found());
        assert!(start.elapsed() <= budget.total() + budget.interval());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_misses() {
        let driver = driver_with(
            FakePage::new(URL)
                .script("readyState", ScriptReply::Throw("detached".into()))
                .element(FakeElement::new("email").matches("//input[@type='email']")),
        );

        let outcome = locator()
            .find_any_input_field(&driver)
            .await
            .expect("locate");
        assert!(outcome.is_found());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_lost_propagates() {
        let driver = driver_with(FakePage::new(URL));
        driver.kill();

        let err = locator()
            .find_any_input_field(&driver)
            .await
            .expect_err("session lost");
        assert!(err.is_session_lost());
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt() {
        let driver = driver_with(FakePage::new(URL));
        let outcome = locator()
            .with_attempts(1)
            .find_any_submit_button(&driver)
            .await
            .expect("locate");
        assert!(!outcome.is_found());
        assert!(driver.sleeps().is_empty());
    }
}
