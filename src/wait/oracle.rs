//! Readiness Oracle: decides when a client-rendered page has settled.
//!
//! # Probes
//!
//! Evaluated in order, stopping at the first failure:
//!
//! | Probe | Passes when |
//! |-------|-------------|
//! | [`Probe::DocumentReady`] | `document.readyState === "complete"` |
//! | [`Probe::NoJQueryActivity`] | jQuery absent or `jQuery.active === 0` |
//! | [`Probe::FrameworkRoot`] | React/Vue/Angular global or root marker present (soft) |
//! | [`Probe::NetworkQuiescent`] | no resource entry with `responseEnd === 0` |
//! | [`Probe::NoLoadingIndicator`] | no node whose class matches `/loading\|spinner/i` |
//!
//! A failing soft probe blocks only during the first third of the budget.
//! After that it costs one grace sleep and is then waived for the rest of
//! the call.
//!
//! Timeouts are not errors: [`ReadinessOracle::wait_until_ready`] reports
//! [`Readiness::ReadyEnough`] and the caller proceeds in a degraded state.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::driver::Driver;
use crate::error::Result;
use crate::locator::Selector;

use super::budget::{Deadline, WaitBudget};

// ============================================================================
// Constants
// ============================================================================

/// Default grace sleep spent on a missing framework root.
pub const DEFAULT_FRAMEWORK_GRACE: Duration = Duration::from_secs(2);

/// Default poll interval for URL and title waits.
pub const DEFAULT_CHANGE_POLL: Duration = Duration::from_millis(500);

/// Cadence of [`ReadinessOracle::wait_for_dynamic_content`].
const DYNAMIC_CONTENT_POLL: Duration = Duration::from_secs(2);

/// Settling pause once dynamic content shows up.
const DYNAMIC_CONTENT_SETTLE: Duration = Duration::from_secs(1);

const MODERN_SPA_SCRIPT: &str = "return typeof window.React !== 'undefined' \
    || typeof window.Vue !== 'undefined' \
    || typeof window.angular !== 'undefined' \
    || document.querySelector('[data-reactroot], [ng-app], [data-vue-app]') !== null \
    || window.location.hash.length > 1;";

const LOADING_COUNT_SCRIPT: &str = "return Array.from(document.querySelectorAll('[class]'))\
    .filter(function (el) { return /loading|spinner/i.test(el.getAttribute('class') || ''); })\
    .length;";

// ============================================================================
// Probe
// ============================================================================

/// A single readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    /// Document finished loading.
    DocumentReady,
    /// No jQuery requests in flight.
    NoJQueryActivity,
    /// Framework global or root marker present.
    FrameworkRoot,
    /// No unresolved resource fetches.
    NetworkQuiescent,
    /// No loading or spinner nodes.
    NoLoadingIndicator,
}

impl Probe {
    /// All probes, in evaluation order.
    pub const ALL: [Self; 5] = [
        Self::DocumentReady,
        Self::NoJQueryActivity,
        Self::FrameworkRoot,
        Self::NetworkQuiescent,
        Self::NoLoadingIndicator,
    ];

    /// Script body returning `true` when the probe passes.
    #[must_use]
    pub const fn script(self) -> &'static str {
        match self {
            Self::DocumentReady => "return document.readyState === 'complete';",
            Self::NoJQueryActivity => {
                "return typeof jQuery === 'undefined' || jQuery.active === 0;"
            }
            Self::FrameworkRoot => {
                "return typeof window.React !== 'undefined' \
                 || typeof window.Vue !== 'undefined' \
                 || typeof window.angular !== 'undefined' \
                 || document.querySelector('[data-reactroot], [data-react-helmet], \
                    [ng-app], [ng-version], [data-vue-app], [data-v-app]') !== null;"
            }
            Self::NetworkQuiescent => {
                "return typeof window.performance === 'undefined' \
                 || typeof performance.getEntriesByType !== 'function' \
                 || performance.getEntriesByType('resource')\
                    .filter(function (r) { return r.responseEnd === 0; }).length === 0;"
            }
            Self::NoLoadingIndicator => {
                "return !Array.from(document.querySelectorAll('[class]'))\
                    .some(function (el) { return /loading|spinner/i.test(el.getAttribute('class') || ''); });"
            }
        }
    }

    /// Returns `true` for probes that only block early in the budget.
    #[inline]
    #[must_use]
    pub const fn is_soft(self) -> bool {
        matches!(self, Self::FrameworkRoot)
    }

    /// Probe name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DocumentReady => "document_ready",
            Self::NoJQueryActivity => "no_jquery_activity",
            Self::FrameworkRoot => "framework_root",
            Self::NetworkQuiescent => "network_quiescent",
            Self::NoLoadingIndicator => "no_loading_indicator",
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Readiness
// ============================================================================

/// Outcome of a readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Every hard probe passed.
    Ready,
    /// The budget ran out; `blocking` was still failing.
    ReadyEnough {
        /// Probe that failed on the last poll.
        blocking: Probe,
    },
}

impl Readiness {
    /// Returns `true` for [`Readiness::Ready`].
    #[inline]
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Readiness plus measurements of how it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessReport {
    /// Final state.
    pub readiness: Readiness,
    /// Time spent in the call.
    pub elapsed: Duration,
    /// Number of probe rounds evaluated.
    pub polls: u32,
    /// Whether the framework-root probe passed at least once.
    pub framework_detected: bool,
    /// Whether the framework grace sleep was spent.
    pub grace_spent: bool,
}

// ============================================================================
// ReadinessOracle
// ============================================================================

/// Composes the readiness probes over a [`Driver`].
#[derive(Debug, Clone, Copy)]
pub struct ReadinessOracle {
    framework_grace: Duration,
    change_poll: Duration,
}

impl Default for ReadinessOracle {
    fn default() -> Self {
        Self {
            framework_grace: DEFAULT_FRAMEWORK_GRACE,
            change_poll: DEFAULT_CHANGE_POLL,
        }
    }
}

impl ReadinessOracle {
    /// Creates an oracle with default grace and poll settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the grace sleep spent on a missing framework root.
    #[inline]
    #[must_use]
    pub fn with_framework_grace(mut self, grace: Duration) -> Self {
        self.framework_grace = grace;
        self
    }

    /// Sets the poll interval for URL and title waits.
    #[inline]
    #[must_use]
    pub fn with_change_poll(mut self, poll: Duration) -> Self {
        self.change_poll = poll;
        self
    }

    /// Returns the framework grace sleep.
    #[inline]
    #[must_use]
    pub const fn framework_grace(&self) -> Duration {
        self.framework_grace
    }

    /// Polls every `budget.interval()` until all hard probes pass or
    /// `budget.total()` elapses.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost); every other
    /// failure counts as a failing probe.
    pub async fn wait_until_ready(
        &self,
        driver: &dyn Driver,
        budget: &WaitBudget,
    ) -> Result<ReadinessReport> {
        self.wait_until(driver, budget.start(), budget.interval())
            .await
    }

    /// [`wait_until_ready`](Self::wait_until_ready) against an existing
    /// deadline.
    pub(crate) async fn wait_until(
        &self,
        driver: &dyn Driver,
        deadline: Deadline,
        interval: Duration,
    ) -> Result<ReadinessReport> {
        let soft_window = deadline.span() / 3;

        let mut polls = 0;
        let mut framework_detected = false;
        let mut grace_spent = false;
        let mut waived = false;

        loop {
            polls += 1;
            let failing = self
                .first_failing(driver, waived, &mut framework_detected)
                .await?;

            match failing {
                None => {
                    debug!(polls, elapsed_ms = deadline.elapsed().as_millis() as u64, "Page ready");
                    return Ok(ReadinessReport {
                        readiness: Readiness::Ready,
                        elapsed: deadline.elapsed(),
                        polls,
                        framework_detected,
                        grace_spent,
                    });
                }
                Some(probe) if probe.is_soft() && deadline.elapsed() >= soft_window => {
                    let grace = deadline.clip(self.framework_grace);
                    debug!(probe = %probe, grace_ms = grace.as_millis() as u64, "Waiving soft probe");
                    if !grace.is_zero() {
                        driver.sleep(grace).await;
                    }
                    grace_spent = true;
                    waived = true;
                }
                Some(probe) => {
                    let pause = deadline.clip(interval);
                    if pause.is_zero() {
                        warn!(
                            probe = %probe,
                            polls,
                            elapsed_ms = deadline.elapsed().as_millis() as u64,
                            "Readiness budget exhausted, proceeding"
                        );
                        return Ok(ReadinessReport {
                            readiness: Readiness::ReadyEnough { blocking: probe },
                            elapsed: deadline.elapsed(),
                            polls,
                            framework_detected,
                            grace_spent,
                        });
                    }
                    driver.sleep(pause).await;
                }
            }
        }
    }

    /// Evaluates probes in order; returns the first failing one.
    async fn first_failing(
        &self,
        driver: &dyn Driver,
        skip_soft: bool,
        framework_detected: &mut bool,
    ) -> Result<Option<Probe>> {
        for probe in Probe::ALL {
            if skip_soft && probe.is_soft() {
                continue;
            }
            let passed = self.evaluate(driver, probe).await?;
            if probe == Probe::FrameworkRoot && passed {
                *framework_detected = true;
            }
            if !passed {
                return Ok(Some(probe));
            }
        }
        Ok(None)
    }

    /// Runs one probe; any failure short of session loss reads as `false`.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn evaluate(&self, driver: &dyn Driver, probe: Probe) -> Result<bool> {
        script_flag(driver, probe.script(), probe.name()).await
    }

    /// Polls the current URL until it differs from `baseline`.
    ///
    /// Returns `false` if it never changed within `within`.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn wait_for_url_change(
        &self,
        driver: &dyn Driver,
        baseline: &str,
        within: Duration,
    ) -> Result<bool> {
        let deadline = Deadline::after(within);
        loop {
            match driver.current_url().await {
                Ok(url) if url != baseline => {
                    info!(from = baseline, to = %url, "URL changed");
                    return Ok(true);
                }
                Ok(_) => {}
                Err(e) if e.is_session_lost() => return Err(e),
                Err(e) => debug!(error = %e, "URL read failed"),
            }

            let pause = deadline.clip(self.change_poll);
            if pause.is_zero() {
                debug!(url = baseline, "URL unchanged");
                return Ok(false);
            }
            driver.sleep(pause).await;
        }
    }

    /// Polls the title until `predicate` accepts it.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn wait_for_title(
        &self,
        driver: &dyn Driver,
        predicate: &(dyn Fn(&str) -> bool + Send + Sync),
        within: Duration,
    ) -> Result<bool> {
        let deadline = Deadline::after(within);
        loop {
            match driver.title().await {
                Ok(title) if predicate(&title) => {
                    debug!(title = %title, "Title matched");
                    return Ok(true);
                }
                Ok(_) => {}
                Err(e) if e.is_session_lost() => return Err(e),
                Err(e) => debug!(error = %e, "Title read failed"),
            }

            let pause = deadline.clip(self.change_poll);
            if pause.is_zero() {
                return Ok(false);
            }
            driver.sleep(pause).await;
        }
    }

    /// Waits for any `input`, `button` or `form` to render.
    ///
    /// Checks every 2 s, `max_wait / 2` times (at least once), and pauses 1 s
    /// once content appears. Logs loading indicators and network activity
    /// seen while waiting.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn wait_for_dynamic_content(
        &self,
        driver: &dyn Driver,
        max_wait: Duration,
    ) -> Result<bool> {
        let attempts = (max_wait.as_secs() / DYNAMIC_CONTENT_POLL.as_secs()).max(1);
        let interactive = Selector::css("input, button, form");

        for attempt in 1..=attempts {
            match driver.find_all(&interactive).await {
                Ok(found) if !found.is_empty() => {
                    info!(attempt, elements = found.len(), "Dynamic content rendered");
                    driver.sleep(DYNAMIC_CONTENT_SETTLE).await;
                    return Ok(true);
                }
                Ok(_) => {}
                Err(e) if e.is_session_lost() => return Err(e),
                Err(e) => debug!(attempt, error = %e, "Content probe failed"),
            }

            let loading = script_value(driver, LOADING_COUNT_SCRIPT)
                .await?
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            if loading > 0 {
                debug!(attempt, loading, "Loading indicators present");
            }
            if !self.evaluate(driver, Probe::NetworkQuiescent).await? {
                debug!(attempt, "Network requests in flight");
            }

            if attempt < attempts {
                driver.sleep(DYNAMIC_CONTENT_POLL).await;
            }
        }

        warn!(max_wait_ms = max_wait.as_millis() as u64, "No dynamic content rendered");
        Ok(false)
    }

    /// Returns `true` if the page looks like a client-rendered app.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn is_modern_spa(&self, driver: &dyn Driver) -> Result<bool> {
        script_flag(driver, MODERN_SPA_SCRIPT, "modern_spa").await
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Runs a boolean script; anything but a `true` result reads as `false`.
async fn script_flag(driver: &dyn Driver, source: &str, probe: &str) -> Result<bool> {
    match driver.execute_script(source).await {
        Ok(value) => Ok(value.as_bool().unwrap_or(false)),
        Err(e) if e.is_session_lost() => Err(e),
        Err(e) => {
            debug!(probe, error = %e, "Probe failed");
            Ok(false)
        }
    }
}

/// Runs a script, mapping failures short of session loss to `None`.
async fn script_value(driver: &dyn Driver, source: &str) -> Result<Option<Value>> {
    match driver.execute_script(source).await {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_session_lost() => Err(e),
        Err(_) => Ok(None),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::time::Instant;

    use super::*;
    use crate::driver::{FakeDriver, FakeElement, FakePage, ScriptReply};

    const URL: &str = "https://www.notion.so";

    fn budget(total: u64) -> WaitBudget {
        WaitBudget::with_default_interval(Duration::from_secs(total)).expect("budget")
    }

    fn driver_with(page: FakePage) -> FakeDriver {
        let driver = FakeDriver::new();
        driver.page(page);
        driver.start_at(URL);
        driver
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_page_returns_without_sleep() {
        let driver = driver_with(FakePage::new(URL));
        let report = ReadinessOracle::new()
            .wait_until_ready(&driver, &budget(20))
            .await
            .expect("ready");

        assert_eq!(report.readiness, Readiness::Ready);
        assert_eq!(report.polls, 1);
        assert!(report.framework_detected);
        assert!(driver.sleeps().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_on_first_ready_poll() {
        let driver = driver_with(FakePage::new(URL).script_sequence(
            "readyState",
            [
                ScriptReply::Value(json!(false)),
                ScriptReply::Value(json!(false)),
                ScriptReply::Value(json!(true)),
            ],
        ));

        let report = ReadinessOracle::new()
            .wait_until_ready(&driver, &budget(20))
            .await
            .expect("ready");

        assert!(report.readiness.is_ready());
        assert_eq!(report.polls, 3);
        assert_eq!(driver.sleeps(), vec![Duration::from_secs(2); 2]);
        assert_eq!(report.elapsed, Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_ready_enough() {
        let driver = driver_with(FakePage::new(URL).script("spinner", json!(false)));
        let start = Instant::now();

        let report = ReadinessOracle::new()
            .wait_until_ready(&driver, &budget(5))
            .await
            .expect("degraded, not failed");

        assert_eq!(
            report.readiness,
            Readiness::ReadyEnough {
                blocking: Probe::NoLoadingIndicator
            }
        );
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_circuits_on_first_failure() {
        let driver = driver_with(FakePage::new(URL).script("readyState", json!(false)));

        ReadinessOracle::new()
            .wait_until_ready(&driver, &budget(3))
            .await
            .expect("degraded");

        assert!(driver.scripts_containing("readyState") >= 1);
        assert_eq!(driver.scripts_containing("jQuery"), 0);
        assert_eq!(driver.scripts_containing("spinner"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_script_error_counts_as_failing_probe() {
        let driver = driver_with(
            FakePage::new(URL).script("jQuery", ScriptReply::Throw("jQuery is broken".into())),
        );

        let report = ReadinessOracle::new()
            .wait_until_ready(&driver, &budget(3))
            .await
            .expect("degraded");

        assert_eq!(
            report.readiness,
            Readiness::ReadyEnough {
                blocking: Probe::NoJQueryActivity
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_framework_root_costs_one_grace() {
        let driver = driver_with(FakePage::new(URL).script("React", json!(false)));
        let start = Instant::now();

        let report = ReadinessOracle::new()
            .wait_until_ready(&driver, &budget(9))
            .await
            .expect("ready");

        assert!(report.readiness.is_ready());
        assert!(report.grace_spent);
        assert!(!report.framework_detected);
        // Blocks two polls (0 s, 2 s), waived from 4 s after a 2 s grace.
        assert_eq!(
            driver.sleeps(),
            vec![Duration::from_secs(2), Duration::from_secs(2), Duration::from_secs(2)]
        );
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_lost_propagates() {
        let driver = driver_with(FakePage::new(URL));
        driver.kill();

        let err = ReadinessOracle::new()
            .wait_until_ready(&driver, &budget(5))
            .await
            .expect_err("session lost");
        assert!(err.is_session_lost());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_url_change() {
        let driver = FakeDriver::new();
        driver.page(FakePage::new(URL));
        driver.start_at(URL);

        let oracle = ReadinessOracle::new();
        assert!(!oracle
            .wait_for_url_change(&driver, URL, Duration::from_secs(2))
            .await
            .expect("unchanged"));

        driver.navigate("https://www.notion.so/login").await.expect("navigate");
        assert!(oracle
            .wait_for_url_change(&driver, URL, Duration::from_secs(2))
            .await
            .expect("changed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_title() {
        let driver = driver_with(FakePage::new(URL).title("Log in | Notion"));
        let oracle = ReadinessOracle::new();

        assert!(oracle
            .wait_for_title(&driver, &|t: &str| t.contains("Notion"), Duration::from_secs(1))
            .await
            .expect("title"));
        assert!(!oracle
            .wait_for_title(&driver, &|t: &str| t.contains("Dashboard"), Duration::from_secs(1))
            .await
            .expect("title"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_dynamic_content() {
        let driver = driver_with(FakePage::new(URL).element(
            FakeElement::new("form")
                .matches("input, button, form")
                .appears_after(1),
        ));

        let found = ReadinessOracle::new()
            .wait_for_dynamic_content(&driver, Duration::from_secs(10))
            .await
            .expect("content");

        assert!(found);
        assert_eq!(
            driver.sleeps(),
            vec![DYNAMIC_CONTENT_POLL, DYNAMIC_CONTENT_SETTLE]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_modern_spa() {
        let driver = driver_with(FakePage::new(URL).script("location.hash", json!(false)));
        assert!(!ReadinessOracle::new().is_modern_spa(&driver).await.expect("spa"));
    }
}
