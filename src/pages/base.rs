//! Shared plumbing for page contracts.
//!
//! A [`PageContext`] borrows the driver and configuration and carries the
//! configured oracle and locator. It is `Copy`; each page contract holds its
//! own and passes it on when it hands over to the next page.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::SuiteConfig;
use crate::driver::Driver;
use crate::error::Result;
use crate::identifiers::ElementId;
use crate::locator::{CandidateSet, Locator, LocatorOutcome};
use crate::wait::{ReadinessOracle, ReadinessReport};

/// Pause after typing into a field.
pub const TYPING_SETTLE: Duration = Duration::from_secs(1);

// ============================================================================
// PageContext
// ============================================================================

/// Driver, configuration, oracle and locator for one page contract.
#[derive(Clone, Copy)]
pub struct PageContext<'d> {
    driver: &'d dyn Driver,
    config: &'d SuiteConfig,
    oracle: ReadinessOracle,
    locator: Locator,
}

impl fmt::Debug for PageContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageContext")
            .field("oracle", &self.oracle)
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

impl<'d> PageContext<'d> {
    /// Builds the oracle and locator from `config`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`](crate::Error::InvalidArgument) if the
    /// explicit wait does not exceed the probe interval.
    pub fn new(driver: &'d dyn Driver, config: &'d SuiteConfig) -> Result<Self> {
        let oracle = ReadinessOracle::new().with_framework_grace(config.framework_grace());
        let locator = Locator::new(oracle, config.default_budget()?);
        Ok(Self {
            driver,
            config,
            oracle,
            locator,
        })
    }

    /// Replaces the locator (and the oracle it consults).
    #[must_use]
    pub fn with_locator(mut self, locator: Locator) -> Self {
        self.oracle = *locator.oracle();
        self.locator = locator;
        self
    }

    /// Returns the driver.
    #[inline]
    #[must_use]
    pub fn driver(&self) -> &'d dyn Driver {
        self.driver
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &'d SuiteConfig {
        self.config
    }

    /// Returns the oracle.
    #[inline]
    #[must_use]
    pub fn oracle(&self) -> &ReadinessOracle {
        &self.oracle
    }

    /// Returns the locator.
    #[inline]
    #[must_use]
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Navigates to `url` and waits for readiness.
    ///
    /// # Errors
    ///
    /// [`Error::SessionLost`](crate::Error::SessionLost) and page-load
    /// [`Error::Timeout`](crate::Error::Timeout).
    pub async fn open(&self, url: &str) -> Result<ReadinessReport> {
        info!(url, "Opening page");
        self.driver.navigate(url).await?;
        self.wait_until_ready().await
    }

    /// Waits for readiness with the default budget.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn wait_until_ready(&self) -> Result<ReadinessReport> {
        self.oracle
            .wait_until_ready(self.driver, &self.locator.budget())
            .await
    }

    /// Returns the current URL.
    ///
    /// # Errors
    ///
    /// Any driver error.
    pub async fn current_url(&self) -> Result<String> {
        self.driver.current_url().await
    }

    /// Returns the current title.
    ///
    /// # Errors
    ///
    /// Any driver error.
    pub async fn title(&self) -> Result<String> {
        self.driver.title().await
    }

    // ========================================================================
    // Locating
    // ========================================================================

    /// Locates `set` with the default budget.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn locate(&self, set: &CandidateSet) -> Result<LocatorOutcome> {
        self.locator.find(self.driver, set).await
    }

    /// Locates `set` within `total` instead of the default deadline.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn locate_within(&self, set: &CandidateSet, total: Duration) -> Result<LocatorOutcome> {
        let budget = self.locator.budget().shortened(total);
        self.locator.find_within(self.driver, set, &budget).await
    }

    /// Returns `true` if any candidate is displayed. Never fails.
    pub async fn is_visible(&self, set: &CandidateSet) -> bool {
        match self.locate(set).await {
            Ok(outcome) => outcome.is_found(),
            Err(e) => {
                warn!(label = set.label(), error = %e, "Visibility query failed");
                false
            }
        }
    }

    /// Returns the displayed text of the first candidate. Never fails.
    pub async fn text_of(&self, set: &CandidateSet) -> Option<String> {
        let element = match self.locate(set).await {
            Ok(outcome) => outcome.into_element()?,
            Err(e) => {
                warn!(label = set.label(), error = %e, "Text query failed");
                return None;
            }
        };

        match self.driver.text(&element).await {
            Ok(text) => Some(text.trim().to_string()),
            Err(e) => {
                debug!(label = set.label(), error = %e, "Text read failed");
                None
            }
        }
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Clicks the first displayed candidate; `false` on miss.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn click(&self, set: &CandidateSet) -> Result<bool> {
        match self.locate(set).await?.into_element() {
            Some(element) => self.click_element(set, &element).await,
            None => Ok(false),
        }
    }

    /// Clicks `element`, reporting non-fatal failures as `false`.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn click_element(&self, set: &CandidateSet, element: &ElementId) -> Result<bool> {
        match self.driver.click(element).await {
            Ok(()) => {
                debug!(label = set.label(), "Clicked");
                Ok(true)
            }
            Err(e) if e.is_session_lost() => Err(e),
            Err(e) => {
                warn!(label = set.label(), error = %e, "Click failed");
                Ok(false)
            }
        }
    }

    /// Clears `element`, types `text`, then pauses for the page to react.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn type_into(&self, label: &str, element: &ElementId, text: &str) -> Result<bool> {
        if let Err(e) = self.driver.clear(element).await {
            if e.is_session_lost() {
                return Err(e);
            }
            debug!(label, error = %e, "Clear failed");
        }

        match self.driver.send_keys(element, text).await {
            Ok(()) => {
                self.driver.sleep(TYPING_SETTLE).await;
                Ok(true)
            }
            Err(e) if e.is_session_lost() => Err(e),
            Err(e) => {
                warn!(label, error = %e, "Typing failed");
                Ok(false)
            }
        }
    }

    /// Sleeps on the driver.
    pub async fn pause(&self, duration: Duration) {
        self.driver.sleep(duration).await;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{FakeDriver, FakeElement, FakePage};

    const URL: &str = "https://www.notion.so";

    #[tokio::test(start_paused = true)]
    async fn test_is_visible_is_total() {
        let driver = FakeDriver::new();
        let config = SuiteConfig::default();
        let ctx = PageContext::new(&driver, &config).expect("context");
        let set = CandidateSet::xpaths("heading", &["//h1"]);

        driver.kill();
        assert!(!ctx.is_visible(&set).await);
        assert!(ctx.text_of(&set).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_visible_with_unbounded_wait() {
        let driver = FakeDriver::new();
        driver.page(FakePage::new(URL).element(FakeElement::new("h1").matches("//h1")));
        driver.start_at(URL);
        let config = SuiteConfig {
            explicit_wait_seconds: u64::MAX,
            ..SuiteConfig::default()
        };
        let ctx = PageContext::new(&driver, &config).expect("context");

        assert!(ctx.is_visible(&CandidateSet::xpaths("heading", &["//h1"])).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_of_trims() {
        let driver = FakeDriver::new();
        driver.page(FakePage::new(URL).element(FakeElement::new("h1").matches("//h1").text("  Notion  ")));
        driver.start_at(URL);
        let config = SuiteConfig::default();
        let ctx = PageContext::new(&driver, &config).expect("context");

        let text = ctx.text_of(&CandidateSet::xpaths("heading", &["//h1"])).await;
        assert_eq!(text.as_deref(), Some("Notion"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_type_into_settles() {
        let driver = FakeDriver::new();
        driver.page(FakePage::new(URL).element(FakeElement::new("email")));
        driver.start_at(URL);
        let config = SuiteConfig::default();
        let ctx = PageContext::new(&driver, &config).expect("context");

        let typed = ctx
            .type_into("email", &ElementId::new("email"), "a@b.c")
            .await
            .expect("type");
        assert!(typed);
        assert_eq!(driver.typed_value("email").as_deref(), Some("a@b.c"));
        assert_eq!(driver.sleeps(), vec![TYPING_SETTLE]);
    }
}
