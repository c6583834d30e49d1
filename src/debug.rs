//! Page-structure dumper for diagnosing locator misses.
//!
//! [`PageDebugger::dump`] walks the current page through the public
//! [`Driver`] facade only and logs what a selector author needs: form
//! controls, keyword presence in the source, framework markers and
//! loading indicators. The collected [`PageDump`] is also returned so tests
//! and scenario code can assert on it.
//!
//! # Example
//!
//! ```no_run
//! use notion_e2e::debug::PageDebugger;
//!
//! # async fn example(driver: &dyn notion_e2e::Driver) -> notion_e2e::Result<()> {
//! let dump = PageDebugger::new().dump(driver).await?;
//! println!("{} inputs on {}", dump.input_count, dump.url);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info};

use crate::driver::Driver;
use crate::error::Result;
use crate::identifiers::ElementId;
use crate::locator::Selector;

// ============================================================================
// Constants
// ============================================================================

/// Keywords reported for a login-flow page.
pub const FLOW_KEYWORDS: [&str; 7] = [
    "email",
    "password",
    "login",
    "sign in",
    "continue",
    "submit",
    "verification",
];

/// Source markers of client-side frameworks.
pub const FRAMEWORK_MARKERS: [&str; 5] = ["react", "vue", "angular", "ng-", "data-reactroot"];

/// Default cap on inputs and buttons described per dump.
const DEFAULT_MAX_DESCRIBED: usize = 10;

/// Characters of page source logged by [`PageDebugger::source_excerpt`].
const EXCERPT_CHARS: usize = 500;

const LOADING_XPATH: &str = "//*[contains(@class, 'loading') or contains(@class, 'spinner') \
    or contains(text(), 'Loading')]";

// ============================================================================
// Summaries
// ============================================================================

/// One `<input>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSummary {
    pub input_type: Option<String>,
    pub name: Option<String>,
    pub id: Option<String>,
    pub placeholder: Option<String>,
    pub class: Option<String>,
    pub visible: bool,
}

/// One `<button>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonSummary {
    pub text: String,
    pub button_type: Option<String>,
    pub class: Option<String>,
    pub visible: bool,
}

/// One `<form>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSummary {
    pub action: Option<String>,
    pub method: Option<String>,
    pub class: Option<String>,
}

/// Everything [`PageDebugger::dump`] collected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDump {
    pub url: String,
    pub title: String,
    pub input_count: usize,
    /// The first inputs, capped at the debugger's limit.
    pub inputs: Vec<InputSummary>,
    pub button_count: usize,
    pub buttons: Vec<ButtonSummary>,
    pub forms: Vec<FormSummary>,
    /// `(keyword, present)` for [`FLOW_KEYWORDS`].
    pub keywords: Vec<(&'static str, bool)>,
    /// `(marker, present)` for [`FRAMEWORK_MARKERS`].
    pub frameworks: Vec<(&'static str, bool)>,
    pub loading_indicators: usize,
    pub div_count: usize,
    pub script_count: usize,
    pub body_class: Option<String>,
}

impl PageDump {
    /// Returns `true` if `keyword` was found in the page source.
    #[must_use]
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords
            .iter()
            .chain(&self.frameworks)
            .any(|(k, present)| *k == keyword && *present)
    }
}

// ============================================================================
// PageDebugger
// ============================================================================

/// Logs and returns the structure of the current page.
#[derive(Debug, Clone, Copy)]
pub struct PageDebugger {
    max_described: usize,
}

impl Default for PageDebugger {
    fn default() -> Self {
        Self {
            max_described: DEFAULT_MAX_DESCRIBED,
        }
    }
}

impl PageDebugger {
    /// Creates a debugger describing up to ten inputs and buttons.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many inputs and buttons are described.
    #[must_use]
    pub fn with_max_described(mut self, max: usize) -> Self {
        self.max_described = max;
        self
    }

    /// Collects and logs the page structure.
    ///
    /// Individual element reads that fail are reported as absent.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn dump(&self, driver: &dyn Driver) -> Result<PageDump> {
        let mut dump = PageDump {
            url: soft(driver.current_url().await)?.unwrap_or_default(),
            title: soft(driver.title().await)?.unwrap_or_default(),
            ..PageDump::default()
        };
        info!(url = %dump.url, title = %dump.title, "Page structure dump");

        let inputs = elements(driver, "input").await?;
        dump.input_count = inputs.len();
        for element in inputs.iter().take(self.max_described) {
            let input = InputSummary {
                input_type: attr(driver, element, "type").await?,
                name: attr(driver, element, "name").await?,
                id: attr(driver, element, "id").await?,
                placeholder: attr(driver, element, "placeholder").await?,
                class: attr(driver, element, "class").await?,
                visible: visible(driver, element).await?,
            };
            debug!(?input, "Input");
            dump.inputs.push(input);
        }

        let buttons = elements(driver, "button").await?;
        dump.button_count = buttons.len();
        for element in buttons.iter().take(self.max_described) {
            let button = ButtonSummary {
                text: soft(driver.text(element).await)?.unwrap_or_default(),
                button_type: attr(driver, element, "type").await?,
                class: attr(driver, element, "class").await?,
                visible: visible(driver, element).await?,
            };
            debug!(?button, "Button");
            dump.buttons.push(button);
        }

        for element in &elements(driver, "form").await? {
            let form = FormSummary {
                action: attr(driver, element, "action").await?,
                method: attr(driver, element, "method").await?,
                class: attr(driver, element, "class").await?,
            };
            debug!(?form, "Form");
            dump.forms.push(form);
        }

        let source = soft(driver.page_source().await)?.unwrap_or_default();
        dump.keywords = keyword_report(&source, &FLOW_KEYWORDS);
        dump.frameworks = keyword_report(&source, &FRAMEWORK_MARKERS);
        debug!(keywords = ?dump.keywords, frameworks = ?dump.frameworks, "Source keywords");

        dump.loading_indicators = count(driver, Selector::xpath(LOADING_XPATH)).await?;
        dump.div_count = count(driver, Selector::css("div")).await?;
        dump.script_count = count(driver, Selector::css("script")).await?;
        dump.body_class = match soft(driver.find_one(&Selector::css("body")).await)?.flatten() {
            Some(body) => attr(driver, &body, "class").await?,
            None => None,
        };

        info!(
            inputs = dump.input_count,
            buttons = dump.button_count,
            forms = dump.forms.len(),
            loading = dump.loading_indicators,
            divs = dump.div_count,
            scripts = dump.script_count,
            body_class = dump.body_class.as_deref().unwrap_or(""),
            "Page structure summary"
        );
        Ok(dump)
    }

    /// Logs the source length and its first 500 characters.
    ///
    /// # Errors
    ///
    /// Any driver error.
    pub async fn source_excerpt(&self, driver: &dyn Driver) -> Result<String> {
        let source = driver.page_source().await?;
        let excerpt: String = source.chars().take(EXCERPT_CHARS).collect();
        info!(length = source.chars().count(), excerpt = %excerpt, "Page source");
        Ok(excerpt)
    }
}

/// Reports, for each keyword, whether the lower-cased source contains it.
#[must_use]
pub fn keyword_report<'k>(source: &str, keywords: &[&'k str]) -> Vec<(&'k str, bool)> {
    let haystack = source.to_lowercase();
    keywords
        .iter()
        .map(|k| (*k, haystack.contains(&k.to_lowercase())))
        .collect()
}

// ============================================================================
// Helpers
// ============================================================================

/// Keeps session loss, reads every other failure as absent.
fn soft<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_session_lost() => Err(e),
        Err(e) => {
            debug!(error = %e, "Debug read failed");
            Ok(None)
        }
    }
}

async fn elements(driver: &dyn Driver, tag: &str) -> Result<Vec<ElementId>> {
    Ok(soft(driver.find_all(&Selector::css(tag)).await)?.unwrap_or_default())
}

async fn count(driver: &dyn Driver, selector: Selector) -> Result<usize> {
    Ok(soft(driver.find_all(&selector).await)?.map_or(0, |found| found.len()))
}

async fn attr(driver: &dyn Driver, element: &ElementId, name: &str) -> Result<Option<String>> {
    Ok(soft(driver.attribute(element, name).await)?.flatten())
}

async fn visible(driver: &dyn Driver, element: &ElementId) -> Result<bool> {
    Ok(soft(driver.is_displayed(element).await)?.unwrap_or(false))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{FakeDriver, FakeElement, FakePage};
    use crate::error::Error;

    const LOGIN: &str = "https://www.notion.so/login";

    fn login_page() -> FakePage {
        let mut page = FakePage::new(LOGIN)
            .title("Log in | Notion")
            .source("<div data-reactroot><input type='email'>Continue with email</div>")
            .element(
                FakeElement::new("email")
                    .matches("input")
                    .attribute("type", "email")
                    .attribute("placeholder", "Enter your email address..."),
            )
            .element(FakeElement::new("continue").matches("button").text("Continue"))
            .element(
                FakeElement::new("body")
                    .matches("body")
                    .attribute("class", "notion-body"),
            );
        for i in 0..12 {
            page = page.element(FakeElement::new(format!("hidden-{i}")).matches("input").hidden());
        }
        page
    }

    #[test]
    fn test_keyword_report_is_case_insensitive() {
        let report = keyword_report("Check your EMAIL", &["email", "password"]);
        assert_eq!(report, vec![("email", true), ("password", false)]);
    }

    #[tokio::test]
    async fn test_dump_collects_structure() {
        let driver = FakeDriver::new();
        driver.page(login_page());
        driver.start_at(LOGIN);

        let dump = PageDebugger::new().dump(&driver).await.expect("dump");

        assert_eq!(dump.url, LOGIN);
        assert_eq!(dump.title, "Log in | Notion");
        assert_eq!(dump.input_count, 13);
        assert_eq!(dump.inputs.len(), 10);
        assert_eq!(dump.inputs[0].input_type.as_deref(), Some("email"));
        assert!(dump.inputs[0].visible);
        assert!(!dump.inputs[1].visible);
        assert_eq!(dump.buttons[0].text, "Continue");
        assert!(dump.has_keyword("email"));
        assert!(dump.has_keyword("data-reactroot"));
        assert!(!dump.has_keyword("password"));
        assert_eq!(dump.body_class.as_deref(), Some("notion-body"));
    }

    #[tokio::test]
    async fn test_dump_respects_cap() {
        let driver = FakeDriver::new();
        driver.page(login_page());
        driver.start_at(LOGIN);

        let dump = PageDebugger::new()
            .with_max_described(2)
            .dump(&driver)
            .await
            .expect("dump");
        assert_eq!(dump.inputs.len(), 2);
        assert_eq!(dump.input_count, 13);
    }

    #[tokio::test]
    async fn test_dump_propagates_session_loss() {
        let driver = FakeDriver::new();
        driver.kill();
        let err = PageDebugger::new().dump(&driver).await.expect_err("lost");
        assert!(matches!(err, Error::SessionLost));
    }

    #[tokio::test]
    async fn test_source_excerpt_truncates() {
        let driver = FakeDriver::new();
        driver.page(FakePage::new(LOGIN).source("x".repeat(800)));
        driver.start_at(LOGIN);

        let excerpt = PageDebugger::new()
            .source_excerpt(&driver)
            .await
            .expect("excerpt");
        assert_eq!(excerpt.len(), EXCERPT_CHARS);
    }
}
