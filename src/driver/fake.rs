//! Scripted in-memory [`Driver`] for offline tests.
//!
//! A [`FakeDriver`] holds a set of routed [`FakePage`]s. Elements match a
//! selector when the selector's text is one of the element's registered
//! queries, so tests describe a DOM snapshot purely by which candidate
//! selectors hit which elements.
//!
//! # Example
//!
//! ```ignore
//! use notion_e2e::driver::fake::{FakeDriver, FakeElement, FakePage};
//!
//! let driver = FakeDriver::new();
//! driver.page(
//!     FakePage::new("https://www.notion.so/login")
//!         .title("Log in | Notion")
//!         .element(FakeElement::new("email").matches("//input[@type='email']")),
//! );
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::ElementId;
use crate::locator::Selector;

use super::facade::Driver;

// ============================================================================
// Constants
// ============================================================================

/// URL reported before the first navigation.
const BLANK_URL: &str = "about:blank";

// ============================================================================
// ClickAction
// ============================================================================

/// Effect of clicking a [`FakeElement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Load the page routed at this URL.
    Navigate(String),
    /// Make another element on the same page displayed.
    Reveal(ElementId),
}

// ============================================================================
// ScriptReply
// ============================================================================

/// Scripted result of [`Driver::execute_script`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptReply {
    /// Script returned this value.
    Value(Value),
    /// Script threw with this message.
    Throw(String),
}

impl From<Value> for ScriptReply {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

#[derive(Debug, Clone)]
struct ScriptRule {
    needle: String,
    replies: Vec<ScriptReply>,
    served: usize,
}

impl ScriptRule {
    /// Serves replies in order; the last one repeats.
    fn next(&mut self) -> ScriptReply {
        let index = self.served.min(self.replies.len().saturating_sub(1));
        self.served += 1;
        self.replies
            .get(index)
            .cloned()
            .unwrap_or(ScriptReply::Value(Value::Bool(true)))
    }
}

// ============================================================================
// FakeElement
// ============================================================================

/// An element on a [`FakePage`].
#[derive(Debug, Clone)]
pub struct FakeElement {
    id: ElementId,
    queries: Vec<String>,
    displayed: bool,
    text: String,
    value: String,
    attributes: FxHashMap<String, String>,
    on_click: Option<ClickAction>,
    appears_after: usize,
    lookups: usize,
}

impl FakeElement {
    /// Creates a displayed element with no queries.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ElementId::new(id),
            queries: Vec::new(),
            displayed: true,
            text: String::new(),
            value: String::new(),
            attributes: FxHashMap::default(),
            on_click: None,
            appears_after: 0,
            lookups: 0,
        }
    }

    /// Registers a selector text this element answers to.
    #[must_use]
    pub fn matches(mut self, query: impl Into<String>) -> Self {
        self.queries.push(query.into());
        self
    }

    /// Registers several selector texts.
    #[must_use]
    pub fn matches_all(mut self, queries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.queries.extend(queries.into_iter().map(Into::into));
        self
    }

    /// Marks the element as present but not displayed.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Sets the rendered text.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets what clicking does.
    #[must_use]
    pub fn on_click(mut self, action: ClickAction) -> Self {
        self.on_click = Some(action);
        self
    }

    /// Keeps the element out of the first `lookups` matching queries.
    #[must_use]
    pub fn appears_after(mut self, lookups: usize) -> Self {
        self.appears_after = lookups;
        self
    }

    /// Returns the element handle.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ElementId {
        &self.id
    }
}

// ============================================================================
// FakePage
// ============================================================================

/// A document snapshot served by [`FakeDriver`].
#[derive(Debug, Clone)]
pub struct FakePage {
    url: String,
    title: String,
    source: String,
    elements: Vec<FakeElement>,
    scripts: Vec<ScriptRule>,
}

impl FakePage {
    /// Creates an empty page reporting `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            source: String::new(),
            elements: Vec::new(),
            scripts: Vec::new(),
        }
    }

    /// Sets the document title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the page source.
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Adds an element, after those already present.
    #[must_use]
    pub fn element(mut self, element: FakeElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Answers scripts containing `needle` with `reply`.
    ///
    /// Rules are checked in registration order. Unmatched scripts return
    /// `true`.
    #[must_use]
    pub fn script(self, needle: impl Into<String>, reply: impl Into<ScriptReply>) -> Self {
        self.script_sequence(needle, [reply.into()])
    }

    /// Answers successive matching scripts with `replies`; the last repeats.
    #[must_use]
    pub fn script_sequence(
        mut self,
        needle: impl Into<String>,
        replies: impl IntoIterator<Item = ScriptReply>,
    ) -> Self {
        self.scripts.push(ScriptRule {
            needle: needle.into(),
            replies: replies.into_iter().collect(),
            served: 0,
        });
        self
    }

    /// Returns the URL the page reports.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn element_mut(&mut self, id: &ElementId) -> Option<&mut FakeElement> {
        self.elements.iter_mut().find(|e| &e.id == id)
    }
}

// ============================================================================
// FakeDriver
// ============================================================================

#[derive(Debug, Default)]
struct FakeState {
    routes: FxHashMap<String, FakePage>,
    current: Option<String>,
    killed: bool,
    finds: FxHashMap<String, usize>,
    clicks: FxHashMap<ElementId, usize>,
    scripts_run: Vec<String>,
    navigations: Vec<String>,
    sleeps: Vec<Duration>,
}

impl FakeState {
    fn ensure_alive(&self) -> Result<()> {
        if self.killed {
            Err(Error::SessionLost)
        } else {
            Ok(())
        }
    }

    fn page(&self) -> Option<&FakePage> {
        self.current.as_ref().and_then(|key| self.routes.get(key))
    }

    fn page_mut(&mut self) -> Option<&mut FakePage> {
        match &self.current {
            Some(key) => self.routes.get_mut(key),
            None => None,
        }
    }

    fn load(&mut self, url: &str) {
        self.routes
            .entry(url.to_string())
            .or_insert_with(|| FakePage::new(url));
        self.current = Some(url.to_string());
    }

    fn lookup(&mut self, selector: &Selector) -> Vec<ElementId> {
        *self.finds.entry(selector.value().to_string()).or_default() += 1;

        let Some(page) = self.page_mut() else {
            return Vec::new();
        };

        let mut hits = Vec::new();
        for element in page
            .elements
            .iter_mut()
            .filter(|e| e.queries.iter().any(|q| q == selector.value()))
        {
            element.lookups += 1;
            if element.lookups > element.appears_after {
                hits.push(element.id.clone());
            }
        }
        hits
    }

    fn with_element<T>(
        &mut self,
        id: &ElementId,
        f: impl FnOnce(&mut FakeElement) -> T,
    ) -> Result<T> {
        self.ensure_alive()?;
        self.page_mut()
            .and_then(|page| page.element_mut(id))
            .map(f)
            .ok_or_else(|| Error::stale_element(id.clone()))
    }
}

/// In-memory driver with scripted pages and call counters.
#[derive(Debug, Default)]
pub struct FakeDriver {
    state: Mutex<FakeState>,
}

impl FakeDriver {
    /// Creates a driver with no routes, positioned at `about:blank`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes the page's own URL to it.
    pub fn page(&self, page: FakePage) {
        let key = page.url.clone();
        self.route(key, page);
    }

    /// Routes `url` to `page`; the page may report a different URL.
    pub fn route(&self, url: impl Into<String>, page: FakePage) {
        self.state.lock().routes.insert(url.into(), page);
    }

    /// Loads a routed page without counting a navigation.
    pub fn start_at(&self, url: &str) {
        self.state.lock().load(url);
    }

    /// Makes every later call fail with [`Error::SessionLost`].
    pub fn kill(&self) {
        self.state.lock().killed = true;
    }

    /// Changes an element's displayed flag on the current page.
    pub fn set_displayed(&self, id: &str, displayed: bool) {
        let id = ElementId::new(id);
        if let Some(element) = self.state.lock().page_mut().and_then(|p| p.element_mut(&id)) {
            element.displayed = displayed;
        }
    }

    /// Returns how often `selector_text` was queried.
    #[must_use]
    pub fn finds(&self, selector_text: &str) -> usize {
        self.state
            .lock()
            .finds
            .get(selector_text)
            .copied()
            .unwrap_or(0)
    }

    /// Returns the total number of element queries.
    #[must_use]
    pub fn total_finds(&self) -> usize {
        self.state.lock().finds.values().sum()
    }

    /// Returns how often the element was clicked.
    #[must_use]
    pub fn clicks(&self, id: &str) -> usize {
        self.state
            .lock()
            .clicks
            .get(&ElementId::new(id))
            .copied()
            .unwrap_or(0)
    }

    /// Returns the URLs passed to [`Driver::navigate`], in order.
    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().navigations.clone()
    }

    /// Returns every requested sleep, in order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().sleeps.clone()
    }

    /// Returns how many executed scripts contained `needle`.
    #[must_use]
    pub fn scripts_containing(&self, needle: &str) -> usize {
        self.state
            .lock()
            .scripts_run
            .iter()
            .filter(|s| s.contains(needle))
            .count()
    }

    /// Returns the value typed into an element on the current page.
    #[must_use]
    pub fn typed_value(&self, id: &str) -> Option<String> {
        let id = ElementId::new(id);
        self.state
            .lock()
            .page()
            .and_then(|p| p.elements.iter().find(|e| e.id == id))
            .map(|e| e.value.clone())
    }
}

// ============================================================================
// Driver Implementation
// ============================================================================

#[async_trait]
impl Driver for FakeDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.ensure_alive()?;
        state.navigations.push(url.to_string());
        state.load(url);
        trace!(url, "Fake navigation");
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let state = self.state.lock();
        state.ensure_alive()?;
        Ok(state
            .page()
            .map_or_else(|| BLANK_URL.to_string(), |p| p.url.clone()))
    }

    async fn title(&self) -> Result<String> {
        let state = self.state.lock();
        state.ensure_alive()?;
        Ok(state.page().map(|p| p.title.clone()).unwrap_or_default())
    }

    async fn page_source(&self) -> Result<String> {
        let state = self.state.lock();
        state.ensure_alive()?;
        Ok(state.page().map(|p| p.source.clone()).unwrap_or_default())
    }

    async fn find_one(&self, selector: &Selector) -> Result<Option<ElementId>> {
        let mut state = self.state.lock();
        state.ensure_alive()?;
        Ok(state.lookup(selector).into_iter().next())
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<ElementId>> {
        let mut state = self.state.lock();
        state.ensure_alive()?;
        Ok(state.lookup(selector))
    }

    async fn execute_script(&self, source: &str) -> Result<Value> {
        let mut state = self.state.lock();
        state.ensure_alive()?;
        state.scripts_run.push(source.to_string());

        let reply = state
            .page_mut()
            .and_then(|page| page.scripts.iter_mut().find(|r| source.contains(&r.needle)))
            .map_or(ScriptReply::Value(Value::Bool(true)), ScriptRule::next);

        match reply {
            ScriptReply::Value(value) => Ok(value),
            ScriptReply::Throw(message) => Err(Error::script_error(message)),
        }
    }

    async fn sleep(&self, duration: Duration) {
        {
            let mut state = self.state.lock();
            state.sleeps.push(duration);
            if state.killed {
                return;
            }
        }
        tokio::time::sleep(duration).await;
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        self.state.lock().with_element(element, |e| e.displayed)
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        let mut state = self.state.lock();
        let action = state.with_element(element, |e| e.on_click.clone())?;
        *state.clicks.entry(element.clone()).or_default() += 1;

        match action {
            Some(ClickAction::Navigate(url)) => state.load(&url),
            Some(ClickAction::Reveal(target)) => {
                if let Some(target) = state.page_mut().and_then(|p| p.element_mut(&target)) {
                    target.displayed = true;
                }
            }
            None => {}
        }
        Ok(())
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()> {
        self.state
            .lock()
            .with_element(element, |e| e.value.push_str(text))
    }

    async fn clear(&self, element: &ElementId) -> Result<()> {
        self.state.lock().with_element(element, |e| e.value.clear())
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        self.state.lock().with_element(element, |e| e.text.clone())
    }

    async fn attribute(&self, element: &ElementId, name: &str) -> Result<Option<String>> {
        self.state.lock().with_element(element, |e| {
            if name == "value" {
                Some(e.value.clone())
            } else {
                e.attributes.get(name).cloned()
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn login_page() -> FakePage {
        FakePage::new("https://www.notion.so/login")
            .title("Log in | Notion")
            .element(FakeElement::new("email").matches("//input[@type='email']"))
            .element(
                FakeElement::new("ghost")
                    .matches("//input")
                    .hidden(),
            )
    }

    #[tokio::test]
    async fn test_blank_before_navigation() {
        let driver = FakeDriver::new();
        assert_eq!(driver.current_url().await.expect("url"), BLANK_URL);
        assert!(driver.title().await.expect("title").is_empty());
    }

    #[tokio::test]
    async fn test_find_by_registered_query() {
        let driver = FakeDriver::new();
        driver.page(login_page());
        driver.navigate("https://www.notion.so/login").await.expect("navigate");

        let found = driver
            .find_one(&Selector::xpath("//input[@type='email']"))
            .await
            .expect("find");
        assert_eq!(found, Some(ElementId::new("email")));

        let ghost = ElementId::new("ghost");
        assert!(!driver.is_displayed(&ghost).await.expect("displayed"));
        assert_eq!(driver.finds("//input[@type='email']"), 1);
    }

    #[tokio::test]
    async fn test_appears_after_lookups() {
        let driver = FakeDriver::new();
        driver.page(
            FakePage::new("https://x.test")
                .element(FakeElement::new("late").matches("//button").appears_after(2)),
        );
        driver.start_at("https://x.test");

        let selector = Selector::xpath("//button");
        assert!(driver.find_one(&selector).await.expect("1").is_none());
        assert!(driver.find_one(&selector).await.expect("2").is_none());
        assert!(driver.find_one(&selector).await.expect("3").is_some());
    }

    #[tokio::test]
    async fn test_click_navigates() {
        let driver = FakeDriver::new();
        driver.page(
            FakePage::new("https://www.notion.so").element(
                FakeElement::new("login-link")
                    .matches("//a")
                    .on_click(ClickAction::Navigate("https://www.notion.so/login".into())),
            ),
        );
        driver.page(login_page());
        driver.start_at("https://www.notion.so");

        driver.click(&ElementId::new("login-link")).await.expect("click");

        assert_eq!(driver.current_url().await.expect("url"), "https://www.notion.so/login");
        assert_eq!(driver.clicks("login-link"), 1);
        assert!(driver.navigations().is_empty());
    }

    #[tokio::test]
    async fn test_element_from_previous_page_is_stale() {
        let driver = FakeDriver::new();
        driver.page(login_page());
        driver.start_at("https://www.notion.so/login");
        driver.navigate("https://elsewhere.test").await.expect("navigate");

        let err = driver
            .is_displayed(&ElementId::new("email"))
            .await
            .expect_err("stale");
        assert!(matches!(err, Error::StaleElement { .. }));
    }

    #[tokio::test]
    async fn test_script_sequence_last_reply_sticks() {
        let driver = FakeDriver::new();
        driver.page(FakePage::new("https://x.test").script_sequence(
            "readyState",
            [
                ScriptReply::Value(json!(false)),
                ScriptReply::Value(json!(true)),
            ],
        ));
        driver.start_at("https://x.test");

        let script = "return document.readyState === 'complete';";
        assert_eq!(driver.execute_script(script).await.expect("1"), json!(false));
        assert_eq!(driver.execute_script(script).await.expect("2"), json!(true));
        assert_eq!(driver.execute_script(script).await.expect("3"), json!(true));
        assert_eq!(driver.execute_script("return 1;").await.expect("default"), json!(true));
    }

    #[tokio::test]
    async fn test_script_throw() {
        let driver = FakeDriver::new();
        driver.page(FakePage::new("https://x.test").script("jQuery", ScriptReply::Throw("nope".into())));
        driver.start_at("https://x.test");

        let err = driver.execute_script("return jQuery.active;").await.expect_err("throw");
        assert!(matches!(err, Error::ScriptError { .. }));
    }

    #[tokio::test]
    async fn test_kill_reports_session_lost() {
        let driver = FakeDriver::new();
        driver.kill();
        let err = driver.title().await.expect_err("killed");
        assert!(err.is_session_lost());
    }

    #[tokio::test]
    async fn test_typing_and_clear() {
        let driver = FakeDriver::new();
        driver.page(login_page());
        driver.start_at("https://www.notion.so/login");
        let email = ElementId::new("email");

        driver.send_keys(&email, "a@b.c").await.expect("type");
        assert_eq!(driver.typed_value("email").as_deref(), Some("a@b.c"));
        assert_eq!(
            driver.attribute(&email, "value").await.expect("attr").as_deref(),
            Some("a@b.c")
        );

        driver.clear(&email).await.expect("clear");
        assert_eq!(driver.typed_value("email").as_deref(), Some(""));
    }
}
