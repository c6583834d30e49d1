//! About page contract.

use crate::error::Result;
use crate::locator::CandidateSet;

use super::base::PageContext;

const MAIN_HEADING: [&str; 4] = [
    "//h1",
    "//h2[contains(text(), 'About')]",
    "//*[contains(@class, 'heading')]",
    "//*[contains(@class, 'title')]",
];

const CONTENT_AREA: [&str; 5] = [
    "//main",
    "//section",
    "//article",
    "//div[contains(@class, 'content')]",
    "//div[contains(@class, 'about')]",
];

const NAVIGATION: [&str; 4] = [
    "//nav",
    "//header",
    "//*[contains(@class, 'nav')]",
    "//a[contains(@href, '/')]",
];

/// Any structural element that proves something rendered.
pub const ANY_CONTENT: [&str; 9] = [
    "//h1", "//h2", "//h3", "//div", "//main", "//section", "//article", "//p", "//span",
];

/// The static "about" page.
#[derive(Debug, Clone)]
pub struct AboutPage<'d> {
    ctx: PageContext<'d>,
    main_heading: CandidateSet,
    content_area: CandidateSet,
    navigation: CandidateSet,
    any_content: CandidateSet,
}

impl<'d> AboutPage<'d> {
    /// Binds the contract to the page the driver is on.
    #[must_use]
    pub fn new(ctx: PageContext<'d>) -> Self {
        Self {
            ctx,
            main_heading: CandidateSet::xpaths("about heading", &MAIN_HEADING),
            content_area: CandidateSet::xpaths("about content", &CONTENT_AREA),
            navigation: CandidateSet::xpaths("navigation", &NAVIGATION),
            any_content: CandidateSet::xpaths("any content", &ANY_CONTENT),
        }
    }

    /// Navigates to `about.url` and waits for readiness.
    ///
    /// # Errors
    ///
    /// [`Error::SessionLost`](crate::Error::SessionLost) and page-load
    /// [`Error::Timeout`](crate::Error::Timeout).
    pub async fn open(ctx: PageContext<'d>) -> Result<Self> {
        ctx.open(&ctx.config().about_url).await?;
        Ok(Self::new(ctx))
    }

    /// Returns the page context.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &PageContext<'d> {
        &self.ctx
    }

    pub async fn is_main_heading_visible(&self) -> bool {
        self.ctx.is_visible(&self.main_heading).await
    }

    pub async fn main_heading_text(&self) -> Option<String> {
        self.ctx.text_of(&self.main_heading).await
    }

    pub async fn is_content_area_visible(&self) -> bool {
        self.ctx.is_visible(&self.content_area).await
    }

    pub async fn is_navigation_visible(&self) -> bool {
        self.ctx.is_visible(&self.navigation).await
    }

    /// Returns `true` if any heading, block or text node is displayed.
    pub async fn is_any_content_visible(&self) -> bool {
        self.ctx.is_visible(&self.any_content).await
    }

    /// Returns the current URL.
    ///
    /// # Errors
    ///
    /// Any driver error.
    pub async fn current_url(&self) -> Result<String> {
        self.ctx.current_url().await
    }

    /// Returns the current title.
    ///
    /// # Errors
    ///
    /// Any driver error.
    pub async fn title(&self) -> Result<String> {
        self.ctx.title().await
    }
}
