//! Home page contract.

use tracing::{info, warn};

use crate::error::Result;
use crate::locator::{CandidateSet, LocatorOutcome};

use super::base::PageContext;
use super::login::LoginPage;

// ============================================================================
// Candidate Sets
// ============================================================================

const LOGIN_LINK: [&str; 4] = [
    "//a[contains(text(), 'Log in')]",
    "//button[contains(text(), 'Log in')]",
    "//a[contains(@href, 'login')]",
    "//*[contains(text(), 'Sign in')]",
];

const SIGN_UP: [&str; 4] = [
    "//a[contains(text(), 'Sign up')]",
    "//button[contains(text(), 'Sign up')]",
    "//a[contains(@href, 'signup')]",
    "//*[contains(text(), 'Get started')]",
];

const MAIN_HEADING: [&str; 4] = [
    "//h1",
    "//h2",
    "//*[contains(@class, 'hero')]",
    "//*[contains(@class, 'title')]",
];

const NAVIGATION: [&str; 4] = [
    "//nav",
    "//header",
    "//*[contains(@class, 'nav')]",
    "//*[contains(@class, 'header')]",
];

/// Header links and buttons, most specific first.
pub const HEADER_NAVIGATION: [&str; 6] = [
    "//header//nav//a",
    "//header//button",
    "//nav//a[contains(@href, 'login')]",
    "//nav//a[contains(@href, 'signup')]",
    "//div[contains(@class, 'nav')]//a",
    "//header//a",
];

// ============================================================================
// HomePage
// ============================================================================

/// The public landing page.
#[derive(Debug, Clone)]
pub struct HomePage<'d> {
    ctx: PageContext<'d>,
    login_link: CandidateSet,
    sign_up: CandidateSet,
    main_heading: CandidateSet,
    navigation: CandidateSet,
    header_navigation: CandidateSet,
}

impl<'d> HomePage<'d> {
    /// Binds the contract to the page the driver is on.
    #[must_use]
    pub fn new(ctx: PageContext<'d>) -> Self {
        Self {
            ctx,
            login_link: CandidateSet::xpaths("login link", &LOGIN_LINK),
            sign_up: CandidateSet::xpaths("sign up link", &SIGN_UP),
            main_heading: CandidateSet::xpaths("main heading", &MAIN_HEADING),
            navigation: CandidateSet::xpaths("navigation", &NAVIGATION),
            header_navigation: CandidateSet::xpaths("header navigation", &HEADER_NAVIGATION),
        }
    }

    /// Navigates to `base.url` and waits for readiness.
    ///
    /// # Errors
    ///
    /// [`Error::SessionLost`](crate::Error::SessionLost) and page-load
    /// [`Error::Timeout`](crate::Error::Timeout).
    pub async fn open(ctx: PageContext<'d>) -> Result<Self> {
        ctx.open(&ctx.config().base_url).await?;
        Ok(Self::new(ctx))
    }

    /// Returns the page context.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &PageContext<'d> {
        &self.ctx
    }

    /// Clicks the login link, or navigates to `login.url` if none shows.
    ///
    /// # Errors
    ///
    /// [`Error::SessionLost`](crate::Error::SessionLost) and page-load
    /// [`Error::Timeout`](crate::Error::Timeout) from the fallback.
    pub async fn click_login(self) -> Result<LoginPage<'d>> {
        if self.ctx.click(&self.login_link).await? {
            self.ctx.wait_until_ready().await?;
        } else {
            let url = &self.ctx.config().login_url;
            warn!(url = %url, "Login link not clickable, navigating directly");
            self.ctx.open(url).await?;
        }
        Ok(LoginPage::new(self.ctx))
    }

    /// Clicks the sign-up link; `false` if none shows.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn click_sign_up(&self) -> Result<bool> {
        let clicked = self.ctx.click(&self.sign_up).await?;
        if clicked {
            self.ctx.wait_until_ready().await?;
        }
        Ok(clicked)
    }

    /// Returns `true` if a hero heading is displayed.
    pub async fn is_main_heading_visible(&self) -> bool {
        self.ctx.is_visible(&self.main_heading).await
    }

    /// Returns the hero heading text.
    pub async fn main_heading_text(&self) -> Option<String> {
        self.ctx.text_of(&self.main_heading).await
    }

    /// Returns `true` if a navigation bar is displayed.
    pub async fn is_navigation_visible(&self) -> bool {
        self.ctx.is_visible(&self.navigation).await
    }

    /// Locates any header navigation control.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn find_header_navigation(&self) -> Result<LocatorOutcome> {
        let outcome = self.ctx.locate(&self.header_navigation).await?;
        if let Some(selector) = outcome.selector() {
            info!(selector = %selector, "Header navigation present");
        }
        Ok(outcome)
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
