//! Dashboard (signed-in workspace) contract.
//!
//! # Logout cascade
//!
//! Each step runs only if the previous one missed:
//!
//! | Step | [`LogoutStrategy`] | Action |
//! |------|--------------------|--------|
//! | 1 | `ProfileMenu` | open the profile menu, click log out |
//! | 2 | `ExtendedMenu` | menu missed: try avatar/test-id menus, then log out |
//! | 3 | `ExtendedLogout` | no log-out clicked yet: try wider log-out matches |
//! | 4 | `DirectUrl` | navigate to `logout.url` |
//!
//! Each control lookup is bounded to 5 s. Whatever happened, the cascade
//! then waits up to 10 s for a signed-out title and hands over to the home
//! page; callers judge success from that page.

use std::fmt;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::Result;
use crate::locator::CandidateSet;

use super::base::PageContext;
use super::home::HomePage;

// ============================================================================
// Candidate Sets
// ============================================================================

const PROFILE_MENU: [&str; 5] = [
    "//button[contains(@aria-label, 'profile')]",
    "//div[contains(@class, 'profile')]",
    "//img[contains(@alt, 'profile')]",
    "//*[contains(@class, 'user')]",
    "//*[contains(@class, 'account')]",
];

const LOGOUT_BUTTON: [&str; 5] = [
    "//button[contains(text(), 'Log out')]",
    "//a[contains(text(), 'Log out')]",
    "//button[contains(text(), 'Sign out')]",
    "//a[contains(text(), 'Sign out')]",
    "//*[contains(text(), 'Logout')]",
];

const WORKSPACE_AREA: [&str; 4] = [
    "//div[contains(@class, 'workspace')]",
    "//div[contains(@class, 'dashboard')]",
    "//h1[contains(text(), 'workspace')]",
    "//*[contains(@class, 'main-content')]",
];

const SETTINGS_MENU: [&str; 4] = [
    "//button[contains(@aria-label, 'settings')]",
    "//button[contains(@aria-label, 'menu')]",
    "//*[contains(@class, 'settings')]",
    "//*[contains(@class, 'menu')]",
];

const EXTENDED_MENU: [&str; 5] = [
    "//button[contains(@class, 'avatar')]",
    "//div[contains(@class, 'user-avatar')]",
    "//img[contains(@class, 'avatar')]",
    "//*[contains(@data-testid, 'profile')]",
    "//button[contains(@aria-haspopup, 'menu')]",
];

const EXTENDED_LOGOUT: [&str; 5] = [
    "//button[contains(text(), 'Log out')]",
    "//a[contains(text(), 'Log out')]",
    "//div[contains(text(), 'Log out')]",
    "//*[contains(text(), 'Sign out')]",
    "//*[contains(@data-testid, 'logout')]",
];

/// Words a signed-out title carries.
const SIGNED_OUT_TITLES: [&str; 3] = ["Notion", "Sign in", "Login"];

/// Budget for each control lookup in the cascade.
const CASCADE_STEP_BUDGET: Duration = Duration::from_secs(5);

/// Limit for the signed-out title wait.
const SIGNED_OUT_WAIT: Duration = Duration::from_secs(10);

// ============================================================================
// LogoutStrategy
// ============================================================================

/// The cascade step that performed the logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutStrategy {
    /// Profile menu, then log out.
    ProfileMenu,
    /// Extended menu candidates, then log out.
    ExtendedMenu,
    /// Extended log-out candidates.
    ExtendedLogout,
    /// Direct navigation to the logout endpoint.
    DirectUrl,
}

impl fmt::Display for LogoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ProfileMenu => "profile_menu",
            Self::ExtendedMenu => "extended_menu",
            Self::ExtendedLogout => "extended_logout",
            Self::DirectUrl => "direct_url",
        })
    }
}

// ============================================================================
// DashboardPage
// ============================================================================

/// The signed-in workspace.
#[derive(Debug, Clone)]
pub struct DashboardPage<'d> {
    ctx: PageContext<'d>,
    profile_menu: CandidateSet,
    logout_button: CandidateSet,
    workspace_area: CandidateSet,
    settings_menu: CandidateSet,
    extended_menu: CandidateSet,
    extended_logout: CandidateSet,
}

impl<'d> DashboardPage<'d> {
    /// Binds the contract to the page the driver is on.
    #[must_use]
    pub fn new(ctx: PageContext<'d>) -> Self {
        Self {
            ctx,
            profile_menu: CandidateSet::xpaths("profile menu", &PROFILE_MENU),
            logout_button: CandidateSet::xpaths("logout button", &LOGOUT_BUTTON),
            workspace_area: CandidateSet::xpaths("workspace area", &WORKSPACE_AREA),
            settings_menu: CandidateSet::xpaths("settings menu", &SETTINGS_MENU),
            extended_menu: CandidateSet::xpaths("extended profile menu", &EXTENDED_MENU),
            extended_logout: CandidateSet::xpaths("extended logout", &EXTENDED_LOGOUT),
        }
    }

    /// Returns the page context.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &PageContext<'d> {
        &self.ctx
    }

    /// Returns `true` if the profile menu is displayed.
    pub async fn is_user_profile_menu_visible(&self) -> bool {
        self.ctx.is_visible(&self.profile_menu).await
    }

    /// Returns `true` if the workspace area is displayed.
    pub async fn is_workspace_area_visible(&self) -> bool {
        self.ctx.is_visible(&self.workspace_area).await
    }

    /// Returns `true` if a settings or menu control is displayed.
    pub async fn is_settings_menu_visible(&self) -> bool {
        self.ctx.is_visible(&self.settings_menu).await
    }

    /// Logs out and hands over to the home page.
    ///
    /// # Errors
    ///
    /// [`Error::SessionLost`](crate::Error::SessionLost) and page-load
    /// [`Error::Timeout`](crate::Error::Timeout) from the direct-URL step.
    pub async fn logout(self) -> Result<HomePage<'d>> {
        self.logout_detailed().await.map(|(_, home)| home)
    }

    /// [`logout`](Self::logout), also reporting which step fired.
    ///
    /// # Errors
    ///
    /// Same as [`logout`](Self::logout).
    pub async fn logout_detailed(self) -> Result<(LogoutStrategy, HomePage<'d>)> {
        let strategy = self.run_cascade().await?;
        info!(strategy = %strategy, "Logout step executed");

        let signed_out = self
            .ctx
            .oracle()
            .wait_for_title(
                self.ctx.driver(),
                &|title: &str| SIGNED_OUT_TITLES.iter().any(|w| title.contains(w)),
                SIGNED_OUT_WAIT,
            )
            .await?;
        if !signed_out {
            warn!("Title did not settle on a signed-out page");
        }

        Ok((strategy, HomePage::new(self.ctx)))
    }

    async fn run_cascade(&self) -> Result<LogoutStrategy> {
        let menu_opened = self.click_step(&self.profile_menu).await?;

        if menu_opened {
            if self.click_step(&self.logout_button).await? {
                return Ok(LogoutStrategy::ProfileMenu);
            }
        } else {
            warn!("Profile menu missed, trying extended menu candidates");
            if self.click_step(&self.extended_menu).await?
                && self.click_step(&self.logout_button).await?
            {
                return Ok(LogoutStrategy::ExtendedMenu);
            }
        }

        warn!("Logout control missed, trying extended logout candidates");
        if self.click_step(&self.extended_logout).await? {
            return Ok(LogoutStrategy::ExtendedLogout);
        }

        let url = &self.ctx.config().logout_url;
        warn!(url = %url, "Logout controls missed, navigating directly");
        self.ctx.open(url).await?;
        Ok(LogoutStrategy::DirectUrl)
    }

    /// Clicks the first displayed candidate of `set` within the step budget.
    async fn click_step(&self, set: &CandidateSet) -> Result<bool> {
        match self
            .ctx
            .locate_within(set, CASCADE_STEP_BUDGET)
            .await?
            .into_element()
        {
            Some(element) => self.ctx.click_element(set, &element).await,
            None => Ok(false),
        }
    }
}
