//! Page contracts.
//!
//! Each contract binds its candidate sets at construction and is written
//! purely in terms of the locator and oracle. Queries (`is_*_visible`,
//! `*_text`) never fail; actions fall back where a secondary strategy
//! exists and always hand over to the next contract.
//!
//! | Contract | Hands over to |
//! |----------|---------------|
//! | [`HomePage::click_login`] | [`LoginPage`] |
//! | [`LoginPage::login`] | [`DashboardPage`] |
//! | [`DashboardPage::logout`] | [`HomePage`] |
//!
//! # Example
//!
//! ```no_run
//! use notion_e2e::{HomePage, PageContext, Result, SuiteConfig};
//!
//! # async fn example(driver: &dyn notion_e2e::Driver) -> Result<()> {
//! let config = SuiteConfig::from_env()?;
//! let ctx = PageContext::new(driver, &config)?;
//!
//! let login = HomePage::open(ctx).await?.click_login().await?;
//! let dashboard = login.login(&config.test_username, "").await?;
//! let home = dashboard.logout().await?;
//! assert!(home.current_url().await?.contains("notion"));
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

pub mod about;

/// Shared context and helpers.
pub mod base;

pub mod dashboard;

pub mod home;

pub mod login;

// ============================================================================
// Re-exports
// ============================================================================

pub use about::{ANY_CONTENT, AboutPage};
pub use base::{PageContext, TYPING_SETTLE};
pub use dashboard::{DashboardPage, LogoutStrategy};
pub use home::{HEADER_NAVIGATION, HomePage};
pub use login::LoginPage;
