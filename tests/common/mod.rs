//! Shared utilities for integration tests.
//!
//! Provides common functionality used across test files:
//! - Logging initialization
//! - Live session setup from the suite configuration
//! - Offline fixtures for the product's pages

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::sync::Once;

use notion_e2e::driver::{ClickAction, FakeElement, FakePage};
use notion_e2e::{BidiDriver, Result, SuiteConfig};
use tracing_subscriber::EnvFilter;

// ============================================================================
// URLs
// ============================================================================

pub const HOME: &str = "https://www.notion.so";
pub const LOGIN: &str = "https://www.notion.so/login";
pub const ABOUT: &str = "https://www.notion.so/about";
pub const LOGOUT: &str = "https://www.notion.so/logout";

// ============================================================================
// Functions
// ============================================================================

static LOGGING: Once = Once::new();

/// Initialize tracing/logging once per test binary; `RUST_LOG` wins.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("notion_e2e=info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

/// Loads the configuration from `NOTION_E2E_*` variables.
pub fn live_config() -> Result<SuiteConfig> {
    SuiteConfig::from_env()
}

/// Connects a live session to the configured endpoint.
pub async fn live_session(config: &SuiteConfig) -> Result<BidiDriver> {
    init_logging();
    config.session_builder().connect().await
}

// ============================================================================
// Fixtures
// ============================================================================

/// Landing page with a login link that routes to [`LOGIN`].
pub fn home_page() -> FakePage {
    FakePage::new(HOME)
        .title("Notion - The all-in-one workspace")
        .element(FakeElement::new("hero").matches("//h1").text("Write, plan, share."))
        .element(FakeElement::new("nav").matches("//nav"))
        .element(
            FakeElement::new("login-link")
                .matches("//a[contains(text(), 'Log in')]")
                .on_click(ClickAction::Navigate(LOGIN.to_string())),
        )
}

/// Email-first login form.
pub fn login_page() -> FakePage {
    FakePage::new(LOGIN)
        .title("Log in | Notion")
        .source("<form><input type='email'>Check your email for a verification code</form>")
        .element(FakeElement::new("email").matches("//input[@type='email']"))
        .element(FakeElement::new("continue").matches("//button[contains(text(), 'Continue')]"))
}

/// Signed-out page served by the logout endpoint.
pub fn logout_page() -> FakePage {
    FakePage::new(LOGOUT).title("Notion")
}
