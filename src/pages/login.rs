//! Login page contract.
//!
//! The product signs in with an emailed code, so a missing password field is
//! expected and tolerated.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::Result;
use crate::locator::CandidateSet;

use super::base::PageContext;
use super::dashboard::DashboardPage;

// ============================================================================
// Candidate Sets
// ============================================================================

const EMAIL_FIELD: [&str; 5] = [
    "//input[@type='email']",
    "//input[contains(@placeholder, 'email')]",
    "//input[contains(@placeholder, 'Email')]",
    "//input[@name='email']",
    "//input[@id='email']",
];

const PASSWORD_FIELD: [&str; 5] = [
    "//input[@type='password']",
    "//input[contains(@placeholder, 'password')]",
    "//input[contains(@placeholder, 'Password')]",
    "//input[@name='password']",
    "//input[@id='password']",
];

const SUBMIT_BUTTON: [&str; 5] = [
    "//button[contains(text(), 'Continue')]",
    "//button[contains(text(), 'Log in')]",
    "//button[contains(text(), 'Sign in')]",
    "//button[@type='submit']",
    "//input[@type='submit']",
];

const ERROR_MESSAGE: [&str; 5] = [
    "//*[contains(text(), 'Invalid')]",
    "//*[contains(text(), 'incorrect')]",
    "//*[contains(text(), 'error')]",
    "//*[contains(@class, 'error')]",
    "//*[contains(@class, 'invalid')]",
];

const VERIFICATION_CODE_FIELD: [&str; 5] = [
    "//input[@autocomplete='one-time-code']",
    "//input[contains(@placeholder, 'code')]",
    "//input[contains(@placeholder, 'Code')]",
    "//input[@inputmode='numeric']",
    "//input[@type='text']",
];

/// Budget for the optional password step.
const PASSWORD_BUDGET: Duration = Duration::from_secs(3);

/// Pause after submitting for the next view to start rendering.
const SUBMIT_SETTLE: Duration = Duration::from_secs(2);

// ============================================================================
// LoginPage
// ============================================================================

/// The email-first login form.
#[derive(Debug, Clone)]
pub struct LoginPage<'d> {
    ctx: PageContext<'d>,
    email_field: CandidateSet,
    password_field: CandidateSet,
    submit_button: CandidateSet,
    error_message: CandidateSet,
    verification_code_field: CandidateSet,
}

impl<'d> LoginPage<'d> {
    /// Binds the contract to the page the driver is on.
    #[must_use]
    pub fn new(ctx: PageContext<'d>) -> Self {
        Self {
            ctx,
            email_field: CandidateSet::xpaths("email field", &EMAIL_FIELD),
            password_field: CandidateSet::xpaths("password field", &PASSWORD_FIELD),
            submit_button: CandidateSet::xpaths("submit button", &SUBMIT_BUTTON),
            error_message: CandidateSet::xpaths("error message", &ERROR_MESSAGE),
            verification_code_field: CandidateSet::xpaths(
                "verification code field",
                &VERIFICATION_CODE_FIELD,
            ),
        }
    }

    /// Navigates to `login.url` and waits for readiness.
    ///
    /// # Errors
    ///
    /// [`Error::SessionLost`](crate::Error::SessionLost) and page-load
    /// [`Error::Timeout`](crate::Error::Timeout).
    pub async fn open(ctx: PageContext<'d>) -> Result<Self> {
        ctx.open(&ctx.config().login_url).await?;
        Ok(Self::new(ctx))
    }

    /// Returns the page context.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &PageContext<'d> {
        &self.ctx
    }

    /// Types into the email field, falling back to any input field.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn enter_email(&self, email: &str) -> Result<bool> {
        let mut outcome = self.ctx.locate(&self.email_field).await?;
        if !outcome.is_found() {
            warn!("Email field not found, trying any input field");
            outcome = self
                .ctx
                .locate(&CandidateSet::any_input_field())
                .await?;
        }

        match outcome.into_element() {
            Some(element) => self.ctx.type_into("email field", &element, email).await,
            None => Ok(false),
        }
    }

    /// Types into the password field if one shows within a short budget.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn enter_password(&self, password: &str) -> Result<bool> {
        let outcome = self
            .ctx
            .locate_within(&self.password_field, PASSWORD_BUDGET)
            .await?;

        match outcome.into_element() {
            Some(element) => {
                self.ctx
                    .type_into("password field", &element, password)
                    .await
            }
            None => {
                info!("No password field, continuing with email-code flow");
                Ok(false)
            }
        }
    }

    /// Clicks submit, falling back to any submit button.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn click_submit(&self) -> Result<bool> {
        if self.ctx.click(&self.submit_button).await? {
            return Ok(true);
        }
        warn!("Submit button not found, trying any submit button");
        self.ctx.click(&CandidateSet::any_submit_button()).await
    }

    /// Email, optional password, submit; always hands over to the dashboard.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn login(self, email: &str, password: &str) -> Result<DashboardPage<'d>> {
        info!(email, "Logging in");

        if !self.enter_email(email).await? {
            warn!("Email was not entered");
        }
        self.enter_password(password).await?;
        if self.click_submit().await? {
            self.ctx.pause(SUBMIT_SETTLE).await;
        } else {
            warn!("Login form was not submitted");
        }

        Ok(DashboardPage::new(self.ctx))
    }

    /// Types an emailed verification code and submits it.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn enter_verification_code(&self, code: &str) -> Result<bool> {
        let Some(element) = self
            .ctx
            .locate(&self.verification_code_field)
            .await?
            .into_element()
        else {
            warn!("Verification code field not found");
            return Ok(false);
        };

        if !self
            .ctx
            .type_into("verification code field", &element, code)
            .await?
        {
            return Ok(false);
        }
        self.click_submit().await
    }

    /// Returns `true` once the URL leaves `baseline` within `within`.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionLost`](crate::Error::SessionLost).
    pub async fn wait_for_navigation(&self, baseline: &str, within: Duration) -> Result<bool> {
        self.ctx
            .oracle()
            .wait_for_url_change(self.ctx.driver(), baseline, within)
            .await
    }

    /// Returns `true` if an error message is displayed.
    pub async fn is_error_message_visible(&self) -> bool {
        self.ctx.is_visible(&self.error_message).await
    }

    /// Returns the error message text.
    pub async fn error_message_text(&self) -> Option<String> {
        self.ctx.text_of(&self.error_message).await
    }

    /// Returns the current URL.
    ///
    /// # Errors
    ///
    /// Any driver error.
    pub async fn current_url(&self) -> Result<String> {
        self.ctx.current_url().await
    }

    /// Returns the page source.
    ///
    /// # Errors
    ///
    /// Any driver error.
    pub async fn page_source(&self) -> Result<String> {
        self.ctx.driver().page_source().await
    }
}
