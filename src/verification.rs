//! Emailed verification codes.
//!
//! The product signs in with a one-time code sent by email. The page
//! contracts only type a code ([`LoginPage::enter_verification_code`]);
//! retrieving it is the job of a [`VerificationCodeSource`].
//! [`MailboxCodeSource`] implements that over any [`Mailbox`], so the mail
//! transport stays outside this crate.
//!
//! [`LoginPage::enter_verification_code`]: crate::pages::LoginPage::enter_verification_code

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::wait::Deadline;

// ============================================================================
// Constants
// ============================================================================

/// Default mailbox poll cadence.
pub const DEFAULT_MAILBOX_POLL: Duration = Duration::from_secs(2);

/// Code patterns, tried in order; a capture group wins over the full match.
const CODE_PATTERNS: [&str; 5] = [
    r"(?i)\b\d{6}\b",
    r"(?i)\b\d{4}\b",
    r"(?i)code:\s*(\d+)",
    r"(?i)verification.*?(\d{4,6})",
    r"(?i)\b[A-Z0-9]{6}\b",
];

static CODE_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    CODE_PATTERNS
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!(pattern, error = %e, "Invalid code pattern");
                None
            }
        })
        .collect()
});

// ============================================================================
// Traits
// ============================================================================

/// Anything that can produce the latest verification code.
#[async_trait]
pub trait VerificationCodeSource: Send + Sync {
    /// Waits up to `timeout` for a code; `None` if none arrived.
    async fn fetch_verification_code(&self, timeout: Duration) -> Result<Option<String>>;
}

/// A mail message as seen by [`MailboxCodeSource`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    /// Plain-text and HTML parts, concatenated.
    pub body: String,
}

impl MailMessage {
    /// Creates a message.
    #[must_use]
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Returns `true` if the subject names a Notion code.
    #[must_use]
    pub fn is_code_mail(&self) -> bool {
        let subject = self.subject.to_lowercase();
        subject.contains("notion") && subject.contains("code")
    }
}

/// Read access to an inbox.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Returns the unread messages.
    async fn unread_messages(&self) -> Result<Vec<MailMessage>>;
}

// ============================================================================
// MailboxCodeSource
// ============================================================================

/// Polls a [`Mailbox`] for Notion code mails.
#[derive(Debug)]
pub struct MailboxCodeSource<M> {
    mailbox: M,
    poll: Duration,
}

impl<M: Mailbox> MailboxCodeSource<M> {
    /// Polls `mailbox` every two seconds.
    #[must_use]
    pub fn new(mailbox: M) -> Self {
        Self {
            mailbox,
            poll: DEFAULT_MAILBOX_POLL,
        }
    }

    /// Sets the poll cadence.
    #[must_use]
    pub fn with_poll_interval(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    /// Returns the mailbox.
    #[inline]
    #[must_use]
    pub fn mailbox(&self) -> &M {
        &self.mailbox
    }

    fn scan(messages: &[MailMessage]) -> Option<String> {
        messages
            .iter()
            .filter(|m| m.is_code_mail())
            .find_map(|m| extract_verification_code(&m.body))
    }
}

#[async_trait]
impl<M: Mailbox> VerificationCodeSource for MailboxCodeSource<M> {
    async fn fetch_verification_code(&self, timeout: Duration) -> Result<Option<String>> {
        let deadline = Deadline::after(timeout);
        let mut polls = 0u32;

        loop {
            polls += 1;
            let messages = self.mailbox.unread_messages().await?;
            debug!(polls, unread = messages.len(), "Mailbox polled");

            if let Some(code) = Self::scan(&messages) {
                info!(polls, "Verification code received");
                return Ok(Some(code));
            }

            let pause = deadline.clip(self.poll);
            if pause.is_zero() {
                warn!(timeout_ms = timeout.as_millis() as u64, "No verification code within timeout");
                return Ok(None);
            }
            tokio::time::sleep(pause).await;
        }
    }
}

/// Extracts a verification code from mail content.
///
/// Tries six digits, four digits, `code: N`, `verification … NNNN` and
/// finally any six-character alphanumeric token, case-insensitively.
#[must_use]
pub fn extract_verification_code(content: &str) -> Option<String> {
    CODE_REGEXES.iter().find_map(|regex| {
        let captures = regex.captures(content)?;
        captures
            .get(1)
            .or_else(|| captures.get(0))
            .map(|m| m.as_str().to_string())
    })
}

// ============================================================================
// Tests
// ============================================================================
