//! Suite configuration.
//!
//! [`SuiteConfig`] is an explicit record handed to page contracts by
//! reference. Sources are merged in priority order (later wins):
//!
//! 1. Built-in defaults ([`SuiteConfig::default()`])
//! 2. A TOML file whose dotted keys map to tables
//!    (`base.url` is `[base] url = ...`)
//! 3. `NOTION_E2E_*` environment variables (`base.url` is
//!    `NOTION_E2E_BASE_URL`)
//!
//! # Keys
//!
//! | Key | Default |
//! |-----|---------|
//! | `base.url` | `https://www.notion.so` |
//! | `login.url` | `https://www.notion.so/login` |
//! | `about.url` | `https://www.notion.so/about` |
//! | `logout.url` | `https://www.notion.so/logout` |
//! | `test.username` / `test.password` | `testuser@example.com` / empty |
//! | `real.test.username` / `real.test.password` | empty |
//! | `implicit.wait.seconds` | 15 |
//! | `explicit.wait.seconds` | 15 |
//! | `page.load.timeout.seconds` | 30 |
//! | `script.timeout.seconds` | 30 |
//! | `expected.home.title` / `expected.login.title` | `Notion` |
//! | `webdriver.url` | `ws://127.0.0.1:4444/session` |
//! | `email.address` / `email.password` | unset |
//! | `headless` | `true` |
//! | `framework.grace.millis` | 2000 |

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::time::Duration;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};
use url::Url;

use crate::driver::{DEFAULT_ENDPOINT, SessionBuilder, SessionOptions};
use crate::error::{Error, Result};
use crate::wait::{DEFAULT_PROBE_INTERVAL, WaitBudget};

// ============================================================================
// Constants
// ============================================================================

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "NOTION_E2E_";

/// Config files larger than this are rejected.
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// Upper bound for every wait and timeout key, in seconds.
pub const MAX_WAIT_SECONDS: u64 = 3600;

/// Every key the suite reads.
pub const KEYS: [&str; 19] = [
    "base.url",
    "login.url",
    "about.url",
    "logout.url",
    "test.username",
    "test.password",
    "real.test.username",
    "real.test.password",
    "implicit.wait.seconds",
    "explicit.wait.seconds",
    "page.load.timeout.seconds",
    "script.timeout.seconds",
    "expected.home.title",
    "expected.login.title",
    "webdriver.url",
    "email.address",
    "email.password",
    "headless",
    "framework.grace.millis",
];

// ============================================================================
// SuiteConfig
// ============================================================================

/// URLs, credentials and timeouts for one suite run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteConfig {
    /// Home URL.
    pub base_url: String,
    /// Login URL.
    pub login_url: String,
    /// Static page URL.
    pub about_url: String,
    /// Direct logout endpoint.
    pub logout_url: String,
    /// Negative-path username.
    pub test_username: String,
    /// Negative-path password.
    pub test_password: String,
    /// Positive-path username.
    pub real_test_username: String,
    /// Positive-path password.
    pub real_test_password: String,
    /// Per-call element lookup budget, in seconds.
    pub implicit_wait_seconds: u64,
    /// Default locator/oracle deadline, in seconds.
    pub explicit_wait_seconds: u64,
    /// Page-load limit, in seconds.
    pub page_load_timeout_seconds: u64,
    /// Script execution limit, in seconds.
    pub script_timeout_seconds: u64,
    /// Title the home page is expected to carry.
    pub expected_home_title: String,
    /// Title the login page is expected to carry.
    pub expected_login_title: String,
    /// BiDi WebSocket endpoint.
    pub webdriver_url: String,
    /// Verification mailbox address.
    pub email_address: Option<String>,
    /// Verification mailbox password.
    pub email_password: Option<String>,
    /// Run the browser without a window.
    pub headless: bool,
    /// Grace sleep spent on a missing framework root, in milliseconds.
    pub framework_grace_millis: u64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.notion.so".to_string(),
            login_url: "https://www.notion.so/login".to_string(),
            about_url: "https://www.notion.so/about".to_string(),
            logout_url: "https://www.notion.so/logout".to_string(),
            test_username: "testuser@example.com".to_string(),
            test_password: String::new(),
            real_test_username: String::new(),
            real_test_password: String::new(),
            implicit_wait_seconds: 15,
            explicit_wait_seconds: 15,
            page_load_timeout_seconds: 30,
            script_timeout_seconds: 30,
            expected_home_title: "Notion".to_string(),
            expected_login_title: "Notion".to_string(),
            webdriver_url: DEFAULT_ENDPOINT.to_string(),
            email_address: None,
            email_password: None,
            headless: true,
            framework_grace_millis: 2000,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl SuiteConfig {
    /// Loads defaults, then `path`, then environment overrides.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be read
    /// - [`Error::Config`] if it is too large or a value is invalid
    /// - [`Error::Toml`] if it is not valid TOML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let size = fs::metadata(path)?.len();
        if size > MAX_CONFIG_FILE_SIZE {
            return Err(Error::config(format!(
                "{} is {size} bytes, limit is {MAX_CONFIG_FILE_SIZE}",
                path.display()
            )));
        }

        let text = fs::read_to_string(path)?;
        debug!(path = %path.display(), "Loading suite configuration");

        let mut config = Self::default();
        config.merge_toml(&text)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Loads defaults plus environment overrides.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if an override is invalid.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document over the defaults.
    ///
    /// # Errors
    ///
    /// [`Error::Toml`] for malformed TOML, [`Error::Config`] for bad values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config = Self::default();
        config.merge_toml(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Merges every known key present in `text`.
    ///
    /// # Errors
    ///
    /// [`Error::Toml`] for malformed TOML, [`Error::Config`] for bad values.
    pub fn merge_toml(&mut self, text: &str) -> Result<()> {
        let table: toml::Table = toml::from_str(text)?;

        let mut properties = FxHashMap::default();
        flatten("", &table, &mut properties);

        for (key, value) in &properties {
            if KEYS.contains(&key.as_str()) {
                self.set(key, value)?;
            } else {
                warn!(key = %key, "Ignoring unknown configuration key");
            }
        }
        Ok(())
    }

    /// Applies `NOTION_E2E_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if an override value is invalid.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        for key in KEYS {
            let name = env_name(key);
            if let Some(value) = lookup(&name) {
                debug!(key, env = %name, "Configuration override");
                self.set(key, &value)?;
            }
        }
        Ok(())
    }

    /// Sets one dotted key from its string form.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] for an unknown key or an unparsable value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "base.url" => self.base_url = value.to_string(),
            "login.url" => self.login_url = value.to_string(),
            "about.url" => self.about_url = value.to_string(),
            "logout.url" => self.logout_url = value.to_string(),
            "test.username" => self.test_username = value.to_string(),
            "test.password" => self.test_password = value.to_string(),
            "real.test.username" => self.real_test_username = value.to_string(),
            "real.test.password" => self.real_test_password = value.to_string(),
            "implicit.wait.seconds" => self.implicit_wait_seconds = parse_number(key, value)?,
            "explicit.wait.seconds" => self.explicit_wait_seconds = parse_number(key, value)?,
            "page.load.timeout.seconds" => {
                self.page_load_timeout_seconds = parse_number(key, value)?;
            }
            "script.timeout.seconds" => self.script_timeout_seconds = parse_number(key, value)?,
            "expected.home.title" => self.expected_home_title = value.to_string(),
            "expected.login.title" => self.expected_login_title = value.to_string(),
            "webdriver.url" => self.webdriver_url = value.to_string(),
            "email.address" => self.email_address = non_empty(value),
            "email.password" => self.email_password = non_empty(value),
            "headless" => {
                self.headless = match value {
                    "true" | "1" | "yes" => true,
                    "false" | "0" | "no" => false,
                    other => {
                        return Err(Error::config(format!("headless: expected a boolean, got {other:?}")));
                    }
                };
            }
            "framework.grace.millis" => self.framework_grace_millis = parse_number(key, value)?,
            other => return Err(Error::config(format!("Unknown configuration key: {other}"))),
        }
        Ok(())
    }

    /// Checks URLs and waits.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("base.url", &self.base_url),
            ("login.url", &self.login_url),
            ("about.url", &self.about_url),
            ("logout.url", &self.logout_url),
            ("webdriver.url", &self.webdriver_url),
        ] {
            Url::parse(value)
                .map_err(|e| Error::config(format!("{key}: {value:?} is not a URL ({e})")))?;
        }

        for (key, value) in [
            ("implicit.wait.seconds", self.implicit_wait_seconds),
            ("explicit.wait.seconds", self.explicit_wait_seconds),
            ("page.load.timeout.seconds", self.page_load_timeout_seconds),
            ("script.timeout.seconds", self.script_timeout_seconds),
        ] {
            if value == 0 {
                return Err(Error::config(format!("{key} must be greater than zero")));
            }
            if value > MAX_WAIT_SECONDS {
                return Err(Error::config(format!(
                    "{key} must not exceed {MAX_WAIT_SECONDS}s, got {value}"
                )));
            }
        }

        if self.framework_grace_millis > MAX_WAIT_SECONDS * 1000 {
            return Err(Error::config(format!(
                "framework.grace.millis must not exceed {}",
                MAX_WAIT_SECONDS * 1000
            )));
        }

        if Duration::from_secs(self.explicit_wait_seconds) <= DEFAULT_PROBE_INTERVAL {
            return Err(Error::config(format!(
                "explicit.wait.seconds must exceed the {}s probe interval",
                DEFAULT_PROBE_INTERVAL.as_secs()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Derived Values
// ============================================================================

impl SuiteConfig {
    /// Default locator/oracle budget: explicit wait, 2 s interval.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the explicit wait is not above 2 s.
    pub fn default_budget(&self) -> Result<WaitBudget> {
        WaitBudget::with_default_interval(Duration::from_secs(self.explicit_wait_seconds))
    }

    /// Per-call element lookup budget.
    #[inline]
    #[must_use]
    pub fn implicit_wait(&self) -> Duration {
        Duration::from_secs(self.implicit_wait_seconds)
    }

    /// Page-load limit.
    #[inline]
    #[must_use]
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_seconds)
    }

    /// Script execution limit.
    #[inline]
    #[must_use]
    pub fn script_timeout(&self) -> Duration {
        Duration::from_secs(self.script_timeout_seconds)
    }

    /// Framework grace sleep.
    #[inline]
    #[must_use]
    pub fn framework_grace(&self) -> Duration {
        Duration::from_millis(self.framework_grace_millis)
    }

    /// Session options matching this configuration.
    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        let options = SessionOptions::new()
            .with_implicit_wait(self.implicit_wait())
            .with_page_load_timeout(self.page_load_timeout())
            .with_script_timeout(self.script_timeout());

        if self.headless {
            options.with_headless()
        } else {
            options
        }
    }

    /// Session builder pointed at `webdriver.url`.
    #[must_use]
    pub fn session_builder(&self) -> SessionBuilder {
        SessionBuilder::new()
            .endpoint(self.webdriver_url.clone())
            .options(self.session_options())
    }

    /// Returns `true` if positive-path credentials are configured.
    #[inline]
    #[must_use]
    pub fn has_real_credentials(&self) -> bool {
        !self.real_test_username.is_empty()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Environment variable name for a dotted key.
#[must_use]
pub fn env_name(key: &str) -> String {
    format!("{ENV_PREFIX}{}", key.replace('.', "_").to_uppercase())
}

/// Flattens nested tables into dotted keys.
fn flatten(prefix: &str, table: &toml::Table, out: &mut FxHashMap<String, String>) {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };

        match value {
            toml::Value::Table(nested) => flatten(&key, nested, out),
            toml::Value::String(s) => {
                out.insert(key, s.clone());
            }
            other => {
                out.insert(key, other.to_string());
            }
        }
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| Error::config(format!("{key}: expected a whole number, got {value:?}")))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SuiteConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.implicit_wait(), Duration::from_secs(15));
        assert_eq!(
            config.default_budget().expect("budget").total(),
            Duration::from_secs(15)
        );
    }

    #[test]
    fn test_dotted_keys_map_to_tables() {
        let config = SuiteConfig::from_toml_str(
            r#"
            [base]
            url = "https://staging.notion.so"

            [explicit.wait]
            seconds = 20

            [real.test]
            username = "qa@example.com"

            [expected.home]
            title = "Notion Home"
            "#,
        )
        .expect("config");

        assert_eq!(config.base_url, "https://staging.notion.so");
        assert_eq!(config.explicit_wait_seconds, 20);
        assert_eq!(config.real_test_username, "qa@example.com");
        assert_eq!(config.expected_home_title, "Notion Home");
        assert_eq!(config.login_url, "https://www.notion.so/login");
        assert!(config.has_real_credentials());
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = SuiteConfig::default();
        config
            .apply_overrides(|name| match name {
                "NOTION_E2E_LOGIN_URL" => Some("https://example.test/login".into()),
                "NOTION_E2E_IMPLICIT_WAIT_SECONDS" => Some("5".into()),
                "NOTION_E2E_EMAIL_ADDRESS" => Some("inbox@example.com".into()),
                _ => None,
            })
            .expect("overrides");

        assert_eq!(config.login_url, "https://example.test/login");
        assert_eq!(config.implicit_wait_seconds, 5);
        assert_eq!(config.email_address.as_deref(), Some("inbox@example.com"));
    }

    #[test]
    fn test_env_name() {
        assert_eq!(env_name("base.url"), "NOTION_E2E_BASE_URL");
        assert_eq!(
            env_name("page.load.timeout.seconds"),
            "NOTION_E2E_PAGE_LOAD_TIMEOUT_SECONDS"
        );
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = SuiteConfig::from_toml_str("[about]\nurl = \"not a url\"").expect_err("url");
        assert!(err.to_string().contains("about.url"));
    }

    #[test]
    fn test_explicit_wait_must_exceed_interval() {
        let err = SuiteConfig::from_toml_str("[explicit.wait]\nseconds = 2").expect_err("wait");
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_waits_are_capped() {
        let err = SuiteConfig::from_toml_str("[explicit.wait]\nseconds = \"18446744073709551615\"")
            .expect_err("huge wait");
        assert!(matches!(err, Error::Config { .. }));

        let err = SuiteConfig::from_toml_str("[page.load.timeout]\nseconds = 3601")
            .expect_err("page load");
        assert!(err.to_string().contains("page.load.timeout.seconds"));

        assert!(SuiteConfig::from_toml_str("[implicit.wait]\nseconds = 3600").is_ok());
    }

    #[test]
    fn test_non_numeric_wait_rejected() {
        let err = SuiteConfig::from_toml_str("[implicit.wait]\nseconds = \"soon\"").expect_err("wait");
        assert!(err.to_string().contains("implicit.wait.seconds"));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            SuiteConfig::from_toml_str("[base\nurl ="),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "headless = false\n[webdriver]\nurl = \"ws://10.0.0.5:4444/session\"")
            .expect("write");

        let config = SuiteConfig::load(file.path()).expect("load");
        assert!(!config.headless);
        assert_eq!(config.webdriver_url, "ws://10.0.0.5:4444/session");
        assert!(!config.session_options().is_headless());
    }

    #[test]
    fn test_session_options_follow_timeouts() {
        let mut config = SuiteConfig::default();
        config.page_load_timeout_seconds = 45;
        let options = config.session_options();
        assert_eq!(options.page_load_timeout, Duration::from_secs(45));
        assert!(options.is_headless());
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = SuiteConfig::from_toml_str(include_str!("../config/notion.toml"))
            .expect("shipped config");
        assert_eq!(config, SuiteConfig::default());
    }
}
