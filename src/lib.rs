//! Notion E2E - SPA-aware element location and readiness for end-to-end tests.
//!
//! This library drives a browser over WebDriver BiDi and gives test
//! scenarios a small, robust vocabulary for a client-rendered product whose
//! DOM is rebuilt after every route change.
//!
//! # Architecture
//!
//! Four layers, each written only against the one below:
//!
//! - **Driver Facade**: the [`Driver`] trait; [`BidiDriver`] implements it
//!   over a WebSocket, [`FakeDriver`] in memory
//! - **Readiness Oracle**: [`ReadinessOracle`] polls document, framework,
//!   network and loading-indicator probes within a [`WaitBudget`]
//! - **Multi-Strategy Locator**: [`Locator`] tries every selector of a
//!   [`CandidateSet`] in order, re-consulting the oracle between attempts
//! - **Page Contracts**: [`HomePage`], [`LoginPage`], [`DashboardPage`] and
//!   [`AboutPage`] with total queries and degrading actions
//!
//! Key design principles:
//!
//! - Timeouts are outcomes, not errors: the caller always gets a value
//! - Only [`Error::SessionLost`] escapes the locator and oracle
//! - Every wait is bounded by an explicit deadline
//! - Strictly sequential: nothing in the core spawns tasks
//!
//! # Quick Start
//!
//! ```no_run
//! use notion_e2e::{HomePage, PageContext, Result, SuiteConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Defaults, overridden by NOTION_E2E_* variables
//!     let config = SuiteConfig::from_env()?;
//!     let driver = config.session_builder().connect().await?;
//!     let ctx = PageContext::new(&driver, &config)?;
//!
//!     // Home -> Login -> Dashboard -> Home
//!     let login = HomePage::open(ctx).await?.click_login().await?;
//!     let dashboard = login.login(&config.test_username, "").await?;
//!     let home = dashboard.logout().await?;
//!     println!("Signed out at {}", home.current_url().await?);
//!
//!     driver.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Suite configuration: defaults, TOML, environment |
//! | [`debug`] | Page-structure dumper |
//! | [`driver`] | Driver facade and backends |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`locator`] | Candidate sets and the locate loop |
//! | [`pages`] | Page contracts |
//! | [`protocol`] | WebDriver BiDi message types (internal) |
//! | [`transport`] | WebSocket transport layer (internal) |
//! | [`verification`] | Emailed verification codes |
//! | [`wait`] | Wait budgets and the readiness oracle |

// ============================================================================
// Modules
// ============================================================================

/// Suite configuration.
///
/// [`SuiteConfig`] is an explicit record passed to every page contract.
pub mod config;

/// Page-structure dumper.
pub mod debug;

/// Driver facade and backends.
///
/// Use [`SessionBuilder`] to connect a [`BidiDriver`].
pub mod driver;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for protocol entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Multi-strategy element location.
pub mod locator;

/// Page contracts.
///
/// - [`HomePage`] - Public landing page
/// - [`LoginPage`] - Email-first login form
/// - [`DashboardPage`] - Signed-in workspace
/// - [`AboutPage`] - Static about page
pub mod pages;

/// WebDriver BiDi message types.
///
/// Internal module defining command/response/event structures.
pub mod protocol;

/// WebSocket transport layer.
///
/// Internal module handling the connection and request correlation.
pub mod transport;

/// Verification code retrieval contract.
pub mod verification;

/// Wait budgets and the readiness oracle.
pub mod wait;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration
pub use config::SuiteConfig;

// Driver types
pub use driver::{BidiDriver, Driver, FakeDriver, SessionBuilder, SessionOptions};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ContextId, ElementId, RequestId, SessionId};

// Locator types
pub use locator::{CandidateSet, Locator, LocatorOutcome, Selector};

// Page contracts
pub use pages::{AboutPage, DashboardPage, HomePage, LoginPage, LogoutStrategy, PageContext};

// Verification
pub use verification::{VerificationCodeSource, extract_verification_code};

// Wait types
pub use wait::{Readiness, ReadinessOracle, ReadinessReport, WaitBudget};
