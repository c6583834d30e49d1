//! Browser automation backends.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Driver`] | Facade trait the core is written against |
//! | [`BidiDriver`] | WebDriver BiDi session over WebSocket |
//! | [`SessionBuilder`] | Fluent configuration builder |
//! | [`SessionOptions`] | Browser launch options and timeouts |
//! | [`FakeDriver`] | Scripted in-memory driver for tests |
//!
//! # Example
//!
//! ```no_run
//! use notion_e2e::{Driver, Result, SessionBuilder, SessionOptions};
//!
//! # async fn example() -> Result<()> {
//! let driver = SessionBuilder::new()
//!     .options(SessionOptions::headless())
//!     .connect()
//!     .await?;
//!
//! driver.navigate("https://www.notion.so").await?;
//! println!("{}", driver.title().await?);
//! driver.close().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// WebDriver BiDi session.
pub mod bidi;

/// Fluent builder pattern for session configuration.
pub mod builder;

/// The facade trait.
pub mod facade;

/// Scripted in-memory driver.
pub mod fake;

/// Session options and timeouts.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use bidi::BidiDriver;
pub use builder::{DEFAULT_ENDPOINT, SessionBuilder};
pub use facade::Driver;
pub use fake::{ClickAction, FakeDriver, FakeElement, FakePage, ScriptReply};
pub use options::SessionOptions;
