//! WebDriver BiDi protocol message types.
//!
//! This module defines the message format for communication between the
//! local end (this crate) and a BiDi remote end such as geckodriver.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`Request`] | Local → Remote | Command request |
//! | [`Message::Success`] | Remote → Local | Command result |
//! | [`Message::Error`] | Remote → Local | Command failure |
//! | [`Message::Event`] | Remote → Local | Browser notification |
//!
//! # Command Naming
//!
//! Commands follow `module.methodName` format:
//!
//! - `browsingContext.navigate`
//! - `browsingContext.locateNodes`
//! - `script.callFunction`

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions organized by module.
pub mod command;

/// Event message types.
pub mod event;

/// Request and incoming message types.
pub mod request;

/// Remote value conversion.
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{
    BrowsingContextCommand, Command, InputCommand, NodeLocator, ReadinessState, ScriptCommand,
    ScriptTarget, SessionCommand, Viewport,
};
pub use event::{Event, ParsedEvent};
pub use request::{Message, Request};
