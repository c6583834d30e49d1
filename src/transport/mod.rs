//! WebSocket transport layer.
//!
//! This module handles communication between the local end (this crate)
//! and a WebDriver BiDi remote end via WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  BidiDriver     │                              │  geckodriver /  │
//! │                 │         WebSocket            │  Firefox BiDi   │
//! │  Connection     │◄────────────────────────────►│                 │
//! │  (event loop)   │   ws://host:4444/session     │  Remote end     │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::connect` - WebSocket handshake with the session endpoint
//! 2. `session.new` - Create a BiDi-only session
//! 3. `Connection::send` - Commands, correlated responses, routed events
//! 4. `Connection::shutdown` - Close the socket, fail pending requests

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, EventHandler};
