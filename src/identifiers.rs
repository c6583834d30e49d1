//! Type-safe identifiers for protocol and browser entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! | Type | Wraps | Origin |
//! |------|-------|--------|
//! | [`RequestId`] | `u64` | Generated locally, echoed by the remote end |
//! | [`SessionId`] | `String` | `session.new` result |
//! | [`ContextId`] | `String` | Browsing context (top-level tab) |
//! | [`ElementId`] | `String` | BiDi `sharedId` of a DOM node |

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// RequestId
// ============================================================================

/// Monotonic counter backing [`RequestId::generate`].
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier correlating a command with its response.
///
/// BiDi requires a JavaScript-safe unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Generates the next process-unique request ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wraps a raw ID.
    #[inline]
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// String-backed IDs
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw ID string.
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the ID as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// BiDi session identifier.
    SessionId
);

string_id!(
    /// Browsing context (tab) identifier.
    ContextId
);

string_id!(
    /// Opaque element handle.
    ///
    /// For the BiDi driver this is the node's `sharedId`; the fake driver
    /// uses its own element keys.
    ElementId
);

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn test_request_id_serializes_as_number() {
        let id = RequestId::from_raw(7);
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "7");
    }

    #[test]
    fn test_element_id_display() {
        let id = ElementId::new("f2a1-node");
        assert_eq!(id.to_string(), "f2a1-node");
        assert_eq!(id.as_str(), "f2a1-node");
    }

    #[test]
    fn test_string_ids_are_transparent() {
        let id: ContextId = serde_json::from_str("\"ctx-1\"").expect("parse");
        assert_eq!(id, ContextId::new("ctx-1"));
    }
}
