//! Correlation and identity types for drift operations
//!
//! Every analysis, sweep run and manual request owns a uniquely generated
//! identifier. Identifiers are UUIDv7 strings, so they are collision
//! resistant, roughly time ordered and never require coordination.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_v7_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh identifier using UUIDv7
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Get the string representation
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Create from an existing string (for deserialization or caller-supplied ids)
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

uuid_v7_id!(
    /// Opaque id threading one logical operation across engine, audit and metrics
    CorrelationId
);

uuid_v7_id!(
    /// Stable identifier of one completed drift analysis
    AnalysisId
);

uuid_v7_id!(
    /// Identifier of one scheduled sweep execution
    RunId
);

uuid_v7_id!(
    /// Identifier of one manual drift request
    RequestId
);
