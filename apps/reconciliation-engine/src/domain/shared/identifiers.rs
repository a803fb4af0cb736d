//! Strongly-typed identifiers for domain entities.
//!
//! These prevent mixing up IDs from different contexts. The gateway assigns
//! numeric order and permanent identifiers; execution, instrument and
//! strategy identifiers are opaque strings.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_string_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

macro_rules! define_numeric_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new identifier from a raw value.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Get the raw numeric value.
            #[must_use]
            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

define_numeric_id!(
    OrderId,
    "Session-local order identifier assigned through the gateway's id counter."
);
define_numeric_id!(
    PermId,
    "Permanent order identifier, stable across gateway reconnects."
);
define_string_id!(ExecId, "Unique identifier for one execution (fill event).");
define_string_id!(
    InstrumentId,
    "Identifier for a tradeable instrument (data name)."
);
define_string_id!(StrategyId, "Name of the strategy that owns an order.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_value_and_display() {
        let id = OrderId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(format!("{id}"), "42");
    }

    #[test]
    fn order_id_equality_and_ordering() {
        assert_eq!(OrderId::new(7), OrderId::new(7));
        assert_ne!(OrderId::new(7), OrderId::new(8));
        assert!(OrderId::new(7) < OrderId::new(8));
    }

    #[test]
    fn perm_id_from_i64() {
        let id: PermId = 900_001.into();
        assert_eq!(id.value(), 900_001);
    }

    #[test]
    fn exec_id_new_and_display() {
        let id = ExecId::new("0001f4e8.65a1");
        assert_eq!(id.as_str(), "0001f4e8.65a1");
        assert_eq!(format!("{id}"), "0001f4e8.65a1");
    }

    #[test]
    fn exec_id_from_string() {
        let id: ExecId = "abc".into();
        assert_eq!(id.as_str(), "abc");

        let id: ExecId = String::from("def").into();
        assert_eq!(id.as_str(), "def");
    }

    #[test]
    fn instrument_id_into_inner() {
        let id = InstrumentId::new("AAPL");
        assert_eq!(id.into_inner(), "AAPL");
    }

    #[test]
    fn identifiers_serde_transparent() {
        let json = serde_json::to_string(&OrderId::new(5)).unwrap();
        assert_eq!(json, "5");

        let parsed: StrategyId = serde_json::from_str("\"momentum\"").unwrap();
        assert_eq!(parsed.as_str(), "momentum");
    }
}
