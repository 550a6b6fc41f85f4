//! Strongly-typed identifiers for ledger entities
//!
//! Every stored row carries a surrogate integer key. Wrapping the key in a
//! newtype keeps a `CustomerId` from being passed where an `InvoiceId` is
//! expected. The value `0` marks an entity that has not been staged yet.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Identity of an entity that has not been stored yet
            pub const UNASSIGNED: Self = Self(0);

            /// Wraps a raw key
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw key
            pub const fn value(&self) -> i64 {
                self.0
            }

            /// Returns true once a store has assigned the identity
            pub const fn is_assigned(&self) -> bool {
                self.0 > 0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(raw.parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(TruckId, "TRK");
define_id!(TruckLoadId, "LOAD");
define_id!(CustomerId, "CUST");
define_id!(InvoiceId, "INV");
define_id!(PaymentId, "PAY");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_prefix() {
        assert_eq!(CustomerId::new(7).to_string(), "CUST-7");
        assert_eq!(TruckLoadId::new(12).to_string(), "LOAD-12");
    }

    #[test]
    fn test_parse_with_and_without_prefix() {
        let with: InvoiceId = "INV-42".parse().unwrap();
        let without: InvoiceId = "42".parse().unwrap();
        assert_eq!(with, without);
        assert_eq!(with.value(), 42);
    }

    #[test]
    fn test_unassigned() {
        assert!(!TruckId::UNASSIGNED.is_assigned());
        assert!(TruckId::new(1).is_assigned());
        assert_eq!(TruckId::default(), TruckId::UNASSIGNED);
    }
}
