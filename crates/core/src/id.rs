//! Strongly-typed identifiers used across the domain.
//!
//! Every row in the credential store is keyed by a database serial. The
//! newtypes below keep teacher, student and class keys from being mixed up at
//! call sites even though they share the same representation.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a teacher account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeacherId(i64);

/// Identifier of a student account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(i64);

/// Identifier of a class.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(i64);

macro_rules! impl_serial_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        /// Parses a decimal serial. Zero and negative values are rejected
        /// since the store never hands them out.
        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                if value <= 0 {
                    return Err(DomainError::invalid_id(format!(
                        "{}: must be positive",
                        $name
                    )));
                }
                Ok(Self(value))
            }
        }
    };
}

impl_serial_newtype!(TeacherId, "TeacherId");
impl_serial_newtype!(StudentId, "StudentId");
impl_serial_newtype!(ClassId, "ClassId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_serials() {
        let id: ClassId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn rejects_non_numeric_and_non_positive() {
        assert!(matches!("abc".parse::<ClassId>(), Err(DomainError::InvalidId(_))));
        assert!(matches!("0".parse::<TeacherId>(), Err(DomainError::InvalidId(_))));
        assert!(matches!("-3".parse::<StudentId>(), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&StudentId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
