use core::str::FromStr;
use serde::{Deserialize, Serialize};

use schoolhouse_core::{DomainError, StudentId, TeacherId};

use crate::Role;

/// Identity of an authenticated principal (the row id of its account).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(i64);

impl PrincipalId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<TeacherId> for PrincipalId {
    fn from(value: TeacherId) -> Self {
        Self(value.get())
    }
}

impl From<StudentId> for PrincipalId {
    fn from(value: StudentId) -> Self {
        Self(value.get())
    }
}

impl FromStr for PrincipalId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .parse::<i64>()
            .map_err(|e| DomainError::invalid_id(format!("PrincipalId: {e}")))?;
        if value <= 0 {
            return Err(DomainError::invalid_id("PrincipalId: must be positive"));
        }
        Ok(Self(value))
    }
}

/// An authenticated actor: account id plus the role it signed in as.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: PrincipalId,
    pub role: Role,
}

impl Principal {
    pub fn teacher(id: TeacherId) -> Self {
        Self {
            id: id.into(),
            role: Role::Teacher,
        }
    }

    pub fn student(id: StudentId) -> Self {
        Self {
            id: id.into(),
            role: Role::Student,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_ids_parse_from_positive_decimals() {
        assert_eq!("17".parse::<PrincipalId>().unwrap(), PrincipalId::new(17));
    }

    #[test]
    fn zero_negative_and_non_numeric_ids_are_rejected() {
        for raw in ["0", "-4", "abc", ""] {
            assert!(raw.parse::<PrincipalId>().is_err(), "{raw}");
        }
    }
}
