use thiserror::Error;

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("role mismatch: route requires '{required}', token carries '{actual}'")]
    RoleMismatch { required: Role, actual: Role },
}

/// Authorize a principal for a role-scoped operation.
///
/// - No IO
/// - No panics
/// - Cross-role access is always rejected
pub fn authorize(principal: &Principal, required: Role) -> Result<(), AuthzError> {
    if principal.role == required {
        Ok(())
    } else {
        Err(AuthzError::RoleMismatch {
            required,
            actual: principal.role,
        })
    }
}
