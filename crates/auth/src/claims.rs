use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Principal, PrincipalId, Role};

/// JWT claims model (transport-agnostic).
///
/// `id` is a decimal string to stay wire-compatible with tokens minted by
/// earlier deployments. `exp` is only present when a token lifetime is
/// configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Principal identifier.
    pub id: String,

    /// Which account table `id` refers to.
    pub role: Role,

    /// Issued-at, unix seconds.
    pub iat: i64,

    /// Expiration, unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl IdentityClaims {
    pub fn new(principal: Principal, issued_at: DateTime<Utc>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: principal.id.to_string(),
            role: principal.role,
            iat: issued_at.timestamp(),
            exp: expires_at.map(|t| t.timestamp()),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("principal id is not numeric")]
    InvalidPrincipal,
}

/// Deterministically validate decoded claims and resolve the principal.
///
/// Signature verification happens in the codec before this is called.
pub fn validate_claims(claims: &IdentityClaims, now: DateTime<Utc>) -> Result<Principal, TokenValidationError> {
    if let Some(exp) = claims.exp {
        if exp <= claims.iat {
            return Err(TokenValidationError::InvalidTimeWindow);
        }
        if now.timestamp() >= exp {
            return Err(TokenValidationError::Expired);
        }
    }

    let id: PrincipalId = claims
        .id
        .parse()
        .map_err(|_| TokenValidationError::InvalidPrincipal)?;

    Ok(Principal { id, role: claims.role })
}
