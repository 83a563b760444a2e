//! Identity token codec (HS256 JWT).
//!
//! The signing secret is injected at construction; nothing in this module
//! reads the environment. Validation fails closed: every decode, signature,
//! algorithm or claims problem collapses into [`TokenError::InvalidToken`].

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::{IdentityClaims, Principal, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signing secret must not be empty")]
    EmptySecret,

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("invalid token")]
    InvalidToken,
}

/// Issues and validates identity tokens.
pub trait TokenCodec: Send + Sync {
    fn issue(&self, principal: Principal, now: DateTime<Utc>) -> Result<String, TokenError>;

    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, TokenError>;
}

/// HMAC-SHA256 signed JWTs with an optional lifetime.
#[derive(Clone)]
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Option<Duration>,
}

impl Hs256TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Option<Duration>) -> Result<Self, TokenError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        // Expiry is optional in our claims and checked in `validate_claims`
        // against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn issue(&self, principal: Principal, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = IdentityClaims::new(principal, now, self.ttl.map(|ttl| now + ttl));

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, TokenError> {
        let data = jsonwebtoken::decode::<IdentityClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                TokenError::InvalidToken
            })?;

        validate_claims(&data.claims, now).map_err(|e| {
            tracing::debug!(error = %e, "token claims rejected");
            TokenError::InvalidToken
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{PrincipalId, Role};

    const SECRET: &str = "test-secret";

    fn codec() -> Hs256TokenCodec {
        Hs256TokenCodec::new(SECRET, None).unwrap()
    }

    fn teacher(id: i64) -> Principal {
        Principal {
            id: PrincipalId::new(id),
            role: Role::Teacher,
        }
    }

    #[test]
    fn issued_token_validates_to_the_same_principal() {
        let codec = codec();
        let now = Utc::now();
        let token = codec.issue(teacher(9), now).unwrap();
        assert_eq!(codec.validate(&token, now).unwrap(), teacher(9));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert_eq!(Hs256TokenCodec::new("", None).unwrap_err(), TokenError::EmptySecret);
    }

    #[test]
    fn token_from_another_secret_is_invalid() {
        let now = Utc::now();
        let other = Hs256TokenCodec::new("another-secret", None).unwrap();
        let token = other.issue(teacher(1), now).unwrap();
        assert_eq!(codec().validate(&token, now), Err(TokenError::InvalidToken));
    }

    #[test]
    fn other_algorithms_are_invalid() {
        let now = Utc::now();
        let claims = IdentityClaims::new(teacher(1), now, None);
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(codec().validate(&token, now), Err(TokenError::InvalidToken));
    }

    #[test]
    fn unsigned_token_is_invalid() {
        // {"alg":"none","typ":"JWT"}.{"id":"1","role":"teacher","iat":0}.
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJpZCI6IjEiLCJyb2xlIjoidGVhY2hlciIsImlhdCI6MH0.";
        assert_eq!(codec().validate(token, Utc::now()), Err(TokenError::InvalidToken));
    }

    #[test]
    fn garbage_is_invalid() {
        for token in ["", "not-a-token", "a.b.c", "...."] {
            assert_eq!(codec().validate(token, Utc::now()), Err(TokenError::InvalidToken));
        }
    }

    #[test]
    fn unknown_role_tag_is_invalid() {
        let now = Utc::now();
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "id": "1", "role": "admin", "iat": now.timestamp() }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(codec().validate(&token, now), Err(TokenError::InvalidToken));
    }

    #[test]
    fn ttl_expires_tokens() {
        let codec = Hs256TokenCodec::new(SECRET, Some(Duration::minutes(10))).unwrap();
        let now = Utc::now();
        let token = codec.issue(teacher(4), now).unwrap();

        assert!(codec.validate(&token, now + Duration::minutes(9)).is_ok());
        assert_eq!(
            codec.validate(&token, now + Duration::minutes(10)),
            Err(TokenError::InvalidToken)
        );
    }

    const BASE64URL: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

    proptest! {
        #[test]
        fn any_single_character_edit_is_rejected(
            id in 1i64..1_000_000,
            student in any::<bool>(),
            position in any::<prop::sample::Index>(),
            replacement in any::<prop::sample::Index>(),
        ) {
            let codec = codec();
            let now = Utc::now();
            let role = if student { Role::Student } else { Role::Teacher };
            let token = codec.issue(Principal { id: PrincipalId::new(id), role }, now).unwrap();

            let mut bytes = token.into_bytes();
            let editable: Vec<usize> = (0..bytes.len()).filter(|&i| bytes[i] != b'.').collect();
            let i = editable[position.index(editable.len())];

            let candidates: Vec<u8> = BASE64URL.iter().copied().filter(|&c| c != bytes[i]).collect();
            bytes[i] = candidates[replacement.index(candidates.len())];
            let tampered = String::from_utf8(bytes).unwrap();

            prop_assert_eq!(codec.validate(&tampered, now), Err(TokenError::InvalidToken));
        }
    }
}
