//! `schoolhouse-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod codec;
pub mod password;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize};
pub use claims::{IdentityClaims, TokenValidationError, validate_claims};
pub use codec::{Hs256TokenCodec, TokenCodec, TokenError};
pub use password::{BcryptPasswords, DEFAULT_BCRYPT_COST, PasswordError, PasswordVerifier};
pub use principal::{Principal, PrincipalId};
pub use roles::Role;
