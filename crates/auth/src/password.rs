//! Password hashing with bcrypt.
//!
//! Plaintext never leaves this module except as the caller's own borrowed
//! input, and is never logged.

use thiserror::Error;

/// Work factor used unless configuration overrides it.
pub const DEFAULT_BCRYPT_COST: u32 = 8;

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("bcrypt cost {0} is outside 4..=31")]
    InvalidCost(u32),

    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// One-way password hashing with a verify operation.
pub trait PasswordVerifier: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError>;

    /// Returns `false` for a mismatch and for an unreadable digest alike.
    fn verify(&self, plaintext: &str, digest: &str) -> bool;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BcryptPasswords {
    cost: u32,
}

impl BcryptPasswords {
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(PasswordError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptPasswords {
    fn default() -> Self {
        Self {
            cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl PasswordVerifier for BcryptPasswords {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| PasswordError::Hash(e.to_string()))
    }

    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        bcrypt::verify(plaintext, digest).unwrap_or(false)
    }
}
