//! Account service: signup, sign-in and account deletion for both roles.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use schoolhouse_auth::{PasswordError, PasswordVerifier, Principal, Role, TokenCodec, TokenError};
use schoolhouse_core::{DomainError, require_non_empty};

use crate::store::{NewAccount, SchoolStore, StoreError};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("email already registered")]
    DuplicateEmail,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(StoreError),

    #[error("password task failed: {0}")]
    Task(String),
}

impl From<StoreError> for AccountError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateEmail => AccountError::DuplicateEmail,
            other => AccountError::Store(other),
        }
    }
}

/// Signup payload, before validation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// A freshly signed token and the principal it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub principal: Principal,
}

pub struct AccountService {
    store: Arc<dyn SchoolStore>,
    passwords: Arc<dyn PasswordVerifier>,
    tokens: Arc<dyn TokenCodec>,
    /// Verified against when an email is unknown, so both sign-in failures
    /// do the same amount of hashing work.
    dummy_digest: Arc<str>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn SchoolStore>,
        passwords: Arc<dyn PasswordVerifier>,
        tokens: Arc<dyn TokenCodec>,
    ) -> Result<Self, AccountError> {
        let dummy_digest = passwords.hash("schoolhouse-unknown-account")?.into();
        Ok(Self {
            store,
            passwords,
            tokens,
            dummy_digest,
        })
    }

    /// Create an account and sign a token for it.
    pub async fn register(&self, role: Role, registration: Registration) -> Result<IssuedToken, AccountError> {
        let first_name = require_non_empty("first name", &registration.first_name)?;
        let last_name = require_non_empty("last name", &registration.last_name)?;
        // Emails are stored as given so sign-in must repeat them exactly.
        require_non_empty("email", &registration.email)?;
        let email = registration.email;
        if !email.contains('@') {
            return Err(DomainError::validation("email must contain '@'").into());
        }
        if registration.password.trim().is_empty() {
            return Err(DomainError::validation("password must not be empty").into());
        }

        let password_hash = self.hash(registration.password).await?;

        let id = self
            .store
            .insert_account(
                role,
                NewAccount {
                    first_name,
                    last_name,
                    email,
                    password_hash,
                },
            )
            .await?;

        info!(%role, %id, "account registered");
        self.issue(Principal { id, role })
    }

    /// Check credentials and sign a fresh token.
    ///
    /// `None` covers both an unknown email and a wrong password; callers
    /// cannot tell which.
    pub async fn authenticate(&self, role: Role, email: &str, password: &str) -> Result<Option<IssuedToken>, AccountError> {
        let credentials = self.store.find_credentials(role, email).await?;

        let (id, digest) = match credentials {
            Some(c) => (Some(c.id), Arc::<str>::from(c.password_hash)),
            None => (None, self.dummy_digest.clone()),
        };

        let matched = self.verify(password.to_string(), digest).await?;

        match id {
            Some(id) if matched => {
                debug!(%role, %id, "sign-in accepted");
                self.issue(Principal { id, role }).map(Some)
            }
            _ => {
                debug!(%role, "sign-in rejected");
                Ok(None)
            }
        }
    }

    /// Remove the account; the store cascades to classes or enrollments.
    /// A missing account is not an error.
    pub async fn delete_account(&self, principal: Principal) -> Result<u64, AccountError> {
        let removed = self.store.delete_account(principal.role, principal.id).await?;
        info!(role = %principal.role, id = %principal.id, removed, "account deleted");
        Ok(removed)
    }

    fn issue(&self, principal: Principal) -> Result<IssuedToken, AccountError> {
        let token = self.tokens.issue(principal, Utc::now())?;
        Ok(IssuedToken { token, principal })
    }

    async fn hash(&self, password: String) -> Result<String, AccountError> {
        let passwords = self.passwords.clone();
        tokio::task::spawn_blocking(move || passwords.hash(&password))
            .await
            .map_err(|e| AccountError::Task(e.to_string()))?
            .map_err(AccountError::from)
    }

    async fn verify(&self, password: String, digest: Arc<str>) -> Result<bool, AccountError> {
        let passwords = self.passwords.clone();
        tokio::task::spawn_blocking(move || passwords.verify(&password, &digest))
            .await
            .map_err(|e| AccountError::Task(e.to_string()))
    }
}

impl core::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccountService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use schoolhouse_auth::{BcryptPasswords, Hs256TokenCodec};

    use super::*;
    use crate::store::InMemorySchoolStore;

    fn codec() -> Arc<Hs256TokenCodec> {
        Arc::new(Hs256TokenCodec::new("test-secret", None).unwrap())
    }

    fn service() -> AccountService {
        AccountService::new(
            Arc::new(InMemorySchoolStore::new()),
            Arc::new(BcryptPasswords::new(4).unwrap()),
            codec(),
        )
        .unwrap()
    }

    fn registration(email: &str) -> Registration {
        Registration {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: email.into(),
            password: "cobol-4-ever".into(),
        }
    }

    #[tokio::test]
    async fn register_issues_a_token_for_the_new_principal() {
        let svc = service();
        let issued = svc.register(Role::Teacher, registration("grace@navy.mil")).await.unwrap();

        let decoded = codec().validate(&issued.token, Utc::now()).unwrap();
        assert_eq!(decoded, issued.principal);
        assert_eq!(decoded.role, Role::Teacher);
        assert!(decoded.id.get() > 0);

        let second = svc.register(Role::Teacher, registration("ada@navy.mil")).await.unwrap();
        assert_ne!(second.principal.id, issued.principal.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_distinct_error() {
        let svc = service();
        svc.register(Role::Student, registration("dup@school.io")).await.unwrap();

        let err = svc.register(Role::Student, registration("dup@school.io")).await.unwrap_err();
        assert!(matches!(err, AccountError::DuplicateEmail));
    }

    #[tokio::test]
    async fn invalid_registrations_are_validation_errors() {
        let svc = service();

        let mut blank_name = registration("x@school.io");
        blank_name.first_name = "  ".into();
        assert!(matches!(
            svc.register(Role::Student, blank_name).await.unwrap_err(),
            AccountError::Validation(_)
        ));

        let no_at = registration("not-an-email");
        assert!(matches!(
            svc.register(Role::Student, no_at).await.unwrap_err(),
            AccountError::Validation(_)
        ));

        let mut no_password = registration("y@school.io");
        no_password.password = String::new();
        assert!(matches!(
            svc.register(Role::Student, no_password).await.unwrap_err(),
            AccountError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn authenticate_returns_a_fresh_token_on_match() {
        let svc = service();
        let registered = svc.register(Role::Student, registration("s@school.io")).await.unwrap();

        let issued = svc
            .authenticate(Role::Student, "s@school.io", "cobol-4-ever")
            .await
            .unwrap()
            .expect("credentials should match");
        assert_eq!(issued.principal, registered.principal);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let svc = service();
        svc.register(Role::Student, registration("s@school.io")).await.unwrap();

        let unknown = svc.authenticate(Role::Student, "nobody@school.io", "cobol-4-ever").await.unwrap();
        let wrong = svc.authenticate(Role::Student, "s@school.io", "wrong").await.unwrap();
        assert_eq!(unknown, None);
        assert_eq!(wrong, None);
    }

    #[tokio::test]
    async fn email_is_kept_exactly_as_registered() {
        let svc = service();
        let registered = svc.register(Role::Student, registration(" pad@school.io ")).await.unwrap();

        let issued = svc
            .authenticate(Role::Student, " pad@school.io ", "cobol-4-ever")
            .await
            .unwrap()
            .expect("same email as signup should match");
        assert_eq!(issued.principal, registered.principal);
    }

    #[tokio::test]
    async fn accounts_are_scoped_by_role() {
        let svc = service();
        svc.register(Role::Teacher, registration("t@school.io")).await.unwrap();

        let as_student = svc.authenticate(Role::Student, "t@school.io", "cobol-4-ever").await.unwrap();
        assert_eq!(as_student, None);
    }

    #[tokio::test]
    async fn delete_account_is_idempotent() {
        let svc = service();
        let issued = svc.register(Role::Teacher, registration("t@school.io")).await.unwrap();

        assert_eq!(svc.delete_account(issued.principal).await.unwrap(), 1);
        assert_eq!(svc.delete_account(issued.principal).await.unwrap(), 0);
        assert_eq!(
            svc.authenticate(Role::Teacher, "t@school.io", "cobol-4-ever").await.unwrap(),
            None
        );
    }
}
