//! Credential store: accounts, classes and enrollments.
//!
//! Every ownership-checked operation is expressed as one conditional
//! statement against the backend, so the ownership check and the mutation it
//! guards cannot be interleaved by a concurrent request.

use async_trait::async_trait;
use thiserror::Error;

use schoolhouse_auth::{PrincipalId, Role};
use schoolhouse_core::{ClassId, StudentId, TeacherId};

pub mod in_memory;
pub mod postgres;
pub mod schema;

pub use in_memory::InMemorySchoolStore;
pub use postgres::PostgresSchoolStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The account email is already registered for this role.
    #[error("email already registered")]
    DuplicateEmail,

    /// A referenced class or student does not exist.
    #[error("missing referenced row: {0}")]
    MissingReference(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// A new account row. The password is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

/// What sign-in needs to look up for an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub id: PrincipalId,
    pub password_hash: String,
}

/// One row of a student's class listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrolledClass {
    pub subject_name: String,
    pub teacher_first_name: String,
    pub teacher_last_name: String,
}

/// One row of a class roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub first_name: String,
    pub last_name: String,
}

/// Relational store behind the account and class services.
///
/// Account operations are parameterized by [`Role`]: teachers and students
/// live in separate tables with the same shape.
#[async_trait]
pub trait SchoolStore: Send + Sync {
    async fn insert_account(&self, role: Role, account: NewAccount) -> Result<PrincipalId, StoreError>;

    async fn find_credentials(&self, role: Role, email: &str) -> Result<Option<StoredCredentials>, StoreError>;

    /// Deletes the account and, through the cascade, what it owns.
    /// Returns the number of account rows removed.
    async fn delete_account(&self, role: Role, id: PrincipalId) -> Result<u64, StoreError>;

    async fn insert_class(&self, teacher_id: TeacherId, subject_name: &str) -> Result<ClassId, StoreError>;

    /// Returns 0 when the class is missing or owned by someone else.
    async fn delete_class_owned_by(&self, class_id: ClassId, teacher_id: TeacherId) -> Result<u64, StoreError>;

    /// Returns `false` when the class is missing or owned by someone else.
    /// An already enrolled student counts as success.
    async fn enroll_if_owned_by(
        &self,
        class_id: ClassId,
        student_id: StudentId,
        teacher_id: TeacherId,
    ) -> Result<bool, StoreError>;

    /// Returns `false` when the class is not owned by `teacher_id` or the
    /// student was not enrolled.
    async fn unenroll_if_owned_by(
        &self,
        class_id: ClassId,
        student_id: StudentId,
        teacher_id: TeacherId,
    ) -> Result<bool, StoreError>;

    /// Idempotent. Fails with `MissingReference` when either row is absent.
    async fn enroll(&self, class_id: ClassId, student_id: StudentId) -> Result<(), StoreError>;

    async fn unenroll(&self, class_id: ClassId, student_id: StudentId) -> Result<u64, StoreError>;

    async fn classes_for_student(&self, student_id: StudentId) -> Result<Vec<EnrolledClass>, StoreError>;

    /// `None` when the class is missing or owned by someone else.
    async fn roster_if_owned_by(
        &self,
        class_id: ClassId,
        teacher_id: TeacherId,
    ) -> Result<Option<Vec<RosterEntry>>, StoreError>;
}
