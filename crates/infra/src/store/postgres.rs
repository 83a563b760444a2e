//! Postgres-backed credential store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `DuplicateEmail` | Signup with a taken email |
//! | Database (foreign key violation) | `23503` | `MissingReference` | Enrollment for a missing class or student |
//! | Anything else | N/A | `Backend` | Connection failures, pool closed, etc. |
//!
//! ## Ownership checks
//!
//! Ownership-gated mutations qualify the statement by both the class id and
//! the owning teacher id, so the check and the write are one statement.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use schoolhouse_auth::{PrincipalId, Role};
use schoolhouse_core::{ClassId, StudentId, TeacherId};

use super::{EnrolledClass, NewAccount, RosterEntry, SchoolStore, StoreError, StoredCredentials};

/// Table and key column of an account role. Both are static identifiers and
/// never come from request input.
fn account_table(role: Role) -> (&'static str, &'static str) {
    match role {
        Role::Teacher => ("teacher", "teacher_id"),
        Role::Student => ("student", "student_id"),
    }
}

/// Postgres-backed store.
///
/// Uses the SQLx connection pool, which is `Send + Sync` and shared across
/// requests.
#[derive(Debug, Clone)]
pub struct PostgresSchoolStore {
    pool: Arc<PgPool>,
}

impl PostgresSchoolStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

#[async_trait]
impl SchoolStore for PostgresSchoolStore {
    #[instrument(skip(self, account), fields(role = %role), err)]
    async fn insert_account(&self, role: Role, account: NewAccount) -> Result<PrincipalId, StoreError> {
        let (table, key) = account_table(role);
        let sql = format!(
            "INSERT INTO {table} (first_name, last_name, email, password) VALUES ($1, $2, $3, $4) RETURNING {key}"
        );

        let row = sqlx::query(&sql)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(&account.email)
            .bind(&account.password_hash)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_account", e))?;

        let id: i64 = row
            .try_get(key)
            .map_err(|e| map_sqlx_error("insert_account", e))?;
        Ok(PrincipalId::new(id))
    }

    #[instrument(skip(self, email), fields(role = %role), err)]
    async fn find_credentials(&self, role: Role, email: &str) -> Result<Option<StoredCredentials>, StoreError> {
        let (table, key) = account_table(role);
        let sql = format!("SELECT {key}, password FROM {table} WHERE email = $1");

        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_credentials", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: i64 = row
            .try_get(key)
            .map_err(|e| map_sqlx_error("find_credentials", e))?;
        let password_hash: String = row
            .try_get("password")
            .map_err(|e| map_sqlx_error("find_credentials", e))?;

        Ok(Some(StoredCredentials {
            id: PrincipalId::new(id),
            password_hash,
        }))
    }

    #[instrument(skip(self), fields(role = %role, id = %id), err)]
    async fn delete_account(&self, role: Role, id: PrincipalId) -> Result<u64, StoreError> {
        let (table, key) = account_table(role);
        let sql = format!("DELETE FROM {table} WHERE {key} = $1");

        let result = sqlx::query(&sql)
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_account", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self, subject_name), fields(teacher_id = %teacher_id), err)]
    async fn insert_class(&self, teacher_id: TeacherId, subject_name: &str) -> Result<ClassId, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO class (fk_teacher_id, subject_name)
            VALUES ($1, $2)
            RETURNING class_id
            "#,
        )
        .bind(teacher_id.get())
        .bind(subject_name)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_class", e))?;

        let id: i64 = row
            .try_get("class_id")
            .map_err(|e| map_sqlx_error("insert_class", e))?;
        Ok(ClassId::new(id))
    }

    #[instrument(skip(self), fields(class_id = %class_id, teacher_id = %teacher_id), err)]
    async fn delete_class_owned_by(&self, class_id: ClassId, teacher_id: TeacherId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM class WHERE class_id = $1 AND fk_teacher_id = $2")
            .bind(class_id.get())
            .bind(teacher_id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_class_owned_by", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(
        skip(self),
        fields(class_id = %class_id, student_id = %student_id, teacher_id = %teacher_id),
        err
    )]
    async fn enroll_if_owned_by(
        &self,
        class_id: ClassId,
        student_id: StudentId,
        teacher_id: TeacherId,
    ) -> Result<bool, StoreError> {
        // The insert only sees a row from `owned`, and `owned` only exists
        // for the owning teacher; both run against the same snapshot.
        let row = sqlx::query(
            r#"
            WITH owned AS (
                SELECT class_id FROM class
                WHERE class_id = $1 AND fk_teacher_id = $3
            ),
            inserted AS (
                INSERT INTO class_student (fk_class_id, fk_student_id)
                SELECT class_id, $2 FROM owned
                ON CONFLICT DO NOTHING
            )
            SELECT EXISTS (SELECT 1 FROM owned) AS owned
            "#,
        )
        .bind(class_id.get())
        .bind(student_id.get())
        .bind(teacher_id.get())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("enroll_if_owned_by", e))?;

        row.try_get::<bool, _>("owned")
            .map_err(|e| map_sqlx_error("enroll_if_owned_by", e))
    }

    #[instrument(
        skip(self),
        fields(class_id = %class_id, student_id = %student_id, teacher_id = %teacher_id),
        err
    )]
    async fn unenroll_if_owned_by(
        &self,
        class_id: ClassId,
        student_id: StudentId,
        teacher_id: TeacherId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM class_student cs
            USING class c
            WHERE cs.fk_class_id = $1
              AND cs.fk_student_id = $2
              AND c.class_id = cs.fk_class_id
              AND c.fk_teacher_id = $3
            "#,
        )
        .bind(class_id.get())
        .bind(student_id.get())
        .bind(teacher_id.get())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("unenroll_if_owned_by", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(class_id = %class_id, student_id = %student_id), err)]
    async fn enroll(&self, class_id: ClassId, student_id: StudentId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO class_student (fk_class_id, fk_student_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(class_id.get())
        .bind(student_id.get())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("enroll", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(class_id = %class_id, student_id = %student_id), err)]
    async fn unenroll(&self, class_id: ClassId, student_id: StudentId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM class_student WHERE fk_class_id = $1 AND fk_student_id = $2")
            .bind(class_id.get())
            .bind(student_id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("unenroll", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(student_id = %student_id), err)]
    async fn classes_for_student(&self, student_id: StudentId) -> Result<Vec<EnrolledClass>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT c.subject_name, t.first_name, t.last_name
            FROM class_student cs
            JOIN class c ON c.class_id = cs.fk_class_id
            JOIN teacher t ON t.teacher_id = c.fk_teacher_id
            WHERE cs.fk_student_id = $1
            ORDER BY c.class_id
            "#,
        )
        .bind(student_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("classes_for_student", e))?;

        rows.into_iter()
            .map(|row| -> Result<EnrolledClass, sqlx::Error> {
                Ok(EnrolledClass {
                    subject_name: row.try_get("subject_name")?,
                    teacher_first_name: row.try_get("first_name")?,
                    teacher_last_name: row.try_get("last_name")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("classes_for_student", e))
    }

    #[instrument(skip(self), fields(class_id = %class_id, teacher_id = %teacher_id), err)]
    async fn roster_if_owned_by(
        &self,
        class_id: ClassId,
        teacher_id: TeacherId,
    ) -> Result<Option<Vec<RosterEntry>>, StoreError> {
        // An owned class always yields at least one row; an owned class
        // without enrollments yields one row of NULL student columns.
        let rows = sqlx::query(
            r#"
            SELECT s.first_name, s.last_name
            FROM class c
            LEFT JOIN class_student cs ON cs.fk_class_id = c.class_id
            LEFT JOIN student s ON s.student_id = cs.fk_student_id
            WHERE c.class_id = $1 AND c.fk_teacher_id = $2
            ORDER BY s.student_id
            "#,
        )
        .bind(class_id.get())
        .bind(teacher_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("roster_if_owned_by", e))?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut roster = Vec::with_capacity(rows.len());
        for row in rows {
            let first: Option<String> = row
                .try_get("first_name")
                .map_err(|e| map_sqlx_error("roster_if_owned_by", e))?;
            let last: Option<String> = row
                .try_get("last_name")
                .map_err(|e| map_sqlx_error("roster_if_owned_by", e))?;
            if let (Some(first_name), Some(last_name)) = (first, last) {
                roster.push(RosterEntry { first_name, last_name });
            }
        }
        Ok(Some(roster))
    }
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::DuplicateEmail,
                Some("23503") => StoreError::MissingReference(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {}", operation)),
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
