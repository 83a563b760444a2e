//! Relational schema bootstrap.
//!
//! Every statement is idempotent, so this runs on each startup. The cascades
//! carry account deletion through to owned classes and enrollments.

use sqlx::PgPool;
use tracing::info;

use super::StoreError;
use super::postgres::map_sqlx_error;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS teacher (
        teacher_id BIGSERIAL PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name  TEXT NOT NULL,
        email      TEXT NOT NULL UNIQUE,
        password   TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS student (
        student_id BIGSERIAL PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name  TEXT NOT NULL,
        email      TEXT NOT NULL UNIQUE,
        password   TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS class (
        class_id      BIGSERIAL PRIMARY KEY,
        fk_teacher_id BIGINT NOT NULL REFERENCES teacher (teacher_id) ON DELETE CASCADE,
        subject_name  TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS class_student (
        fk_class_id   BIGINT NOT NULL REFERENCES class (class_id) ON DELETE CASCADE,
        fk_student_id BIGINT NOT NULL REFERENCES student (student_id) ON DELETE CASCADE,
        PRIMARY KEY (fk_class_id, fk_student_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS class_fk_teacher_idx ON class (fk_teacher_id)",
    "CREATE INDEX IF NOT EXISTS class_student_fk_student_idx ON class_student (fk_student_id)",
];

/// Create the four tables and their indexes if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    info!(statements = STATEMENTS.len(), "schema ensured");
    Ok(())
}
