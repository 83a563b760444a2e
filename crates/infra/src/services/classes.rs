//! Ownership-checked class operations.
//!
//! Callers pass ids taken from an already authenticated principal. Teacher
//! operations are gated on class ownership inside the store; student
//! operations only ever touch the caller's own enrollments.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use schoolhouse_core::{ClassId, DomainError, StudentId, TeacherId, require_non_empty};

use crate::store::{EnrolledClass, RosterEntry, SchoolStore, StoreError};

#[derive(Debug, Error)]
pub enum ClassError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct ClassService {
    store: Arc<dyn SchoolStore>,
}

impl ClassService {
    pub fn new(store: Arc<dyn SchoolStore>) -> Self {
        Self { store }
    }

    pub async fn create_class(&self, teacher_id: TeacherId, subject_name: &str) -> Result<ClassId, ClassError> {
        let subject_name = require_non_empty("subject name", subject_name)?;
        let class_id = self.store.insert_class(teacher_id, &subject_name).await?;
        info!(%teacher_id, %class_id, "class created");
        Ok(class_id)
    }

    /// Returns the number of classes removed: 0 for a missing class or one
    /// owned by another teacher.
    pub async fn delete_class(&self, class_id: ClassId, teacher_id: TeacherId) -> Result<u64, ClassError> {
        let removed = self.store.delete_class_owned_by(class_id, teacher_id).await?;
        info!(%teacher_id, %class_id, removed, "class delete");
        Ok(removed)
    }

    pub async fn add_student(
        &self,
        class_id: ClassId,
        student_id: StudentId,
        teacher_id: TeacherId,
    ) -> Result<bool, ClassError> {
        let added = self.store.enroll_if_owned_by(class_id, student_id, teacher_id).await?;
        info!(%teacher_id, %class_id, %student_id, added, "student add");
        Ok(added)
    }

    pub async fn remove_student(
        &self,
        class_id: ClassId,
        student_id: StudentId,
        teacher_id: TeacherId,
    ) -> Result<bool, ClassError> {
        let removed = self.store.unenroll_if_owned_by(class_id, student_id, teacher_id).await?;
        info!(%teacher_id, %class_id, %student_id, removed, "student remove");
        Ok(removed)
    }

    /// Student self-enrollment into any existing class.
    pub async fn enroll(&self, class_id: ClassId, student_id: StudentId) -> Result<(), ClassError> {
        self.store.enroll(class_id, student_id).await?;
        info!(%class_id, %student_id, "student enrolled");
        Ok(())
    }

    /// Returns 0 when the student was not enrolled.
    pub async fn leave_class(&self, class_id: ClassId, student_id: StudentId) -> Result<u64, ClassError> {
        let removed = self.store.unenroll(class_id, student_id).await?;
        info!(%class_id, %student_id, removed, "student leave");
        Ok(removed)
    }

    pub async fn classes_for_student(&self, student_id: StudentId) -> Result<Vec<EnrolledClass>, ClassError> {
        Ok(self.store.classes_for_student(student_id).await?)
    }

    /// `None` means no such class for this teacher; `Some(vec![])` means the
    /// class exists with nobody enrolled.
    pub async fn roster(&self, class_id: ClassId, teacher_id: TeacherId) -> Result<Option<Vec<RosterEntry>>, ClassError> {
        Ok(self.store.roster_if_owned_by(class_id, teacher_id).await?)
    }
}
