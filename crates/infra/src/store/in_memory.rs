use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use schoolhouse_auth::{PrincipalId, Role};
use schoolhouse_core::{ClassId, StudentId, TeacherId};

use super::{EnrolledClass, NewAccount, RosterEntry, SchoolStore, StoreError, StoredCredentials};

#[derive(Debug, Clone)]
struct AccountRow {
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
}

#[derive(Debug, Clone)]
struct ClassRow {
    teacher_id: TeacherId,
    subject_name: String,
}

#[derive(Debug, Default)]
struct AccountTable {
    rows: BTreeMap<i64, AccountRow>,
    next_id: i64,
}

impl AccountTable {
    fn insert(&mut self, account: NewAccount) -> Result<i64, StoreError> {
        if self.rows.values().any(|r| r.email == account.email) {
            return Err(StoreError::DuplicateEmail);
        }
        self.next_id += 1;
        let id = self.next_id;
        self.rows.insert(
            id,
            AccountRow {
                first_name: account.first_name,
                last_name: account.last_name,
                email: account.email,
                password_hash: account.password_hash,
            },
        );
        Ok(id)
    }
}

#[derive(Debug, Default)]
struct State {
    teachers: AccountTable,
    students: AccountTable,
    classes: BTreeMap<ClassId, ClassRow>,
    next_class_id: i64,
    /// `(class, student)` pairs in insertion order; never duplicated.
    enrollments: Vec<(ClassId, StudentId)>,
}

impl State {
    fn accounts_mut(&mut self, role: Role) -> &mut AccountTable {
        match role {
            Role::Teacher => &mut self.teachers,
            Role::Student => &mut self.students,
        }
    }

    fn accounts(&self, role: Role) -> &AccountTable {
        match role {
            Role::Teacher => &self.teachers,
            Role::Student => &self.students,
        }
    }

    fn owns(&self, class_id: ClassId, teacher_id: TeacherId) -> bool {
        self.classes
            .get(&class_id)
            .is_some_and(|c| c.teacher_id == teacher_id)
    }

    fn insert_enrollment(&mut self, class_id: ClassId, student_id: StudentId) -> Result<(), StoreError> {
        if !self.classes.contains_key(&class_id) {
            return Err(StoreError::MissingReference(format!("class {class_id}")));
        }
        if !self.students.rows.contains_key(&student_id.get()) {
            return Err(StoreError::MissingReference(format!("student {student_id}")));
        }
        if !self.enrollments.contains(&(class_id, student_id)) {
            self.enrollments.push((class_id, student_id));
        }
        Ok(())
    }

    fn remove_enrollment(&mut self, class_id: ClassId, student_id: StudentId) -> u64 {
        let before = self.enrollments.len();
        self.enrollments.retain(|&e| e != (class_id, student_id));
        (before - self.enrollments.len()) as u64
    }
}

/// In-memory store for tests/dev.
///
/// Enforces the same uniqueness, foreign-key and cascade rules as the
/// relational schema. Each operation runs under a single lock acquisition,
/// which gives it the same atomicity as one SQL statement.
#[derive(Debug, Default)]
pub struct InMemorySchoolStore {
    inner: RwLock<State>,
}

impl InMemorySchoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
    }

    /// Number of classes currently stored.
    pub fn class_count(&self) -> usize {
        self.read().map(|s| s.classes.len()).unwrap_or(0)
    }

    /// Number of enrollment rows currently stored.
    pub fn enrollment_count(&self) -> usize {
        self.read().map(|s| s.enrollments.len()).unwrap_or(0)
    }
}

#[async_trait]
impl SchoolStore for InMemorySchoolStore {
    async fn insert_account(&self, role: Role, account: NewAccount) -> Result<PrincipalId, StoreError> {
        let mut state = self.write()?;
        let id = state.accounts_mut(role).insert(account)?;
        Ok(PrincipalId::new(id))
    }

    async fn find_credentials(&self, role: Role, email: &str) -> Result<Option<StoredCredentials>, StoreError> {
        let state = self.read()?;
        Ok(state
            .accounts(role)
            .rows
            .iter()
            .find(|(_, row)| row.email == email)
            .map(|(&id, row)| StoredCredentials {
                id: PrincipalId::new(id),
                password_hash: row.password_hash.clone(),
            }))
    }

    async fn delete_account(&self, role: Role, id: PrincipalId) -> Result<u64, StoreError> {
        let mut state = self.write()?;
        if state.accounts_mut(role).rows.remove(&id.get()).is_none() {
            return Ok(0);
        }

        match role {
            Role::Teacher => {
                let teacher_id = TeacherId::new(id.get());
                state.classes.retain(|_, c| c.teacher_id != teacher_id);
                let State {
                    classes, enrollments, ..
                } = &mut *state;
                enrollments.retain(|(class_id, _)| classes.contains_key(class_id));
            }
            Role::Student => {
                let student_id = StudentId::new(id.get());
                state.enrollments.retain(|&(_, s)| s != student_id);
            }
        }
        Ok(1)
    }

    async fn insert_class(&self, teacher_id: TeacherId, subject_name: &str) -> Result<ClassId, StoreError> {
        let mut state = self.write()?;
        if !state.teachers.rows.contains_key(&teacher_id.get()) {
            return Err(StoreError::MissingReference(format!("teacher {teacher_id}")));
        }
        state.next_class_id += 1;
        let class_id = ClassId::new(state.next_class_id);
        state.classes.insert(
            class_id,
            ClassRow {
                teacher_id,
                subject_name: subject_name.to_string(),
            },
        );
        Ok(class_id)
    }

    async fn delete_class_owned_by(&self, class_id: ClassId, teacher_id: TeacherId) -> Result<u64, StoreError> {
        let mut state = self.write()?;
        if !state.owns(class_id, teacher_id) {
            return Ok(0);
        }
        state.classes.remove(&class_id);
        state.enrollments.retain(|&(c, _)| c != class_id);
        Ok(1)
    }

    async fn enroll_if_owned_by(
        &self,
        class_id: ClassId,
        student_id: StudentId,
        teacher_id: TeacherId,
    ) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        if !state.owns(class_id, teacher_id) {
            return Ok(false);
        }
        state.insert_enrollment(class_id, student_id)?;
        Ok(true)
    }

    async fn unenroll_if_owned_by(
        &self,
        class_id: ClassId,
        student_id: StudentId,
        teacher_id: TeacherId,
    ) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        if !state.owns(class_id, teacher_id) {
            return Ok(false);
        }
        Ok(state.remove_enrollment(class_id, student_id) > 0)
    }

    async fn enroll(&self, class_id: ClassId, student_id: StudentId) -> Result<(), StoreError> {
        self.write()?.insert_enrollment(class_id, student_id)
    }

    async fn unenroll(&self, class_id: ClassId, student_id: StudentId) -> Result<u64, StoreError> {
        Ok(self.write()?.remove_enrollment(class_id, student_id))
    }

    async fn classes_for_student(&self, student_id: StudentId) -> Result<Vec<EnrolledClass>, StoreError> {
        let state = self.read()?;
        let mut class_ids: Vec<ClassId> = state
            .enrollments
            .iter()
            .filter(|&&(_, s)| s == student_id)
            .map(|&(c, _)| c)
            .collect();
        class_ids.sort();

        Ok(class_ids
            .into_iter()
            .filter_map(|class_id| {
                let class = state.classes.get(&class_id)?;
                let teacher = state.teachers.rows.get(&class.teacher_id.get())?;
                Some(EnrolledClass {
                    subject_name: class.subject_name.clone(),
                    teacher_first_name: teacher.first_name.clone(),
                    teacher_last_name: teacher.last_name.clone(),
                })
            })
            .collect())
    }

    async fn roster_if_owned_by(
        &self,
        class_id: ClassId,
        teacher_id: TeacherId,
    ) -> Result<Option<Vec<RosterEntry>>, StoreError> {
        let state = self.read()?;
        if !state.owns(class_id, teacher_id) {
            return Ok(None);
        }

        let mut student_ids: Vec<StudentId> = state
            .enrollments
            .iter()
            .filter(|&&(c, _)| c == class_id)
            .map(|&(_, s)| s)
            .collect();
        student_ids.sort();

        let roster = student_ids
            .into_iter()
            .filter_map(|s| state.students.rows.get(&s.get()))
            .map(|row| RosterEntry {
                first_name: row.first_name.clone(),
                last_name: row.last_name.clone(),
            })
            .collect();
        Ok(Some(roster))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(email: &str, first: &str) -> NewAccount {
        NewAccount {
            first_name: first.to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            password_hash: "digest".to_string(),
        }
    }

    async fn teacher(store: &InMemorySchoolStore, email: &str) -> TeacherId {
        let id = store.insert_account(Role::Teacher, account(email, "Tess")).await.unwrap();
        TeacherId::new(id.get())
    }

    async fn student(store: &InMemorySchoolStore, email: &str) -> StudentId {
        let id = store.insert_account(Role::Student, account(email, "Sam")).await.unwrap();
        StudentId::new(id.get())
    }

    #[tokio::test]
    async fn emails_are_unique_per_role() {
        let store = InMemorySchoolStore::new();
        store.insert_account(Role::Teacher, account("a@x.io", "A")).await.unwrap();

        let err = store.insert_account(Role::Teacher, account("a@x.io", "B")).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateEmail);

        // Separate tables: the same email may exist once per role.
        store.insert_account(Role::Student, account("a@x.io", "C")).await.unwrap();
    }

    #[tokio::test]
    async fn ids_are_fresh_serials() {
        let store = InMemorySchoolStore::new();
        let a = teacher(&store, "a@x.io").await;
        let b = teacher(&store, "b@x.io").await;
        assert!(a.get() > 0);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn class_requires_an_existing_teacher() {
        let store = InMemorySchoolStore::new();
        let err = store.insert_class(TeacherId::new(99), "Math101").await.unwrap_err();
        assert!(matches!(err, StoreError::MissingReference(_)));
    }

    #[tokio::test]
    async fn enroll_is_idempotent_and_checks_references() {
        let store = InMemorySchoolStore::new();
        let t = teacher(&store, "t@x.io").await;
        let s = student(&store, "s@x.io").await;
        let class = store.insert_class(t, "Math101").await.unwrap();

        store.enroll(class, s).await.unwrap();
        store.enroll(class, s).await.unwrap();
        assert_eq!(store.enrollment_count(), 1);

        let err = store.enroll(ClassId::new(404), s).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingReference(_)));
        let err = store.enroll(class, StudentId::new(404)).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingReference(_)));
    }

    #[tokio::test]
    async fn deleting_a_teacher_cascades_to_classes_and_enrollments() {
        let store = InMemorySchoolStore::new();
        let t = teacher(&store, "t@x.io").await;
        let other = teacher(&store, "o@x.io").await;
        let s = student(&store, "s@x.io").await;

        let mine = store.insert_class(t, "Math101").await.unwrap();
        let theirs = store.insert_class(other, "Bio101").await.unwrap();
        store.enroll(mine, s).await.unwrap();
        store.enroll(theirs, s).await.unwrap();

        assert_eq!(store.delete_account(Role::Teacher, t.into()).await.unwrap(), 1);

        assert_eq!(store.class_count(), 1);
        assert_eq!(store.enrollment_count(), 1);
        let listed = store.classes_for_student(s).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].subject_name, "Bio101");
    }

    #[tokio::test]
    async fn deleting_a_student_cascades_to_enrollments() {
        let store = InMemorySchoolStore::new();
        let t = teacher(&store, "t@x.io").await;
        let s = student(&store, "s@x.io").await;
        let class = store.insert_class(t, "Math101").await.unwrap();
        store.enroll(class, s).await.unwrap();

        store.delete_account(Role::Student, s.into()).await.unwrap();

        assert_eq!(store.enrollment_count(), 0);
        assert_eq!(store.roster_if_owned_by(class, t).await.unwrap(), Some(vec![]));
    }

    #[tokio::test]
    async fn deleting_a_missing_account_affects_nothing() {
        let store = InMemorySchoolStore::new();
        assert_eq!(store.delete_account(Role::Student, PrincipalId::new(5)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn roster_distinguishes_missing_from_empty() {
        let store = InMemorySchoolStore::new();
        let t = teacher(&store, "t@x.io").await;
        let other = teacher(&store, "o@x.io").await;
        let class = store.insert_class(t, "Math101").await.unwrap();

        assert_eq!(store.roster_if_owned_by(class, t).await.unwrap(), Some(vec![]));
        assert_eq!(store.roster_if_owned_by(class, other).await.unwrap(), None);
        assert_eq!(store.roster_if_owned_by(ClassId::new(77), t).await.unwrap(), None);
    }

    #[tokio::test]
    async fn roster_is_ordered_by_student_id() {
        let store = InMemorySchoolStore::new();
        let t = teacher(&store, "t@x.io").await;
        let class = store.insert_class(t, "Math101").await.unwrap();

        let first = store.insert_account(Role::Student, account("first@x.io", "First")).await.unwrap();
        let second = store.insert_account(Role::Student, account("second@x.io", "Second")).await.unwrap();

        store.enroll(class, StudentId::new(second.get())).await.unwrap();
        store.enroll(class, StudentId::new(first.get())).await.unwrap();

        let names: Vec<String> = store
            .roster_if_owned_by(class, t)
            .await
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|e| e.first_name)
            .collect();
        assert_eq!(names, ["First", "Second"]);
    }
}
