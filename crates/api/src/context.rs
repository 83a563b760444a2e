use schoolhouse_auth::Principal;
use schoolhouse_core::{StudentId, TeacherId};

/// Principal context for a request (authenticated identity + role).
///
/// Inserted by the auth middleware only after the token's role matched the
/// route's role, so the typed accessors below are safe to use in handlers of
/// that route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }

    pub fn teacher_id(&self) -> TeacherId {
        TeacherId::new(self.principal.id.get())
    }

    pub fn student_id(&self) -> StudentId {
        StudentId::new(self.principal.id.get())
    }
}
