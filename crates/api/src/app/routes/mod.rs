use std::sync::Arc;

use axum::Router;

use schoolhouse_auth::TokenCodec;

pub mod common;
pub mod student;
pub mod system;
pub mod teacher;

/// Both role trees. Each guards its own protected routes with a role check.
pub fn router(tokens: Arc<dyn TokenCodec>) -> Router {
    Router::new()
        .merge(teacher::router(tokens.clone()))
        .merge(student::router(tokens))
}
