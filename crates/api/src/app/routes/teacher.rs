use std::sync::Arc;

use axum::{
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;

use schoolhouse_auth::{Role, TokenCodec};
use schoolhouse_core::{ClassId, StudentId};

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;
use crate::middleware::{self, AuthState};

pub fn router(tokens: Arc<dyn TokenCodec>) -> Router {
    let protected = Router::new()
        .route("/teacher", delete(delete_account))
        .route("/teacher/create", post(create_class))
        .route("/teacher/:classid", get(list_roster).delete(delete_class))
        .route("/teacher/:classid/:studentid", post(add_student).delete(remove_student))
        .route_layer(axum::middleware::from_fn_with_state(
            AuthState::new(tokens, Role::Teacher),
            middleware::require_role,
        ));

    Router::new()
        .route("/teacher/signup", post(signup))
        .route("/teacher/signin", post(signin))
        .merge(protected)
}

pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::SignupRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.accounts.register(Role::Teacher, body.into()).await {
        Ok(issued) => dto::token_response(StatusCode::CREATED, issued),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn signin(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::SigninRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.accounts.authenticate(Role::Teacher, &body.email, &body.password).await {
        Ok(Some(issued)) => dto::token_response(StatusCode::OK, issued),
        Ok(None) => errors::json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", "invalid email or password"),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn delete_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.accounts.delete_account(principal.principal()).await {
        Ok(_) => dto::cleared_cookie_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn create_class(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::CreateClassRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.classes.create_class(principal.teacher_id(), &body.subject_name).await {
        Ok(id) => (StatusCode::CREATED, Json(json!({ "id": id.get() }))).into_response(),
        Err(e) => errors::class_error_to_response(e),
    }
}

pub async fn delete_class(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(class_id): Path<String>,
) -> axum::response::Response {
    let class_id: ClassId = match parse_id(&class_id, "class id") {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.classes.delete_class(class_id, principal.teacher_id()).await {
        Ok(0) => errors::not_acceptable(),
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => errors::class_error_to_response(e),
    }
}

pub async fn add_student(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((class_id, student_id)): Path<(String, String)>,
) -> axum::response::Response {
    let (class_id, student_id) = match parse_pair(&class_id, &student_id) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };

    match services.classes.add_student(class_id, student_id, principal.teacher_id()).await {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => errors::not_acceptable(),
        Err(e) => errors::class_error_to_response(e),
    }
}

pub async fn remove_student(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((class_id, student_id)): Path<(String, String)>,
) -> axum::response::Response {
    let (class_id, student_id) = match parse_pair(&class_id, &student_id) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };

    match services.classes.remove_student(class_id, student_id, principal.teacher_id()).await {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => errors::not_acceptable(),
        Err(e) => errors::class_error_to_response(e),
    }
}

pub async fn list_roster(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(class_id): Path<String>,
) -> axum::response::Response {
    let class_id: ClassId = match parse_id(&class_id, "class id") {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.classes.roster(class_id, principal.teacher_id()).await {
        Ok(Some(entries)) => {
            let items = entries.into_iter().map(dto::roster_entry_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Ok(None) => errors::not_acceptable(),
        Err(e) => errors::class_error_to_response(e),
    }
}

fn parse_pair(class_id: &str, student_id: &str) -> Result<(ClassId, StudentId), axum::response::Response> {
    Ok((parse_id(class_id, "class id")?, parse_id(student_id, "student id")?))
}
