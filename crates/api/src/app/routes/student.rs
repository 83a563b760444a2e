use std::sync::Arc;

use axum::{
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use schoolhouse_auth::{Role, TokenCodec};
use schoolhouse_core::ClassId;

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;
use crate::middleware::{self, AuthState};

pub fn router(tokens: Arc<dyn TokenCodec>) -> Router {
    let protected = Router::new()
        .route("/student", delete(delete_account))
        .route("/student/classes", get(list_classes))
        .route("/student/enroll/:classid", post(enroll))
        .route("/student/:classid", delete(leave_class))
        .route_layer(axum::middleware::from_fn_with_state(
            AuthState::new(tokens, Role::Student),
            middleware::require_role,
        ));

    Router::new()
        .route("/student/signup", post(signup))
        .route("/student/signin", post(signin))
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

    match services.accounts.register(Role::Student, body.into()).await {
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

    match services.accounts.authenticate(Role::Student, &body.email, &body.password).await {
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

pub async fn enroll(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(class_id): Path<String>,
) -> axum::response::Response {
    let class_id: ClassId = match parse_id(&class_id, "class id") {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.classes.enroll(class_id, principal.student_id()).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(e) => errors::class_error_to_response(e),
    }
}

pub async fn list_classes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.classes.classes_for_student(principal.student_id()).await {
        Ok(classes) => {
            let items = classes.into_iter().map(dto::enrolled_class_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::class_error_to_response(e),
    }
}

pub async fn leave_class(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(class_id): Path<String>,
) -> axum::response::Response {
    let class_id: ClassId = match parse_id(&class_id, "class id") {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.classes.leave_class(class_id, principal.student_id()).await {
        Ok(0) => errors::not_acceptable(),
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => errors::class_error_to_response(e),
    }
}
