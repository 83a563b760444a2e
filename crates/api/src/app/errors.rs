use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use schoolhouse_infra::{AccountError, ClassError, StoreError};

pub fn account_error_to_response(err: AccountError) -> axum::response::Response {
    match err {
        AccountError::Validation(e) => json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
        AccountError::DuplicateEmail => {
            json_error(StatusCode::CONFLICT, "duplicate_email", "email already registered")
        }
        other => {
            tracing::error!(error = %other, "account operation failed");
            bad_request()
        }
    }
}

pub fn class_error_to_response(err: ClassError) -> axum::response::Response {
    match err {
        ClassError::Validation(e) => json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
        ClassError::Store(StoreError::MissingReference(what)) => {
            tracing::debug!(%what, "missing reference");
            json_error(StatusCode::BAD_REQUEST, "missing_reference", "referenced class or account does not exist")
        }
        ClassError::Store(other) => {
            tracing::error!(error = %other, "class operation failed");
            bad_request()
        }
    }
}

/// Malformed or missing JSON bodies are client errors, reported as 400.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

/// Ownership and membership misses share one answer.
pub fn not_acceptable() -> axum::response::Response {
    json_error(
        StatusCode::NOT_ACCEPTABLE,
        "not_acceptable",
        "no matching class or enrollment for this account",
    )
}

/// Backend failures are logged server-side and never echoed to the client.
fn bad_request() -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "bad_request", "request could not be completed")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
