use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use schoolhouse_infra::{EnrolledClass, IssuedToken, Registration, RosterEntry};

use crate::middleware::TOKEN_COOKIE;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
}

impl From<SignupRequest> for Registration {
    fn from(body: SignupRequest) -> Self {
        Registration {
            first_name: body.firstname,
            last_name: body.lastname,
            email: body.email,
            password: body.password,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    #[serde(alias = "subject")]
    pub subject_name: String,
}

// -------------------------
// Response helpers
// -------------------------

/// `{id, role}` body with the token set as the `jwt` cookie.
pub fn token_response(status: StatusCode, issued: IssuedToken) -> axum::response::Response {
    let cookie = format!("{TOKEN_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", issued.token);
    (
        status,
        [(header::SET_COOKIE, cookie)],
        axum::Json(json!({
            "id": issued.principal.id.get(),
            "role": issued.principal.role.as_str(),
        })),
    )
        .into_response()
}

pub fn cleared_cookie_response() -> axum::response::Response {
    let cookie = format!("{TOKEN_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");
    (StatusCode::OK, [(header::SET_COOKIE, cookie)]).into_response()
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn enrolled_class_to_json(class: EnrolledClass) -> serde_json::Value {
    json!({
        "subject_name": class.subject_name,
        "first_name": class.teacher_first_name,
        "last_name": class.teacher_last_name,
    })
}

pub fn roster_entry_to_json(entry: RosterEntry) -> serde_json::Value {
    json!({
        "first_name": entry.first_name,
        "last_name": entry.last_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_uses_the_wire_field_names() {
        let body: SignupRequest = serde_json::from_str(
            r#"{"firstname":"Ada","lastname":"Lovelace","email":"ada@x.io","password":"pw"}"#,
        )
        .unwrap();
        let reg = Registration::from(body);
        assert_eq!(reg.first_name, "Ada");
        assert_eq!(reg.last_name, "Lovelace");
    }

    #[test]
    fn create_class_accepts_the_short_alias() {
        let a: CreateClassRequest = serde_json::from_str(r#"{"subject_name":"Math101"}"#).unwrap();
        let b: CreateClassRequest = serde_json::from_str(r#"{"subject":"Math101"}"#).unwrap();
        assert_eq!(a.subject_name, b.subject_name);
    }

    #[test]
    fn enrolled_class_json_keys() {
        let v = enrolled_class_to_json(EnrolledClass {
            subject_name: "Math101".into(),
            teacher_first_name: "Rita".into(),
            teacher_last_name: "Levi".into(),
        });
        assert_eq!(v, json!({"subject_name":"Math101","first_name":"Rita","last_name":"Levi"}));
    }
}
