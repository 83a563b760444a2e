use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use schoolhouse_auth::{Role, TokenCodec, authorize};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Name of the cookie that carries the identity token.
pub const TOKEN_COOKIE: &str = "jwt";

/// Per-router auth state: the codec plus the role that router requires.
#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenCodec>,
    pub required: Role,
}

impl AuthState {
    pub fn new(tokens: Arc<dyn TokenCodec>, required: Role) -> Self {
        Self { tokens, required }
    }
}

/// Missing or invalid token → 400, role mismatch → 401, otherwise the
/// principal is handed to the handler as a [`PrincipalContext`] extension.
pub async fn require_role(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token(req.headers())
        .ok_or_else(|| errors::json_error(StatusCode::BAD_REQUEST, "invalid_token", "missing token"))?;

    let principal = state
        .tokens
        .validate(token, Utc::now())
        .map_err(|_e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_token", "invalid token"))?;

    authorize(&principal, state.required).map_err(|e| {
        tracing::debug!(error = %e, "role mismatch");
        errors::json_error(StatusCode::UNAUTHORIZED, "role_mismatch", "token role does not match route")
    })?;

    req.extensions_mut().insert(PrincipalContext::new(principal));

    Ok(next.run(req).await)
}

/// Token from the `jwt` cookie, falling back to an `Authorization: Bearer` header.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    extract_cookie(headers, TOKEN_COOKIE).or_else(|| extract_bearer(headers))
}

fn extract_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
