//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and service construction
//! - `routes/`: handlers, one file per role
//! - `dto.rs`: request bodies, cookie responses and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use schoolhouse_auth::TokenCodec;

use crate::config::AppConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let wiring = services::build_services(config).await?;
    Ok(router(wiring.services, wiring.tokens))
}

/// Router over already-wired services.
pub fn router(services: Arc<services::AppServices>, tokens: Arc<dyn TokenCodec>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router(tokens))
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
