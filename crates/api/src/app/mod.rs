//! HTTP application wiring (Axum router + service wiring).
//!
//! This folder is structured like:
//! - `services.rs`: service construction over the storage router
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: response DTOs and mapping from domain entities
//! - `response.rs`: the uniform response envelope
//! - `errors.rs`: error → envelope mapping

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod response;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", routes::router())
        .layer(axum::Extension(services))
        .layer(axum::middleware::from_fn(middleware::request_scope))
}
