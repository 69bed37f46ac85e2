use axum::Router;
use uuid::Uuid;

use finpuls_core::AppError;

use crate::app::errors::ApiError;

pub mod plans;
pub mod system;
pub mod tokens;
pub mod users;

/// Router for all API endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/plans", plans::router())
        .nest("/users", users::router())
        .nest("/users/:id/banks", tokens::router())
}

/// Parse a path identifier, refusing malformed values at the boundary.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|_| AppError::validation("id", "must be a valid UUID").into())
}
