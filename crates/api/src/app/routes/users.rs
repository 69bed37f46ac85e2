use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use finpuls_users::CreateUser;

use crate::app::dto::{ChangeStatusRequest, UserDto};
use crate::app::errors::ApiError;
use crate::app::response::ApiResponse;
use crate::app::routes::parse_id;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/by-client/:client_id", get(get_user_by_client_id))
        .route("/:id", get(get_user))
        .route("/:id/status", post(change_status))
}

async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CreateUser>,
) -> Result<Response, ApiError> {
    let user = services.users.create(body).await?;
    let body = ApiResponse::success_with_message(UserDto::from(user), "User created");
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = services.users.list().await?;
    Ok(Json(ApiResponse::success(users.into_iter().map(UserDto::from).collect())))
}

async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = services.users.get(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

async fn get_user_by_client_id(
    Extension(services): Extension<Arc<AppServices>>,
    Path(client_id): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = services
        .users
        .find_by_client_id(&client_id)
        .await?
        .ok_or_else(|| finpuls_core::AppError::not_found(format!("user not found: {client_id}")))?;
    Ok(Json(ApiResponse::success(user.into())))
}

async fn change_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<ChangeStatusRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = services.users.change_status(parse_id(&id)?, body.status).await?;
    Ok(Json(ApiResponse::success(user.into())))
}
