use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use finpuls_tokens::ConnectBank;
use finpuls_users::User;

use crate::app::dto::BankTokenDto;
use crate::app::errors::ApiError;
use crate::app::response::ApiResponse;
use crate::app::routes::parse_id;
use crate::app::services::AppServices;

const BANK_CONNECTIONS_FEATURE: &str = "bank-connections";

pub fn router() -> Router {
    Router::new()
        .route("/:bank/token", post(connect_bank).get(get_token).delete(disconnect_bank))
        .route("/:bank/token/refresh", post(refresh_token))
}

/// Resolve the path user and check the bank-connections entitlement. The
/// user's client id is the key bank tokens are stored under.
async fn entitled_user(services: &AppServices, id: &str) -> Result<User, ApiError> {
    let user = services.users.get(parse_id(id)?).await?;
    services
        .users
        .require_feature(&user.client_id, BANK_CONNECTIONS_FEATURE)
        .await
        .map_err(Into::into)
}

async fn connect_bank(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, bank)): Path<(String, String)>,
    Json(body): Json<ConnectBank>,
) -> Result<Response, ApiError> {
    let user = entitled_user(&services, &id).await?;
    let token = services.tokens.connect(&user.client_id, &bank, body).await?;
    let body = ApiResponse::success_with_message(BankTokenDto::from(token), "Bank connected");
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn get_token(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, bank)): Path<(String, String)>,
) -> Result<Json<ApiResponse<BankTokenDto>>, ApiError> {
    let user = entitled_user(&services, &id).await?;
    let token = services.tokens.access_token(&user.client_id, &bank).await?;
    Ok(Json(ApiResponse::success(token.into())))
}

async fn refresh_token(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, bank)): Path<(String, String)>,
) -> Result<Json<ApiResponse<BankTokenDto>>, ApiError> {
    let user = entitled_user(&services, &id).await?;
    let token = services.tokens.refresh(&user.client_id, &bank).await?;
    Ok(Json(ApiResponse::success(token.into())))
}

async fn disconnect_bank(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, bank)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user = entitled_user(&services, &id).await?;
    services.tokens.disconnect(&user.client_id, &bank).await?;
    Ok(Json(ApiResponse::success_with_message((), "Bank disconnected")))
}
