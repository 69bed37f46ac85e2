use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use finpuls_subscriptions::{CreatePlan, UpdatePlan};

use crate::app::dto::PlanDto;
use crate::app::errors::ApiError;
use crate::app::response::ApiResponse;
use crate::app::routes::parse_id;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_plan).get(list_plans))
        .route("/active", get(list_active_plans))
        .route("/:id", get(get_plan).put(update_plan).delete(delete_plan))
        .route("/:id/activate", post(activate_plan))
        .route("/:id/deactivate", post(deactivate_plan))
}

async fn create_plan(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CreatePlan>,
) -> Result<Response, ApiError> {
    let plan = services.plans.create(body).await?;
    let body = ApiResponse::success_with_message(PlanDto::from(plan), "Plan created");
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn list_plans(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<ApiResponse<Vec<PlanDto>>>, ApiError> {
    let plans = services.plans.list().await?;
    Ok(Json(ApiResponse::success(plans.into_iter().map(PlanDto::from).collect())))
}

async fn list_active_plans(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<ApiResponse<Vec<PlanDto>>>, ApiError> {
    let plans = services.plans.find_all_active().await?;
    Ok(Json(ApiResponse::success(plans.into_iter().map(PlanDto::from).collect())))
}

async fn get_plan(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PlanDto>>, ApiError> {
    let plan = services.plans.get(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::success(plan.into())))
}

async fn update_plan(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<UpdatePlan>,
) -> Result<Json<ApiResponse<PlanDto>>, ApiError> {
    let plan = services.plans.update(parse_id(&id)?, body).await?;
    Ok(Json(ApiResponse::success(plan.into())))
}

async fn delete_plan(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    services.plans.delete(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::success_with_message((), "Plan deleted")))
}

async fn activate_plan(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PlanDto>>, ApiError> {
    let plan = services.plans.activate(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::success(plan.into())))
}

async fn deactivate_plan(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PlanDto>>, ApiError> {
    let plan = services.plans.deactivate(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::success(plan.into())))
}
