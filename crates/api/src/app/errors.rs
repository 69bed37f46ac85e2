//! Mapping classified errors onto the response envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use finpuls_core::AppError;
use finpuls_infra::StorageError;

use crate::app::response::ApiResponse;

/// Handler-level error: anything classified as [`AppError`], rendered
/// through the envelope on the way out.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;

        // Full detail (cause chain included) goes to the log, never to the
        // payload.
        match &err {
            AppError::Internal(cause) => {
                tracing::error!(error = ?cause, "unhandled error");
            }
            other => {
                tracing::warn!(code = other.code(), error = %other, "request failed");
            }
        }

        let status = StatusCode::from_u16(err.status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body =
            ApiResponse::<serde_json::Value>::error(err.code(), err.client_message(), err.context());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use finpuls_observability::request;

    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[tokio::test]
    async fn statuses_follow_the_kind_table() {
        request::scope(async {
            assert_eq!(status_of(AppError::validation("name", "blank")), StatusCode::BAD_REQUEST);
            assert_eq!(status_of(AppError::not_found("nope")), StatusCode::NOT_FOUND);
            assert_eq!(
                status_of(AppError::BankNotConnected { bank: "sber".into(), user_id: "u".into() }),
                StatusCode::NOT_FOUND
            );
            assert_eq!(
                status_of(AppError::TokenExpired { bank: "sber".into(), user_id: "u".into() }),
                StatusCode::UNAUTHORIZED
            );
            assert_eq!(
                status_of(AppError::SubscriptionRequired { feature: "reports".into() }),
                StatusCode::FORBIDDEN
            );
            assert_eq!(
                status_of(AppError::UpstreamApi { system: "sber".into(), message: "oops".into() }),
                StatusCode::BAD_GATEWAY
            );
            assert_eq!(status_of(AppError::internal("boom")), StatusCode::INTERNAL_SERVER_ERROR);
        })
        .await;
    }
}
