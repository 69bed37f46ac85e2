//! Uniform response envelope.
//!
//! Every response, success or failure, has the same shape and carries the
//! correlation id that was active when the request began.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use finpuls_observability::request;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    pub data: Option<T>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::success_with_message(data, "Operation completed successfully")
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            data: Some(data),
            message: message.into(),
            error: None,
            request_id: request::get_or_create(),
        }
    }

    pub fn error(
        code: impl Into<String>,
        message: impl Into<String>,
        context: Option<JsonValue>,
    ) -> Self {
        Self {
            status: ResponseStatus::Error,
            data: None,
            message: "Operation failed".to_string(),
            error: Some(ErrorDetails {
                code: code.into(),
                message: message.into(),
                context,
            }),
            request_id: request::get_or_create(),
        }
    }
}
