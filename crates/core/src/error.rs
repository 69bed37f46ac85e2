//! Application error taxonomy.
//!
//! Every failure the gateway can surface to a caller is one of the variants
//! below. The variant is the classification: response status and wire code
//! are derived from it by direct lookup, never from message text or
//! downcasting. Unexpected failures ride in `Internal` and degrade to a
//! generic 500 at the boundary.

use std::collections::BTreeMap;

use serde_json::{Value as JsonValue, json};
use thiserror::Error;

/// Result type used across services and handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Classified application failure.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed structural or business validation. Carries the complete
    /// field → message map so the caller sees every problem at once.
    #[error("validation failed")]
    Validation { errors: BTreeMap<String, String> },

    /// A referenced resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The user has no connected token for the named bank.
    #[error("bank {bank} is not connected for user {user_id}")]
    BankNotConnected { bank: String, user_id: String },

    /// A previously issued bank credential has passed its expiry.
    #[error("token expired for bank {bank}, user {user_id}")]
    TokenExpired { bank: String, user_id: String },

    /// The operation requires an entitlement the caller's plan lacks.
    #[error("an active subscription is required for feature {feature}")]
    SubscriptionRequired { feature: String },

    /// A downstream external system returned an error.
    #[error("upstream error from {system}: {message}")]
    UpstreamApi { system: String, message: String },

    /// Anything that does not match the closed set above. Full detail is
    /// logged at the boundary; callers only ever see a generic message.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Single-field validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.into(), message.into());
        Self::Validation { errors }
    }

    /// Validation failure with a prebuilt field → message map.
    pub fn validation_map(errors: BTreeMap<String, String>) -> Self {
        Self::Validation { errors }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(anyhow::anyhow!(message.into()))
    }

    /// Stable wire code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BankNotConnected { .. } => "BANK_NOT_CONNECTED",
            Self::TokenExpired { .. } => "TOKEN_EXPIRED",
            Self::SubscriptionRequired { .. } => "SUBSCRIPTION_REQUIRED",
            Self::UpstreamApi { .. } => "BANK_API_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status for this error kind.
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound(_) | Self::BankNotConnected { .. } => 404,
            Self::TokenExpired { .. } => 401,
            Self::SubscriptionRequired { .. } => 403,
            Self::UpstreamApi { .. } => 502,
            Self::Internal(_) => 500,
        }
    }

    /// Structured context serialized into the error payload, if any.
    pub fn context(&self) -> Option<JsonValue> {
        match self {
            Self::Validation { errors } => Some(json!({ "validationErrors": errors })),
            Self::BankNotConnected { bank, user_id } | Self::TokenExpired { bank, user_id } => {
                Some(json!({ "bank": bank, "userId": user_id }))
            }
            Self::SubscriptionRequired { feature } => Some(json!({ "feature": feature })),
            Self::UpstreamApi { system, .. } => Some(json!({ "system": system })),
            Self::NotFound(_) | Self::Internal(_) => None,
        }
    }

    /// Message safe to return to the caller. `Internal` never leaks detail.
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "An unexpected error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_to_stable_code_and_status() {
        let cases: Vec<(AppError, &str, u16)> = vec![
            (AppError::validation("name", "must not be blank"), "VALIDATION_ERROR", 400),
            (AppError::not_found("plan not found"), "NOT_FOUND", 404),
            (
                AppError::BankNotConnected { bank: "tinkoff".into(), user_id: "u1".into() },
                "BANK_NOT_CONNECTED",
                404,
            ),
            (
                AppError::TokenExpired { bank: "tinkoff".into(), user_id: "u1".into() },
                "TOKEN_EXPIRED",
                401,
            ),
            (
                AppError::SubscriptionRequired { feature: "reports".into() },
                "SUBSCRIPTION_REQUIRED",
                403,
            ),
            (
                AppError::UpstreamApi { system: "sber".into(), message: "503".into() },
                "BANK_API_ERROR",
                502,
            ),
            (AppError::internal("boom"), "INTERNAL_ERROR", 500),
        ];

        for (err, code, status) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn validation_context_carries_full_field_map() {
        let mut errors = BTreeMap::new();
        errors.insert("name".to_string(), "must not be blank".to_string());
        errors.insert("price".to_string(), "must be non-negative".to_string());
        let err = AppError::validation_map(errors);

        let ctx = err.context().unwrap();
        assert_eq!(ctx["validationErrors"]["name"], "must not be blank");
        assert_eq!(ctx["validationErrors"]["price"], "must be non-negative");
    }

    #[test]
    fn subscription_required_context_names_the_feature() {
        let err = AppError::SubscriptionRequired { feature: "reports".into() };
        assert_eq!(err.context().unwrap()["feature"], "reports");
    }

    #[test]
    fn internal_errors_never_leak_detail_to_clients() {
        let err = AppError::internal("connection refused to 10.0.0.3:5432");
        assert_eq!(err.client_message(), "An unexpected error occurred");
        assert!(err.context().is_none());
    }
}
