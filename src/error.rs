//! Error handling for the application

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::booking::{EmailError, PricingError};
use crate::booking::responses::ErrorResponse;
use crate::crm::CrmError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error("CRM error: {0}")]
    Crm(#[from] CrmError),

    #[error("Session missing or expired")]
    SessionExpired,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        AppError::Validation(format!("Invalid email: {err}"))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            AppError::Pricing(e) => (StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
            AppError::Crm(CrmError::ContactNotFound(_)) => (
                StatusCode::NOT_FOUND,
                "not_found",
                "No booking found for this email".to_string(),
            ),
            AppError::Crm(e) => {
                tracing::error!("CRM error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "Booking service is unavailable".to_string(),
                )
            }
            AppError::SessionExpired => (
                StatusCode::UNAUTHORIZED,
                "session_expired",
                "Session missing or expired".to_string(),
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error_type: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                AppError::Pricing(PricingError::InvalidPartyComposition { adults: 0 }),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Crm(CrmError::ContactNotFound("a@b.io".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Crm(CrmError::Api {
                    status: 503,
                    message: "down".into(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (AppError::SessionExpired, StatusCode::UNAUTHORIZED),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_email_error_is_validation() {
        let err: AppError = EmailError::MissingAtSymbol.into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
