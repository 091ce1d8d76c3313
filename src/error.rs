use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

/// Generic message shown for server-side failures; the backend detail is logged, not displayed.
pub const TRY_AGAIN_MESSAGE: &str = "Something went wrong on our side. Please try again.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("{0} not found")]
    NotFound(String),

    #[error("You do not have access to this {0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    /// 4xx answer from the backend; the message is surfaced verbatim.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Unable to start payment: {0}")]
    IntentCreation(String),

    #[error("{0}")]
    PaymentDeclined(String),

    /// The provider will not accept another confirmation for this intent; a new one is needed.
    #[error("{0}")]
    IntentExpired(String),

    #[error("{message} (reference: {reference})")]
    Reconciliation { reference: String, message: String },

    #[error("Network error: {0}")]
    TransientNetwork(String),

    #[error("{}", TRY_AGAIN_MESSAGE)]
    Upstream { status: u16 },

    #[error("Malformed response")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal Error")]
    Internal(#[from] anyhow::Error),
}

/// Coarse classification used by callers to pick a recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AuthRequired,
    NotFound,
    Validation,
    PaymentDeclined,
    Reconciliation,
    TransientNetwork,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::AuthRequired => ErrorKind::AuthRequired,
            AppError::NotFound(_) | AppError::Forbidden(_) => ErrorKind::NotFound,
            AppError::Validation(_) | AppError::Rejected { .. } => ErrorKind::Validation,
            AppError::IntentCreation(_) => ErrorKind::NotFound,
            AppError::PaymentDeclined(_) | AppError::IntentExpired(_) => ErrorKind::PaymentDeclined,
            AppError::Reconciliation { .. } => ErrorKind::Reconciliation,
            AppError::TransientNetwork(_)
            | AppError::Upstream { .. }
            | AppError::Serialization(_)
            | AppError::Internal(_) => ErrorKind::TransientNetwork,
        }
    }

    /// Whether the same action may be attempted again by the user.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::PaymentDeclined | ErrorKind::TransientNetwork | ErrorKind::Validation
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthRequired => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Rejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
            }
            AppError::IntentCreation(_) => StatusCode::CONFLICT,
            AppError::PaymentDeclined(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::IntentExpired(_) => StatusCode::GONE,
            AppError::Reconciliation { .. } => StatusCode::BAD_GATEWAY,
            AppError::TransientNetwork(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            AppError::Serialization(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorData {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconciliation_is_never_retryable() {
        let err = AppError::Reconciliation {
            reference: "pi_1".into(),
            message: "Payment succeeded but could not be recorded".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Reconciliation);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("pi_1"));
    }

    #[test]
    fn declines_keep_provider_message() {
        let err = AppError::PaymentDeclined("Your card was declined.".into());
        assert_eq!(err.to_string(), "Your card was declined.");
        assert!(err.is_retryable());
    }

    #[test]
    fn expired_intent_is_a_payment_failure() {
        let err = AppError::IntentExpired("Start again".into());
        assert_eq!(err.kind(), ErrorKind::PaymentDeclined);
        assert_eq!(err.status_code(), StatusCode::GONE);
        assert!(err.is_retryable());
    }

    #[test]
    fn forbidden_is_reported_as_not_found_kind() {
        assert_eq!(
            AppError::Forbidden("document".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::Forbidden("document".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }
}
