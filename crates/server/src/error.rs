//! Unified error handling for the bridge server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use tilda_bridge_core::InvalidTransition;

use crate::db::RepositoryError;
use crate::telegram::TelegramError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Required webhook field missing or body unparseable.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate external order id on create. The webhook route converts
    /// this to a success response; it only surfaces as 409 elsewhere.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Lifecycle event not legal for the order's current status.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// Request failed an authenticity check.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Telegram Bot API failure on an inbound-update code path.
    ///
    /// Outbound notifications never produce this; they are logged and
    /// swallowed at the dispatch site.
    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("row not found".to_string()),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Database(other),
        }
    }
}

impl From<crate::ingest::IngestError> for AppError {
    fn from(err: crate::ingest::IngestError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Bridge request error"
            );
        } else {
            tracing::warn!(error = %self, "Bridge request rejected");
        }

        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) | Self::InvalidTransition(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Telegram(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Telegram(_) => "Upstream service error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use tilda_bridge_core::{OrderEvent, OrderStatus, apply};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn error_display() {
        let err = AppError::NotFound("order 2067628905".to_string());
        assert_eq!(err.to_string(), "Not found: order 2067628905");

        let err = AppError::Validation("missing order identifier".to_string());
        assert_eq!(err.to_string(), "Validation error: missing order identifier");
    }

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            get_status(AppError::Validation("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("x".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Forbidden("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn invalid_transition_maps_to_conflict() {
        let err = apply(OrderStatus::Completed, OrderEvent::Cancelled).expect_err("terminal");
        assert_eq!(get_status(AppError::from(err)), StatusCode::CONFLICT);
    }

    #[test]
    fn repository_not_found_becomes_not_found() {
        let err = AppError::from(RepositoryError::NotFound);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn repository_conflict_becomes_conflict() {
        let err = AppError::from(RepositoryError::Conflict("duplicate order".to_string()));
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let response = AppError::Internal("postgres password leaked".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
