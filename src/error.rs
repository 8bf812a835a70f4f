//! Application-wide error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::domain::status::InvalidStatus;
use crate::email::templates::TemplateError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// Field-level validation failures, one message per offending field.
    #[error("invalid input")]
    InvalidInput(Vec<String>),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("too many requests")]
    RateLimited { retry_after_secs: u64 },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_secs: Option<u64>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            retry_after_secs: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new(msg)),
            AppError::InvalidInput(details) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    details: Some(details),
                    ..ErrorBody::new("Invalid input")
                },
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::new(msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorBody::new(msg)),
            AppError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorBody {
                    retry_after_secs: Some(retry_after_secs),
                    ..ErrorBody::new("Too many requests. Please try again later.")
                },
            ),
            AppError::Template(TemplateError::UnknownStatus { order_type, status }) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(format!(
                    "Status template not found for {order_type} orders: {status}"
                )),
            ),
            AppError::Template(err) => {
                error!(error = %err, "email template failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Internal server error"),
                )
            }
            AppError::Database(sqlx::Error::RowNotFound) => {
                (StatusCode::NOT_FOUND, ErrorBody::new("Not found"))
            }
            AppError::Database(err) => {
                error!(error = %err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Internal server error"),
                )
            }
            AppError::Internal(err) => {
                error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Internal server error"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<InvalidStatus> for AppError {
    fn from(err: InvalidStatus) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{field}: {msg}"),
                    None => format!("{field}: {}", e.code),
                })
            })
            .collect();
        details.sort();
        AppError::InvalidInput(details)
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::{validate_transition, OrderStatus, OrderType};

    #[test]
    fn invalid_status_maps_to_validation_error() {
        let err: AppError = validate_transition(OrderType::Product, OrderStatus::QuoteSent)
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
