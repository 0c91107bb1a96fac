// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::policy::consent::ConsentDenial;
use crate::validation::{FieldError, FieldErrors};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

static EXPOSE_DETAILS: AtomicBool = AtomicBool::new(false);

/// Attach internal error detail to 5xx responses. Only enabled in
/// development deployments.
pub fn set_expose_details(enabled: bool) {
    EXPOSE_DETAILS.store(enabled, Ordering::Relaxed);
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Account is not active")]
    AccountInactive,

    #[error("{0}")]
    ConsentRequired(ConsentDenial),

    #[error("Analytics not enabled. Please opt-in through privacy settings.")]
    AnalyticsNotEnabled,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Validation error for a single field.
    pub fn invalid_field(
        field: impl Into<String>,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        AppError::Validation(FieldErrors::single(field, code, message))
    }

    /// Stable, machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidToken => "invalid_token",
            AppError::AccountInactive => "account_inactive",
            AppError::ConsentRequired(_) => "consent_required",
            AppError::AnalyticsNotEnabled => "analytics_not_enabled",
            AppError::NotFound(_) => "not_found",
            AppError::Database(_) => "persistence_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidToken | AppError::AccountInactive => {
                StatusCode::UNAUTHORIZED
            }
            AppError::ConsentRequired(_) | AppError::AnalyticsNotEnabled => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Build the response body. Internal detail is only included when
    /// `expose_details` is set.
    pub fn render(&self, expose_details: bool) -> (StatusCode, ErrorResponse) {
        let mut body = ErrorResponse {
            error: self.kind(),
            message: self.to_string(),
            fields: None,
            requires_consent: None,
            details: None,
        };

        match self {
            AppError::Validation(errors) => {
                body.message = "Request validation failed".to_string();
                body.fields = Some(errors.0.clone());
            }
            AppError::ConsentRequired(_) => body.requires_consent = Some(true),
            AppError::NotFound(_) => body.message = "Resource not found".to_string(),
            AppError::Database(msg) => {
                body.message = "A storage error occurred".to_string();
                if expose_details {
                    body.details = Some(msg.clone());
                }
            }
            AppError::Internal(err) => {
                body.message = "An internal error occurred".to_string();
                if expose_details {
                    body.details = Some(format!("{err:#}"));
                }
            }
            _ => {}
        }

        (self.status(), body)
    }
}

/// JSON error response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_consent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(msg) => tracing::error!(error = %msg, "Database error"),
            AppError::Internal(err) => tracing::error!(error = %err, "Internal server error"),
            AppError::Validation(errors) => {
                tracing::debug!(count = errors.0.len(), "Request validation failed")
            }
            _ => {}
        }

        let (status, body) = self.render(EXPOSE_DETAILS.load(Ordering::Relaxed));
        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
