//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Error responses are JSON: `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cartoon_cart_core::CartError;
use thiserror::Error;

use crate::services::account::AuthError;
use crate::services::documents::DocumentError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart mutation rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Sign-in, registration or session operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Document submission failed.
    #[error("Document error: {0}")]
    Documents(#[from] DocumentError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Status for a collaborator's rejection: client errors pass through,
/// anything else is reported as a bad gateway.
fn upstream_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status)
        .ok()
        .filter(StatusCode::is_client_error)
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Cart(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(err) => match err {
                AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::Rejected { status, .. } => upstream_status(*status),
                AuthError::NotSignedIn => StatusCode::UNAUTHORIZED,
                AuthError::Http(_) => StatusCode::BAD_GATEWAY,
                AuthError::Url(_) | AuthError::Json(_) | AuthError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Documents(err) => match err {
                DocumentError::Validation(_)
                | DocumentError::UnknownField(_)
                | DocumentError::DuplicateField(_) => StatusCode::BAD_REQUEST,
                DocumentError::Rejected { status, .. } => upstream_status(*status),
                DocumentError::Http(_) => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Cart(err) => err.to_string(),
            Self::Auth(err) => match err {
                AuthError::Validation(msg) | AuthError::Rejected { message: msg, .. } => {
                    msg.clone()
                }
                AuthError::NotSignedIn => "Not signed in".to_string(),
                AuthError::Http(_) => "Auth service unavailable".to_string(),
                _ => "Internal server error".to_string(),
            },
            Self::Documents(err) => match err {
                DocumentError::Http(_) => "Document service unavailable".to_string(),
                _ => err.to_string(),
            },
            Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(msg) | Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = serde_json::json!({ "error": self.public_message() });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a login.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(login: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(login.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
