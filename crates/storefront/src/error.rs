//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side faults are
//! captured to Sentry before responding. A backend 401/403 is not answered
//! here: the response is marked with [`ForcedLogout`] and
//! [`forced_logout_middleware`](crate::middleware::forced_logout_middleware)
//! clears the session and redirects to the login page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::services::CheckoutError;

/// Response marker: the backend no longer accepts the visitor's token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForcedLogout;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Marketplace backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Checkout could not proceed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Template rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The backend error behind this failure, if any.
    #[must_use]
    pub const fn backend(&self) -> Option<&BackendError> {
        match self {
            Self::Backend(e) => Some(e),
            Self::Checkout(e) => e.backend(),
            _ => None,
        }
    }

    /// Whether the backend rejected the visitor's token.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        self.backend().is_some_and(BackendError::is_auth_failure)
    }

    fn status(&self) -> StatusCode {
        if let Some(e) = self.backend() {
            return backend_status(e);
        }
        match self {
            Self::Checkout(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Session(_) | Self::Template(_) | Self::Internal(_) | Self::Backend(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show the visitor.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(e) => e.user_message(),
            Self::Checkout(CheckoutError::Backend(e)) => e.user_message(),
            Self::Checkout(e) => e.to_string(),
            Self::NotFound(_) => "Page not found".to_owned(),
            Self::BadRequest(msg) => msg.clone(),
            Self::Session(_) | Self::Template(_) | Self::Internal(_) => {
                "Internal server error".to_owned()
            }
        }
    }
}

const fn backend_status(e: &BackendError) -> StatusCode {
    match e {
        BackendError::Unauthorized => StatusCode::UNAUTHORIZED,
        BackendError::Forbidden(_) => StatusCode::FORBIDDEN,
        BackendError::NotFound(_) => StatusCode::NOT_FOUND,
        BackendError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        BackendError::Rejected { status, .. } if *status >= 400 && *status < 500 => {
            StatusCode::BAD_REQUEST
        }
        BackendError::Http(_)
        | BackendError::Parse(_)
        | BackendError::Rejected { .. }
        | BackendError::MissingField(_)
        | BackendError::ProbeExhausted { .. } => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_auth_failure() {
            tracing::info!(error = %self, "Backend rejected session token");
            let mut response = (self.status(), self.user_message()).into_response();
            response.extensions_mut().insert(ForcedLogout);
            return response;
        }

        let status = self.status();
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        (status, self.user_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Associate subsequent Sentry events with an account.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a shopper action.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Order placed", Some(&[("order_id", "665f...")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            status_of(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(BackendError::RateLimited(5).into()),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_of(
                BackendError::Rejected {
                    status: 503,
                    message: "down".to_string()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(CheckoutError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_auth_failures_mark_forced_logout() {
        let response = AppError::from(BackendError::Unauthorized).into_response();
        assert!(response.extensions().get::<ForcedLogout>().is_some());

        let response =
            AppError::from(CheckoutError::Backend(BackendError::Forbidden("no".to_string())))
                .into_response();
        assert!(response.extensions().get::<ForcedLogout>().is_some());

        let response = AppError::from(BackendError::NotFound("x".to_string())).into_response();
        assert!(response.extensions().get::<ForcedLogout>().is_none());
    }

    #[test]
    fn test_user_message_hides_internals() {
        assert_eq!(
            AppError::Internal("db exploded".to_string()).user_message(),
            "Internal server error"
        );
        assert_eq!(
            AppError::from(CheckoutError::EmptyCart).user_message(),
            "your cart is empty"
        );
    }
}
