//! Single place where a rejected backend token ends the session.
//!
//! Handlers never sign the visitor out themselves. When an [`AppError`]
//! carrying a backend 401/403 becomes a response it is marked with
//! [`ForcedLogout`]; this middleware sees the mark, clears every
//! session-scoped store and sends the visitor to the login page.
//!
//! [`AppError`]: crate::error::AppError

use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::{ForcedLogout, clear_sentry_user};
use crate::models::flash::{self, Flash};
use crate::models::session::sign_out;

use super::auth::login_redirect;

/// Replace a [`ForcedLogout`] response with a logout and a login redirect.
///
/// `next` is the current page for GET requests. A form post cannot be
/// replayed, so those land on the login page with no `next`.
pub async fn forced_logout_middleware(request: Request, next: Next) -> Response {
    let session = request.extensions().get::<Session>().cloned();
    let return_to = (request.method() == Method::GET)
        .then(|| {
            request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_owned())
        })
        .flatten()
        .unwrap_or_else(|| "/".to_owned());
    let is_api = request.uri().path().starts_with("/api/");

    let response = next.run(request).await;
    if response.extensions().get::<ForcedLogout>().is_none() {
        return response;
    }

    if let Some(session) = session {
        if let Err(e) = sign_out(&session).await {
            tracing::error!(error = %e, "Failed to clear session after token rejection");
        }
        flash::push(
            &session,
            Flash::error("Your session has expired. Please sign in again."),
        )
        .await;
    }
    clear_sentry_user();
    tracing::info!(return_to = %return_to, "Forced logout");

    if is_api {
        StatusCode::UNAUTHORIZED.into_response()
    } else {
        Redirect::to(&login_redirect(&return_to)).into_response()
    }
}
