//! Bazaar storefront library.
//!
//! Server-rendered marketplace front end for consumers, sellers and admins.
//! The marketplace backend owns all data; this crate talks to it over REST,
//! keeps per-visitor state in a server-side session and renders HTML.
//!
//! The router is built by [`app`] so that integration tests can drive it with
//! an in-memory session store and a mock backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use std::path::Path;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, header},
};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::{
    csp_nonce_middleware, forced_logout_middleware, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Static assets are content-hashed, so they can be cached for a year.
const STATIC_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Build the storefront router with its middleware stack.
///
/// Sentry layers and path normalization are added by the binary around the
/// returned router.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>, static_dir: &Path) -> Router
where
    S: SessionStore + Clone,
{
    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(STATIC_CACHE_CONTROL),
        ))
        .service(ServeDir::new(static_dir));

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", static_files)
        .layer(axum::middleware::from_fn(forced_logout_middleware))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(csp_nonce_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
