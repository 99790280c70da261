//! Marketplace REST backend client.
//!
//! # Architecture
//!
//! - The backend is the source of truth; the storefront keeps no copies
//!   beyond session snapshots and a short-lived catalog cache
//! - Every response passes through three stages: envelope unwrapping
//!   ([`envelope`]), shape extraction ([`extract`]) and normalization
//!   ([`normalize`]) into the types in [`types`]
//! - Catalog reads are cached in memory via `moka` (5 minute TTL); carts,
//!   orders and dashboards always hit the backend
//!
//! # Example
//!
//! ```rust,ignore
//! use bazaar_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//!
//! let login = client.login("asha@example.com", "hunter22").await?;
//! let cart = client.get_cart(&login.token).await?;
//! ```

mod admin;
mod auth;
mod cache;
mod cart;
mod catalog;
pub mod envelope;
pub mod extract;
pub mod normalize;
mod orders;
mod payments;
mod seller;
pub mod types;
mod wishlist;

pub use normalize::{ImageResolver, PLACEHOLDER_IMAGE};
pub use orders::OrderRequest;
pub use payments::{INTENT_PAYLOAD_SHAPES, IntentPayloadShape};
pub use types::*;

use std::borrow::Cow;
use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::BackendConfig;
use cache::{CacheKey, CacheValue};

/// Errors that can occur when talking to the marketplace backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The bearer token was missing, expired or revoked (401).
    #[error("Session expired, please sign in again")]
    Unauthorized,

    /// The account may not perform this action (403).
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The backend answered but refused the request, either with a non-2xx
    /// status or a failed envelope.
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// A response lacked a field we cannot proceed without.
    #[error("Response is missing {0}")]
    MissingField(&'static str),

    /// Every alternative payload shape was rejected.
    #[error("All {attempts} request shapes were rejected, last error: {last}")]
    ProbeExhausted { attempts: usize, last: String },
}

/// Percent-encode one path segment taken from user input.
///
/// Dot segments are refused since no encoding keeps the URL parser from
/// resolving them.
pub(crate) fn segment(id: &str) -> Result<Cow<'_, str>, BackendError> {
    if id.is_empty() || id.chars().all(|c| c == '.') {
        return Err(BackendError::NotFound(format!("Invalid id: {id:?}")));
    }
    Ok(urlencoding::encode(id))
}

impl BackendError {
    /// Whether the error invalidates the visitor's session (401/403).
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::Forbidden(_))
    }

    /// Whether a payload probe should move on to its next shape.
    ///
    /// Validation-style failures advance; auth failures, rate limiting and
    /// transport errors stop the probe.
    #[must_use]
    pub fn is_probe_advance(&self) -> bool {
        match self {
            Self::Rejected { status, .. } => {
                matches!(status, 400 | 404 | 422) || (200..300).contains(status)
            }
            Self::NotFound(_) | Self::MissingField(_) => true,
            _ => false,
        }
    }

    /// Message suitable for a flash notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(e) if e.is_timeout() => {
                "The marketplace took too long to respond. Please try again.".to_owned()
            }
            Self::Http(_) | Self::Parse(_) => {
                "We couldn't reach the marketplace. Please try again.".to_owned()
            }
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_owned(),
            Self::Forbidden(_) => "You don't have access to that.".to_owned(),
            Self::NotFound(_) => "That item could not be found.".to_owned(),
            Self::RateLimited(_) => "Too many requests. Please wait a moment.".to_owned(),
            Self::Rejected { message, .. } => message.clone(),
            Self::MissingField(_) | Self::ProbeExhausted { .. } => {
                "Something went wrong. Please try again.".to_owned()
            }
        }
    }
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the marketplace REST backend.
///
/// Cheap to clone; all clones share one connection pool and one cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    images: ImageResolver,
    razorpay_key_id: Option<String>,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("bazaar-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_owned(),
                images: ImageResolver::new(&config.asset_base_url),
                razorpay_key_id: config.razorpay_key_id.clone(),
                cache: cache::build(),
            }),
        })
    }

    /// Resolver for backend image references.
    #[must_use]
    pub fn images(&self) -> &ImageResolver {
        &self.inner.images
    }

    /// Configured Razorpay key id, used when the backend does not send one.
    #[must_use]
    pub fn razorpay_key_id(&self) -> Option<&str> {
        self.inner.razorpay_key_id.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    /// Check that the backend answers at all.
    ///
    /// Any HTTP response below 500 counts as reachable.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a 5xx response.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<u16, BackendError> {
        let response = self.inner.client.get(self.url("/")).send().await?;
        let status = response.status();
        if status.is_server_error() {
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("server error").to_owned(),
            });
        }
        Ok(status.as_u16())
    }

    /// Send a request and return the unwrapped payload.
    async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&AccessToken>,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, BackendError> {
        let mut request = self.inner.client.request(method.clone(), self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token.expose());
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, path, "Backend request");
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        // Read as text first so empty bodies and HTML error pages are handled
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(body) => body,
                Err(e) if status.is_success() => {
                    tracing::error!(
                        error = %e,
                        path,
                        body = %text.chars().take(500).collect::<String>(),
                        "Failed to parse backend response"
                    );
                    return Err(BackendError::Parse(e));
                }
                Err(_) => Value::String(text.chars().take(200).collect()),
            }
        };

        if !status.is_success() {
            let message = envelope::error_message(&body)
                .or_else(|| body.as_str().map(str::to_owned))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_owned());

            tracing::warn!(status = %status, path, message = %message, "Backend returned non-success status");

            return Err(match status {
                StatusCode::UNAUTHORIZED => BackendError::Unauthorized,
                StatusCode::FORBIDDEN => BackendError::Forbidden(message),
                StatusCode::NOT_FOUND => BackendError::NotFound(message),
                _ => BackendError::Rejected {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        envelope::unwrap(body, status.as_u16())
    }

    async fn get(
        &self,
        path: &str,
        token: Option<&AccessToken>,
        query: &[(&str, String)],
    ) -> Result<Value, BackendError> {
        self.request(Method::GET, path, token, query, None).await
    }

    async fn post(
        &self,
        path: &str,
        token: Option<&AccessToken>,
        body: &Value,
    ) -> Result<Value, BackendError> {
        self.request(Method::POST, path, token, &[], Some(body)).await
    }

    async fn put(
        &self,
        path: &str,
        token: Option<&AccessToken>,
        body: &Value,
    ) -> Result<Value, BackendError> {
        self.request(Method::PUT, path, token, &[], Some(body)).await
    }

    async fn delete(&self, path: &str, token: Option<&AccessToken>) -> Result<Value, BackendError> {
        self.request(Method::DELETE, path, token, &[], None).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_encodes_ids() {
        assert_eq!(segment("line-1").unwrap(), "line-1");
        assert_eq!(segment("../orders/x").unwrap(), "..%2Forders%2Fx");
        assert_eq!(segment("a b?c").unwrap(), "a%20b%3Fc");
        assert!(matches!(segment(".."), Err(BackendError::NotFound(_))));
        assert!(segment("").is_err());
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = BackendError::Rejected {
            status: 422,
            message: "amount is required".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "backend rejected request (422): amount is required"
        );
    }

    #[test]
    fn test_auth_failures() {
        assert!(BackendError::Unauthorized.is_auth_failure());
        assert!(BackendError::Forbidden("seller only".to_string()).is_auth_failure());
        assert!(!BackendError::NotFound(String::new()).is_auth_failure());
    }

    #[test]
    fn test_probe_advance_classification() {
        let rejected = |status| BackendError::Rejected {
            status,
            message: String::new(),
        };
        assert!(rejected(400).is_probe_advance());
        assert!(rejected(422).is_probe_advance());
        assert!(rejected(200).is_probe_advance());
        assert!(BackendError::NotFound(String::new()).is_probe_advance());

        assert!(!rejected(500).is_probe_advance());
        assert!(!BackendError::Unauthorized.is_probe_advance());
        assert!(!BackendError::RateLimited(3).is_probe_advance());
    }

    #[test]
    fn test_user_message_prefers_backend_text() {
        let err = BackendError::Rejected {
            status: 400,
            message: "Only 2 left in stock".to_string(),
        };
        assert_eq!(err.user_message(), "Only 2 left in stock");
        assert!(BackendError::Unauthorized.user_message().contains("sign in"));
    }
}
