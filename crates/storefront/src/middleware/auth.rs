//! Authentication and role extractors.
//!
//! The signed-in account lives in the session under `user-storage`. Pages
//! that need an account redirect to the login page with a `next` parameter;
//! `/api/` routes answer 401 instead. Role-gated pages send an account with
//! the wrong role back to its own home page.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, Uri, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::Role;
use tower_sessions::Session;

use crate::models::flash::{self, Flash};
use crate::models::session::{UserSession, current_user};

/// Login page path.
pub const LOGIN_PATH: &str = "/auth/login";

/// Login URL that returns to `next` afterwards.
#[must_use]
pub fn login_redirect(next: &str) -> String {
    match safe_next(Some(next)) {
        Some(next) if next != "/" => format!("{LOGIN_PATH}?next={}", urlencoding::encode(next)),
        _ => LOGIN_PATH.to_owned(),
    }
}

/// Accept only local absolute paths as a post-login destination.
///
/// Rejects scheme-relative (`//evil.example`) and backslash tricks so the
/// login form cannot be used as an open redirect.
#[must_use]
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.map(str::trim).filter(|next| {
        next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
    })
}

fn path_and_query(uri: &Uri) -> &str {
    uri.path_and_query().map_or("/", |pq| pq.as_str())
}

/// Why a guarded request was refused.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not signed in, page request.
    RedirectToLogin { next: String },
    /// Not signed in, API request.
    Unauthorized,
    /// Signed in with a role that may not see the page.
    WrongRole(Role),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => Redirect::to(&login_redirect(&next)).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::WrongRole(role) => Redirect::to(role.home_path()).into_response(),
        }
    }
}

async fn signed_in(parts: &Parts) -> Result<(Session, UserSession), AuthRejection> {
    let is_api = parts.uri.path().starts_with("/api/");
    let rejection = || {
        if is_api {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToLogin {
                next: path_and_query(&parts.uri).to_owned(),
            }
        }
    };

    let session = parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or(AuthRejection::Unauthorized)?;
    let user = current_user(&session).await.ok_or_else(rejection)?;
    Ok((session, user))
}

async fn with_role(parts: &Parts, role: Role) -> Result<UserSession, AuthRejection> {
    let (session, user) = signed_in(parts).await?;
    if user.role == role {
        return Ok(user);
    }

    tracing::info!(
        user_id = %user.user.id,
        have = %user.role,
        need = %role,
        path = parts.uri.path(),
        "Role check failed"
    );
    flash::push(&session, Flash::error(format!("That page is only for {role} accounts."))).await;
    Err(AuthRejection::WrongRole(user.role))
}

/// Requires a signed-in account of any role.
///
/// # Example
///
/// ```rust,ignore
/// async fn account(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.user.name)
/// }
/// ```
pub struct RequireAuth(pub UserSession);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        signed_in(parts).await.map(|(_, user)| Self(user))
    }
}

/// Requires a seller account.
pub struct RequireSeller(pub UserSession);

impl<S> FromRequestParts<S> for RequireSeller
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        with_role(parts, Role::Seller).await.map(Self)
    }
}

/// Requires an admin account.
pub struct RequireAdmin(pub UserSession);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        with_role(parts, Role::Admin).await.map(Self)
    }
}

/// The signed-in account, if there is one.
pub struct OptionalAuth(pub Option<UserSession>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => current_user(session).await,
            None => None,
        };
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_encodes_next() {
        assert_eq!(
            login_redirect("/checkout/review?x=1"),
            "/auth/login?next=%2Fcheckout%2Freview%3Fx%3D1"
        );
        assert_eq!(login_redirect("/"), "/auth/login");
    }

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(Some("/account")), Some("/account"));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil.example")), None);
        assert_eq!(safe_next(None), None);
        assert_eq!(login_redirect("https://evil.example"), "/auth/login");
    }

    #[test]
    fn test_wrong_role_redirects_home() {
        let response = AuthRejection::WrongRole(Role::Seller).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/seller");
    }
}
