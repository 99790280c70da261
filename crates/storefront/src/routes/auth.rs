//! Authentication route handlers.
//!
//! Login and registration talk to the marketplace backend; the returned
//! token and profile are stored in the session under `user-storage`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::{Email, Role};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{BackendError, LoginResult, Registration};
use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::safe_next;
use crate::models::UserSession;
use crate::models::flash::{self, Flash};
use crate::models::session::{sign_in, sign_out};
use crate::routes::PageContext;
use crate::state::AppState;

/// Shortest password the form accepts.
const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    /// `consumer` or `seller`.
    #[serde(default)]
    pub role: String,
    pub shop_name: Option<String>,
}

impl RegisterForm {
    /// Check the form and build the backend request.
    fn validate(&self) -> std::result::Result<Registration, &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Please enter your name.");
        }
        let email = Email::parse(&self.email).map_err(|_| "Please enter a valid email address.")?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err("Password must be at least 6 characters.");
        }
        if self.password != self.password_confirm {
            return Err("Passwords do not match.");
        }

        // Admin accounts are never self-registered
        let role = match Role::parse_lenient(&self.role) {
            Role::Seller => Role::Seller,
            Role::Consumer | Role::Admin => Role::Consumer,
        };
        let shop_name = self
            .shop_name
            .as_deref()
            .map(str::trim)
            .filter(|shop| !shop.is_empty())
            .map(str::to_owned);
        if role == Role::Seller && shop_name.is_none() {
            return Err("Please enter a shop name.");
        }

        Ok(Registration {
            name: name.to_owned(),
            email: email.into_inner(),
            password: self.password.clone(),
            role: role.as_str(),
            shop_name: if role == Role::Seller { shop_name } else { None },
        })
    }

    fn is_seller(&self) -> bool {
        self.role.eq_ignore_ascii_case("seller")
    }
}

/// `?next=` on the login page.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub next: String,
    pub email: String,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub name: String,
    pub email: String,
    pub shop_name: String,
    pub is_seller: bool,
    pub error: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Store a fresh login and pick the landing page.
async fn start_session(session: &Session, login: LoginResult, next: Option<&str>) -> Result<Redirect> {
    let user = UserSession::from(login);
    sign_in(session, &user).await?;
    set_sentry_user(&user.user.id, Some(&user.user.email));
    add_breadcrumb("auth", "Signed in", Some(&[("role", user.role.as_str())]));
    tracing::info!(user_id = %user.user.id, role = %user.role, "Signed in");

    let to = safe_next(next).unwrap_or_else(|| user.role.home_path());
    Ok(Redirect::to(to))
}

fn login_failure_message(error: &BackendError) -> String {
    match error {
        BackendError::Unauthorized | BackendError::Forbidden(_) => {
            "Invalid email or password.".to_owned()
        }
        BackendError::Rejected { status, message } if *status < 500 => {
            if message.is_empty() {
                "Invalid email or password.".to_owned()
            } else {
                message.clone()
            }
        }
        other => other.user_message(),
    }
}

// =============================================================================
// Login
// =============================================================================

/// Display the login page. Signed-in visitors go to their landing page.
pub async fn login_page(ctx: PageContext, Query(query): Query<NextQuery>) -> Response {
    if let Some(user) = &ctx.user {
        let home = user.role.home_path();
        return ctx.redirect(home).await.into_response();
    }

    LoginTemplate {
        ctx,
        next: safe_next(query.next.as_deref()).unwrap_or_default().to_owned(),
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, ctx, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref()).unwrap_or_default().to_owned();
    let email = form.email.trim().to_owned();

    let failure = |ctx: PageContext, error: String| {
        (
            StatusCode::UNAUTHORIZED,
            LoginTemplate {
                ctx,
                next: next.clone(),
                email: email.clone(),
                error: Some(error),
            },
        )
            .into_response()
    };

    if email.is_empty() || form.password.is_empty() {
        return Ok(failure(ctx, "Please enter your email and password.".to_owned()));
    }

    match state.backend().login(&email, &form.password).await {
        Ok(login) => {
            ctx.keep_flashes().await;
            Ok(start_session(&session, login, Some(&next)).await?.into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            Ok(failure(ctx, login_failure_message(&e)))
        }
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
pub async fn register_page(ctx: PageContext) -> Response {
    if let Some(user) = &ctx.user {
        let home = user.role.home_path();
        return ctx.redirect(home).await.into_response();
    }

    RegisterTemplate {
        ctx,
        name: String::new(),
        email: String::new(),
        shop_name: String::new(),
        is_seller: false,
        error: None,
    }
    .into_response()
}

/// Handle registration form submission.
///
/// Signs the new account in when the backend issues a token, otherwise
/// sends the visitor to the login page.
#[instrument(skip(state, session, ctx, form), fields(email = %form.email, role = %form.role))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let rerender = |ctx: PageContext, error: String| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            RegisterTemplate {
                ctx,
                name: form.name.trim().to_owned(),
                email: form.email.trim().to_owned(),
                shop_name: form.shop_name.clone().unwrap_or_default(),
                is_seller: form.is_seller(),
                error: Some(error),
            },
        )
            .into_response()
    };

    let registration = match form.validate() {
        Ok(registration) => registration,
        Err(message) => return Ok(rerender(ctx, message.to_owned())),
    };

    match state.backend().register(&registration).await {
        Ok(Some(login)) => {
            ctx.keep_flashes().await;
            flash::push(&session, Flash::success("Welcome! Your account is ready.")).await;
            Ok(start_session(&session, login, None).await?.into_response())
        }
        Ok(None) => {
            ctx.keep_flashes().await;
            flash::push(
                &session,
                Flash::success("Account created. Please sign in."),
            )
            .await;
            Ok(Redirect::to("/auth/login").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            Ok(rerender(ctx, login_failure_message(&e)))
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out and return to the home page.
pub async fn logout(session: Session) -> Result<Redirect> {
    sign_out(&session).await?;
    clear_sentry_user();
    flash::push(&session, Flash::info("You have been signed out.")).await;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(role: &str) -> RegisterForm {
        RegisterForm {
            name: " Asha ".to_owned(),
            email: "asha@example.com".to_owned(),
            password: "secret1".to_owned(),
            password_confirm: "secret1".to_owned(),
            role: role.to_owned(),
            shop_name: Some("Asha Crafts".to_owned()),
        }
    }

    #[test]
    fn test_register_consumer_drops_shop_name() {
        let registration = form("consumer").validate().unwrap();
        assert_eq!(registration.name, "Asha");
        assert_eq!(registration.role, "user");
        assert!(registration.shop_name.is_none());
    }

    #[test]
    fn test_register_seller_requires_shop_name() {
        let mut seller = form("seller");
        assert_eq!(seller.validate().unwrap().role, "seller");
        seller.shop_name = Some("  ".to_owned());
        assert!(seller.validate().is_err());
    }

    #[test]
    fn test_register_never_grants_admin() {
        assert_eq!(form("admin").validate().unwrap().role, "user");
    }

    #[test]
    fn test_register_rejects_mismatched_passwords() {
        let mut mismatch = form("consumer");
        mismatch.password_confirm = "other12".to_owned();
        assert_eq!(mismatch.validate().unwrap_err(), "Passwords do not match.");
    }

    #[test]
    fn test_login_failure_message_hides_auth_detail() {
        assert_eq!(
            login_failure_message(&BackendError::Unauthorized),
            "Invalid email or password."
        );
        let rejected = BackendError::Rejected {
            status: 400,
            message: "Account is blocked".to_owned(),
        };
        assert_eq!(login_failure_message(&rejected), "Account is blocked");
    }
}
