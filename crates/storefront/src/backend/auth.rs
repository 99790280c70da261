//! Account endpoints: login, registration and profile.

use serde_json::json;
use tracing::instrument;

use super::{AccessToken, AccountProfile, BackendClient, BackendError, LoginResult, Registration};
use super::normalize;

impl BackendClient {
    /// Sign in with email and password.
    ///
    /// When the login response carries a token but no user object, the
    /// profile is fetched from `/auth/me`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] for bad credentials and
    /// [`BackendError::MissingField`] when no token comes back.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, BackendError> {
        let payload = self
            .post("/auth/login", None, &json!({ "email": email, "password": password }))
            .await?;

        self.finish_login(&payload).await
    }

    /// Create an account.
    ///
    /// Returns a signed-in session when the backend issues a token on
    /// registration, `None` when the user must sign in separately.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] when the backend refuses the
    /// registration (duplicate email, weak password, ...).
    #[instrument(skip(self, registration), fields(email = %registration.email, role = registration.role))]
    pub async fn register(
        &self,
        registration: &Registration,
    ) -> Result<Option<LoginResult>, BackendError> {
        let payload = self
            .post("/auth/register", None, &serde_json::to_value(registration)?)
            .await?;

        if normalize::token(&payload).is_none() {
            return Ok(None);
        }
        self.finish_login(&payload).await.map(Some)
    }

    /// Fetch the profile behind a token.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unauthorized`] when the token is no longer valid.
    #[instrument(skip(self, token))]
    pub async fn me(&self, token: &AccessToken) -> Result<AccountProfile, BackendError> {
        let payload = self.get("/auth/me", Some(token), &[]).await?;
        normalize::account(&payload).ok_or(BackendError::MissingField("user"))
    }

    async fn finish_login(&self, payload: &serde_json::Value) -> Result<LoginResult, BackendError> {
        let token = normalize::token(payload)
            .map(AccessToken::new)
            .ok_or(BackendError::MissingField("token"))?;

        let profile = match normalize::account(payload) {
            Some(profile) => profile,
            None => self.me(&token).await?,
        };

        Ok(LoginResult { token, profile })
    }
}
