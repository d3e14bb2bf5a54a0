//! Authentication route handlers.
//!
//! Credentials are checked by the remote auth API. On success the token and
//! profile are persisted locally so later visits stay signed in.

use axum::{Json, extract::State, http::StatusCode};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::routes::JsonBody;
use crate::services::account::{Registration, UserProfile};
use crate::state::AppState;

/// Login form.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Registration form.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Signed-in user.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserProfile,
}

/// Confirmation text.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Sign in and persist the session.
#[instrument(skip(state))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let password = SecretString::from(request.password);
    let signed_in = state.auth().login(&request.login, &password).await?;
    state.account().sign_in(&signed_in)?;

    set_sentry_user(&signed_in.user.login);
    info!(login = %signed_in.user.login, "signed in");
    Ok(Json(LoginResponse {
        user: signed_in.user,
    }))
}

/// Create an account. The shopper signs in separately afterwards.
#[instrument(skip(state))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let registration = Registration {
        first_name: request.first_name,
        last_name: request.last_name,
        login: request.login,
        password: SecretString::from(request.password),
    };
    let message = state.auth().register(&registration).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}

/// Forget the stored token and profile.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Result<StatusCode> {
    if let Err(e) = state.account().sign_out() {
        warn!(error = %e, "sign-out did not fully clear session");
        return Err(e.into());
    }
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
