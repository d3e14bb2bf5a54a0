//! Shopper accounts.
//!
//! [`AuthClient`] talks to the remote auth API (`/login`, `/register`).
//! [`AccountSession`] persists the signed-in state: the raw token under
//! [`keys::TOKEN`] and the profile as JSON under [`keys::USER_DATA`].

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::storage::{Storage, StorageError, keys};

/// Message shown after a successful registration.
pub const REGISTERED_MESSAGE: &str = "Registered successfully! Please sign in.";

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";
const CREDENTIALS_REQUIRED: &str = "Login and password are required";

/// Errors that can occur during sign-in, registration or session access.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Input rejected before contacting the auth API.
    #[error("{0}")]
    Validation(String),

    /// Auth API answered with an error.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be built.
    #[error("invalid auth endpoint: {0}")]
    Url(#[from] url::ParseError),

    /// Response or stored profile could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Session state could not be stored.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// No token is stored.
    #[error("not signed in")]
    NotSignedIn,
}

/// Profile returned by the auth API and cached under `userData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub login: String,
}

impl UserProfile {
    /// `First Last`, or the login if no name is known.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.login.clone()
        } else {
            full.to_string()
        }
    }
}

/// A successful sign-in.
#[derive(Debug)]
pub struct SignedIn {
    pub token: SecretString,
    pub user: UserProfile,
}

/// Registration form.
#[derive(Debug)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub login: String,
    pub password: SecretString,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    user: UserProfile,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

fn require_credentials(login: &str, password: &SecretString) -> Result<(), AuthError> {
    if login.is_empty() || password.expose_secret().is_empty() {
        return Err(AuthError::Validation(CREDENTIALS_REQUIRED.to_string()));
    }
    Ok(())
}

/// Message from an error body's `error` field, or `default`.
fn rejection_message(body: &str, default: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Client for the remote auth API.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    base_url: Url,
}

impl AuthClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self {
            client,
            base_url: with_trailing_slash(base_url),
        }
    }

    /// Exchange credentials for a token and profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for empty credentials,
    /// `AuthError::Rejected` with the API's message if it refuses them, or a
    /// transport error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, login: &str, password: &SecretString) -> Result<SignedIn, AuthError> {
        require_credentials(login, password)?;

        let body = serde_json::json!({
            "login": login,
            "password": password.expose_secret(),
        });
        let response = self
            .client
            .post(self.base_url.join("login")?)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&text, LOGIN_FAILED),
            });
        }

        let parsed: LoginResponse = serde_json::from_str(&text)?;
        debug!("login accepted");
        Ok(SignedIn {
            token: SecretString::from(parsed.token),
            user: parsed.user,
        })
    }

    /// Create an account. Returns the confirmation message.
    ///
    /// # Errors
    ///
    /// Same as [`AuthClient::login`].
    #[instrument(skip(self, registration), fields(login = %registration.login))]
    pub async fn register(&self, registration: &Registration) -> Result<String, AuthError> {
        require_credentials(&registration.login, &registration.password)?;

        let body = serde_json::json!({
            "firstName": registration.first_name,
            "lastName": registration.last_name,
            "login": registration.login,
            "password": registration.password.expose_secret(),
        });
        let response = self
            .client
            .post(self.base_url.join("register")?)
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&text, REGISTRATION_FAILED),
            });
        }

        Ok(REGISTERED_MESSAGE.to_string())
    }
}

/// Ensure relative joins append to the base path instead of replacing it.
pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Signed-in state persisted in storage.
#[derive(Clone)]
pub struct AccountSession {
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for AccountSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountSession").finish_non_exhaustive()
    }
}

impl AccountSession {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// The stored token, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        match self.storage.get(keys::TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()).map(SecretString::from),
            Err(e) => {
                warn!(error = %e, "failed to read auth token");
                None
            }
        }
    }

    /// The stored token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` if no token is stored.
    pub fn require_token(&self) -> Result<SecretString, AuthError> {
        self.token().ok_or(AuthError::NotSignedIn)
    }

    /// The cached profile. Missing or malformed data yields `None`.
    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        let raw = match self.storage.get(keys::USER_DATA) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "failed to read user profile");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .inspect_err(|e| warn!(error = %e, "stored user profile is malformed"))
            .ok()
    }

    /// Persist a successful sign-in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the token or profile cannot be stored.
    pub fn sign_in(&self, signed_in: &SignedIn) -> Result<(), AuthError> {
        let profile = serde_json::to_string(&signed_in.user)?;
        self.storage
            .set(keys::TOKEN, signed_in.token.expose_secret())?;
        self.storage.set(keys::USER_DATA, &profile)?;
        Ok(())
    }

    /// Forget the token and profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if either key cannot be removed; the
    /// other is still attempted.
    pub fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.storage.remove(keys::TOKEN);
        let profile = self.storage.remove(keys::USER_DATA);
        token?;
        profile?;
        Ok(())
    }
}
