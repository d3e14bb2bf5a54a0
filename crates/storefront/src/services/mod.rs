//! Background services and remote collaborator clients.
//!
//! # Services
//!
//! - `price_feed` - SOL/USD quote polling with a fixed fallback
//! - `visits` - once-per-session visit counter ping
//! - `account` - sign-in/registration against the auth API, session persistence
//! - `documents` - multipart document submission for signed-in users

use std::time::Duration;

pub mod account;
pub mod documents;
pub mod price_feed;
pub mod visits;

/// Timeout applied to every outbound collaborator request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Build the HTTP client shared by collaborator clients.
///
/// # Errors
///
/// Returns error if the TLS backend fails to initialize.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("cartoon-cart/", env!("CARGO_PKG_VERSION")))
        .build()
}
