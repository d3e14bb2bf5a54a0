//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_DATA_DIR` - Directory for persisted cart and session data
//!   (default: `.cartoon-cart`)
//! - `PRICE_FEED_URL` - SOL/USD simple price endpoint (default: `CoinGecko`)
//! - `PRICE_POLL_INTERVAL_SECS` - Seconds between price polls (default: 60)
//! - `PRICE_FALLBACK_USD` - Price shown when the feed fails (default: 145.32)
//! - `AUTH_API_URL` - Base URL of the auth API (`/login`, `/register`)
//! - `DOCUMENTS_API_URL` - Document submission endpoint
//! - `VISIT_COUNTER_URL` - Visitor counter endpoint; unset disables the ping
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

use crate::services::price_feed::{DEFAULT_FALLBACK_USD, DEFAULT_POLL_INTERVAL};

const DEFAULT_PRICE_FEED_URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=solana&vs_currencies=usd";
const DEFAULT_AUTH_API_URL: &str = "https://sol-server-theta.vercel.app";
const DEFAULT_DOCUMENTS_API_URL: &str =
    "https://doctoral-studies-server.vercel.app/submit-documents";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory holding persisted shopper state
    pub data_dir: PathBuf,
    /// SOL price feed settings
    pub price_feed: PriceFeedConfig,
    /// Remote collaborator endpoints
    pub collaborators: CollaboratorConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

/// SOL price feed configuration.
#[derive(Debug, Clone)]
pub struct PriceFeedConfig {
    pub url: Url,
    pub poll_interval: Duration,
    pub fallback_usd: Decimal,
}

/// Endpoints of the services the storefront calls out to.
#[derive(Debug, Clone)]
pub struct CollaboratorConfig {
    pub auth_api_url: Url,
    pub documents_url: Url,
    pub visit_counter_url: Option<Url>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env.parsed_or("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parsed_or("STOREFRONT_PORT", "3000")?;
        let data_dir = PathBuf::from(env.or_default("STOREFRONT_DATA_DIR", ".cartoon-cart"));

        let poll_secs: u64 = env.parsed_or(
            "PRICE_POLL_INTERVAL_SECS",
            &DEFAULT_POLL_INTERVAL.as_secs().to_string(),
        )?;
        if poll_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "PRICE_POLL_INTERVAL_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let fallback_usd: Decimal =
            env.parsed_or("PRICE_FALLBACK_USD", &DEFAULT_FALLBACK_USD.to_string())?;
        if fallback_usd <= Decimal::ZERO {
            return Err(ConfigError::InvalidEnvVar(
                "PRICE_FALLBACK_USD".to_string(),
                "must be positive".to_string(),
            ));
        }

        let price_feed = PriceFeedConfig {
            url: env.url_or("PRICE_FEED_URL", DEFAULT_PRICE_FEED_URL)?,
            poll_interval: Duration::from_secs(poll_secs),
            fallback_usd,
        };

        let collaborators = CollaboratorConfig {
            auth_api_url: env.url_or("AUTH_API_URL", DEFAULT_AUTH_API_URL)?,
            documents_url: env.url_or("DOCUMENTS_API_URL", DEFAULT_DOCUMENTS_API_URL)?,
            visit_counter_url: env
                .optional("VISIT_COUNTER_URL")
                .map(|v| parse_url("VISIT_COUNTER_URL", &v))
                .transpose()?,
        };

        Ok(Self {
            host,
            port,
            data_dir,
            price_feed,
            collaborators,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with the storefront's defaulting rules.
struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get an optional variable. Blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    fn url_or(&self, key: &str, default: &str) -> Result<Url, ConfigError> {
        parse_url(key, &self.or_default(key, default))
    }
}

/// Parse an `http`/`https` URL.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    Ok(url)
}
