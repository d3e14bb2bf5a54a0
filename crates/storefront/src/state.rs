//! Application state shared across handlers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cart::CartStore;
use crate::catalog::{Catalog, CatalogError};
use crate::config::StorefrontConfig;
use crate::services::account::{AccountSession, AuthClient};
use crate::services::documents::DocumentClient;
use crate::services::price_feed::PriceTicker;
use crate::services::visits::VisitTracker;
use crate::storage::Storage;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to load catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, the shopper's cart, account session and collaborator clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    cart: Mutex<CartStore>,
    account: AccountSession,
    auth: AuthClient,
    documents: DocumentClient,
    ticker: PriceTicker,
    visits: VisitTracker,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `local` - Persistent storage (cart, token, profile)
    /// * `session` - Process-lifetime storage (visit flag)
    /// * `ticker` - Quote shared with the price poller
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog is invalid or the HTTP client cannot be
    /// built.
    pub fn new(
        config: StorefrontConfig,
        local: Arc<dyn Storage>,
        session: Arc<dyn Storage>,
        ticker: PriceTicker,
    ) -> Result<Self, StateError> {
        let catalog = Catalog::builtin()?;
        let client = crate::services::http_client()?;

        let cart = CartStore::open(Arc::clone(&local));
        let account = AccountSession::new(local);
        let auth = AuthClient::new(client.clone(), config.collaborators.auth_api_url.clone());
        let documents =
            DocumentClient::new(client.clone(), config.collaborators.documents_url.clone());
        let visits = VisitTracker::new(
            session,
            client,
            config.collaborators.visit_counter_url.clone(),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                cart: Mutex::new(cart),
                account,
                auth,
                documents,
                ticker,
                visits,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Lock the shopper's cart.
    ///
    /// Do not hold the guard across an `.await`.
    pub fn cart(&self) -> MutexGuard<'_, CartStore> {
        self.inner.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a reference to the persisted account session.
    #[must_use]
    pub fn account(&self) -> &AccountSession {
        &self.inner.account
    }

    /// Get a reference to the auth API client.
    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }

    /// Get a reference to the documents API client.
    #[must_use]
    pub fn documents(&self) -> &DocumentClient {
        &self.inner.documents
    }

    /// Get a reference to the SOL price ticker.
    #[must_use]
    pub fn ticker(&self) -> &PriceTicker {
        &self.inner.ticker
    }

    /// Get a reference to the visit tracker.
    #[must_use]
    pub fn visits(&self) -> &VisitTracker {
        &self.inner.visits
    }
}
