//! Once-per-session visit counting.

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::storage::{Storage, keys};

/// Value stored under [`keys::VISIT_TRACKED`] once the visit is counted.
const TRACKED: &str = "true";

/// Pings the visitor counter at most once per session.
#[derive(Clone)]
pub struct VisitTracker {
    session: Arc<dyn Storage>,
    client: reqwest::Client,
    endpoint: Option<Url>,
}

impl std::fmt::Debug for VisitTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitTracker")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl VisitTracker {
    /// `endpoint` of `None` disables the ping; the session flag is still set.
    #[must_use]
    pub fn new(session: Arc<dyn Storage>, client: reqwest::Client, endpoint: Option<Url>) -> Self {
        Self {
            session,
            client,
            endpoint,
        }
    }

    /// Whether this session's visit has already been counted.
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        match self.session.get(keys::VISIT_TRACKED) {
            Ok(value) => value.is_some(),
            Err(e) => {
                warn!(error = %e, "failed to read visit flag");
                false
            }
        }
    }

    /// Count this visit unless the session already has been.
    ///
    /// Sets the session flag first, then sends the ping in the background.
    /// Returns `true` if this call claimed the visit. If the flag cannot be
    /// stored nothing is sent, so a visit is never counted twice.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn track_once(&self) -> bool {
        if self.is_tracked() {
            debug!("visit already tracked this session");
            return false;
        }
        if let Err(e) = self.session.set(keys::VISIT_TRACKED, TRACKED) {
            warn!(error = %e, "failed to store visit flag, skipping visit ping");
            return false;
        }

        let Some(endpoint) = self.endpoint.clone() else {
            debug!("visit counter not configured");
            return true;
        };

        let client = self.client.clone();
        tokio::spawn(async move {
            match client.post(endpoint.clone()).send().await {
                Ok(response) if response.status().is_success() => {
                    info!(%endpoint, "visit counted");
                }
                Ok(response) => {
                    warn!(%endpoint, status = response.status().as_u16(), "visit counter rejected ping");
                }
                Err(e) => {
                    warn!(%endpoint, error = %e, "visit counter unreachable");
                }
            }
        });
        true
    }
}
