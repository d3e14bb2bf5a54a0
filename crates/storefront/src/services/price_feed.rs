//! SOL/USD price polling.
//!
//! A [`PricePoller`] fetches the current SOL price from a [`PriceSource`]
//! immediately and then on a fixed interval, publishing each result to a
//! shared [`PriceTicker`]. Fetch failures publish the configured fallback
//! price instead; there is no retry backoff.
//!
//! The poller runs as a spawned task owned by a [`PollerHandle`]. Stopping
//! the handle cancels the task and waits for it to exit.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use cartoon_cart_core::Price;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Quotes above this price are shown as trending up.
const TREND_REFERENCE_USD: Decimal = Decimal::from_parts(145, 0, 0, false, 0);

/// Price published when the feed cannot be reached.
pub const DEFAULT_FALLBACK_USD: Decimal = Decimal::from_parts(14532, 0, 0, false, 2);

/// Default delay between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Errors that can occur while fetching a quote.
#[derive(Debug, Error)]
pub enum PriceFeedError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Feed returned a non-success status.
    #[error("price feed returned status {0}")]
    Status(u16),

    /// Response body was not the expected shape.
    #[error("failed to decode price feed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Response had no `solana.usd` value.
    #[error("price feed response has no SOL/USD price")]
    MissingPrice,

    /// Price was zero or negative.
    #[error("price feed returned a non-positive price: {0}")]
    InvalidPrice(Decimal),
}

/// Anything that can produce the current SOL price in USD.
pub trait PriceSource: Send + Sync + 'static {
    fn fetch_sol_usd(&self) -> impl Future<Output = Result<Decimal, PriceFeedError>> + Send;
}

// =============================================================================
// HTTP source
// =============================================================================

/// `{"solana":{"usd":145.32}}`
#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    solana: Option<UsdPrice>,
}

#[derive(Debug, Deserialize)]
struct UsdPrice {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    usd: Option<Decimal>,
}

/// Parse a simple-price response body into the SOL/USD price.
fn parse_sol_usd(body: &str) -> Result<Decimal, PriceFeedError> {
    let response: SimplePriceResponse = serde_json::from_str(body)?;
    let usd = response
        .solana
        .and_then(|s| s.usd)
        .ok_or(PriceFeedError::MissingPrice)?;
    if usd <= Decimal::ZERO {
        return Err(PriceFeedError::InvalidPrice(usd));
    }
    Ok(usd)
}

/// Price source backed by a CoinGecko-style simple price endpoint.
#[derive(Debug, Clone)]
pub struct PriceFeedClient {
    client: reqwest::Client,
    url: Url,
}

impl PriceFeedClient {
    #[must_use]
    pub const fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }
}

impl PriceSource for PriceFeedClient {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_sol_usd(&self) -> Result<Decimal, PriceFeedError> {
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PriceFeedError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        parse_sol_usd(&body)
    }
}

// =============================================================================
// Published quote
// =============================================================================

/// Direction shown next to the quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// Trend for a price relative to the fixed reference.
    #[must_use]
    pub fn of(sol_usd: Decimal) -> Self {
        if sol_usd > TREND_REFERENCE_USD {
            Self::Up
        } else {
            Self::Down
        }
    }
}

/// Where a quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    Live,
    Fallback,
}

/// A published SOL/USD quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(with = "rust_decimal::serde::float")]
    pub sol_usd: Decimal,
    pub trend: Trend,
    pub source: QuoteSource,
    pub fetched_at: DateTime<Utc>,
}

impl Quote {
    #[must_use]
    pub fn new(sol_usd: Decimal, source: QuoteSource) -> Self {
        Self {
            sol_usd,
            trend: Trend::of(sol_usd),
            source,
            fetched_at: Utc::now(),
        }
    }
}

/// Shared, latest-wins view of the current quote.
///
/// Cheap to clone; all clones observe the same quote.
#[derive(Debug, Clone, Default)]
pub struct PriceTicker {
    current: Arc<RwLock<Option<Quote>>>,
}

impl PriceTicker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest quote, or `None` before the first poll completes.
    #[must_use]
    pub fn current(&self) -> Option<Quote> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the current quote.
    pub fn publish(&self, quote: Quote) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(quote);
    }

    /// Convert a USD amount into SOL at the current quote.
    #[must_use]
    pub fn sol_price_of(&self, usd: Decimal) -> Option<Price> {
        let quote = self.current()?;
        Price::usd(usd).to_sol(quote.sol_usd)
    }

    /// Header label, e.g. `1 SOL = $145.32`, or `1 SOL = ...` while loading.
    #[must_use]
    pub fn label(&self) -> String {
        self.current().map_or_else(
            || "1 SOL = ...".to_string(),
            |quote| format!("1 SOL = {}", Price::usd(quote.sol_usd)),
        )
    }
}

// =============================================================================
// Poller
// =============================================================================

/// Periodically refreshes a [`PriceTicker`] from a [`PriceSource`].
#[derive(Debug)]
pub struct PricePoller<S> {
    source: S,
    ticker: PriceTicker,
    interval: Duration,
    fallback: Decimal,
}

impl<S: PriceSource> PricePoller<S> {
    #[must_use]
    pub const fn new(source: S, ticker: PriceTicker, interval: Duration, fallback: Decimal) -> Self {
        Self {
            source,
            ticker,
            interval,
            fallback,
        }
    }

    /// Fetch once and publish the result, falling back on failure.
    pub async fn poll_once(&self) -> Quote {
        let quote = match self.source.fetch_sol_usd().await {
            Ok(sol_usd) => {
                debug!(%sol_usd, "fetched SOL price");
                Quote::new(sol_usd, QuoteSource::Live)
            }
            Err(e) => {
                warn!(error = %e, fallback = %self.fallback, "SOL price fetch failed, using fallback");
                Quote::new(self.fallback, QuoteSource::Fallback)
            }
        };
        self.ticker.publish(quote.clone());
        quote
    }

    /// Spawn the polling loop. The first poll happens immediately.
    #[must_use = "dropping the handle aborts the poller"]
    pub fn start(self) -> PollerHandle {
        let (shutdown, mut stop) = oneshot::channel::<()>();
        let interval = self.interval;

        let task = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs_f64(), "price poller started");
            let mut ticks = tokio::time::interval(interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop => break,
                    _ = async {
                        ticks.tick().await;
                        self.poll_once().await
                    } => {}
                }
            }
            info!("price poller stopped");
        });

        PollerHandle {
            shutdown: Some(shutdown),
            task: Some(task),
        }
    }
}

/// Owner of a running poller. Dropping it aborts the task.
#[derive(Debug)]
pub struct PollerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Signal the poller to stop and wait for it to exit.
    ///
    /// An in-flight fetch is cancelled.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // The task may already be gone; nothing to signal then.
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
            && !e.is_cancelled()
        {
            error!(error = %e, "price poller task panicked");
        }
    }

    /// Whether the polling task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Replays scripted results, then repeats the last one.
    struct ScriptedSource {
        script: Mutex<VecDeque<Option<Decimal>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(script: impl IntoIterator<Item = Option<Decimal>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let source = Self {
                script: Mutex::new(script.into_iter().collect()),
                calls: Arc::clone(&calls),
            };
            (source, calls)
        }
    }

    impl PriceSource for ScriptedSource {
        async fn fetch_sol_usd(&self) -> Result<Decimal, PriceFeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = {
                let mut script = self.script.lock().unwrap();
                if script.len() > 1 {
                    script.pop_front().flatten()
                } else {
                    script.front().copied().flatten()
                }
            };
            next.ok_or(PriceFeedError::MissingPrice)
        }
    }

    fn poller(script: impl IntoIterator<Item = Option<Decimal>>) -> (PricePoller<ScriptedSource>, Arc<AtomicUsize>) {
        let (source, calls) = ScriptedSource::new(script);
        let poller = PricePoller::new(
            source,
            PriceTicker::new(),
            Duration::from_millis(10),
            DEFAULT_FALLBACK_USD,
        );
        (poller, calls)
    }

    #[test]
    fn test_parse_sol_usd() {
        assert_eq!(
            parse_sol_usd(r#"{"solana":{"usd":152.7}}"#).unwrap(),
            Decimal::new(1527, 1)
        );
        assert!(matches!(
            parse_sol_usd(r#"{"bitcoin":{"usd":1}}"#),
            Err(PriceFeedError::MissingPrice)
        ));
        assert!(matches!(
            parse_sol_usd(r#"{"solana":{}}"#),
            Err(PriceFeedError::MissingPrice)
        ));
        assert!(matches!(
            parse_sol_usd(r#"{"solana":{"usd":0}}"#),
            Err(PriceFeedError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_sol_usd("<html>"),
            Err(PriceFeedError::Decode(_))
        ));
    }

    #[test]
    fn test_trend_reference() {
        assert_eq!(Trend::of(Decimal::new(14501, 2)), Trend::Up);
        assert_eq!(Trend::of(Decimal::from(145)), Trend::Down);
        assert_eq!(Trend::of(Decimal::from(90)), Trend::Down);
    }

    #[test]
    fn test_ticker_label_and_conversion() {
        let ticker = PriceTicker::new();
        assert_eq!(ticker.label(), "1 SOL = ...");
        assert!(ticker.sol_price_of(Decimal::new(250, 2)).is_none());

        ticker.publish(Quote::new(Decimal::new(14532, 2), QuoteSource::Live));
        assert_eq!(ticker.label(), "1 SOL = $145.32");
        assert_eq!(
            ticker.sol_price_of(Decimal::new(250, 2)).unwrap().to_string(),
            "0.0172 SOL"
        );
    }

    #[tokio::test]
    async fn test_poll_once_publishes_live_quote() {
        let (poller, _) = poller([Some(Decimal::from(150))]);
        let quote = poller.poll_once().await;
        assert_eq!(quote.source, QuoteSource::Live);
        assert_eq!(quote.trend, Trend::Up);
        assert_eq!(poller.ticker.current().unwrap().sol_usd, Decimal::from(150));
    }

    #[tokio::test]
    async fn test_poll_once_falls_back_on_failure() {
        let (poller, _) = poller([None]);
        let quote = poller.poll_once().await;
        assert_eq!(quote.source, QuoteSource::Fallback);
        assert_eq!(quote.sol_usd, DEFAULT_FALLBACK_USD);
        assert_eq!(quote.trend, Trend::Up);
    }

    #[tokio::test]
    async fn test_poller_recovers_after_failure() {
        let (poller, calls) = poller([None, Some(Decimal::from(120))]);
        let ticker = poller.ticker.clone();
        let handle = poller.start();

        tokio::time::sleep(Duration::from_millis(80)).await;
        handle.stop().await;

        assert!(calls.load(Ordering::SeqCst) >= 2);
        let quote = ticker.current().unwrap();
        assert_eq!(quote.source, QuoteSource::Live);
        assert_eq!(quote.sol_usd, Decimal::from(120));
    }

    #[tokio::test]
    async fn test_stop_halts_polling() {
        let (poller, calls) = poller([Some(Decimal::from(140))]);
        let handle = poller.start();
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.stop().await;

        let after_stop = calls.load(Ordering::SeqCst);
        assert!(after_stop >= 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn test_drop_aborts_poller() {
        let (poller, calls) = poller([Some(Decimal::from(140))]);
        drop(poller.start());
        tokio::time::sleep(Duration::from_millis(30)).await;
        let seen = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), seen);
    }
}
